//! Host resolution helper (spec §2.7, used during §4.5.2 step 1).
//!
//! Accepts an IPv4/IPv6 literal or a DNS name and returns every address it
//! resolves to. Grounded on the same primitive the teacher crate already
//! relies on for its own TCP connect/bind paths (`std::net::ToSocketAddrs`,
//! see `monocoque-zmtp/src/pair.rs` and `monocoque/src/zmq/router.rs`)
//! rather than pulling in an async DNS resolver crate for a call made once
//! at start time.

use crate::error::{HookError, Result};
use std::net::{SocketAddr, ToSocketAddrs};

/// Resolves `host:port` to a list of socket addresses. Fails the start with
/// a resolve error if resolution returns nothing (§4.5.2 step 1).
pub fn resolve_host(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| HookError::resolve(format!("{host}:{port}: {e}")))?
        .collect();

    if addrs.is_empty() {
        return Err(HookError::resolve(format!(
            "{host}:{port} resolved to no addresses"
        )));
    }

    Ok(addrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_ipv4_literal() {
        let addrs = resolve_host("127.0.0.1", 5000).unwrap();
        assert!(addrs.iter().all(|a| a.is_ipv4()));
        assert_eq!(addrs[0].port(), 5000);
    }

    #[test]
    fn resolves_ipv6_literal() {
        let addrs = resolve_host("::1", 5000).unwrap();
        assert!(addrs.iter().all(std::net::SocketAddr::is_ipv6));
    }
}
