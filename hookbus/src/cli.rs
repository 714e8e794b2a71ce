//! CLI option serialization (§6).
//!
//! The inverse direction only: turning a `HookOptions` into the argv an
//! external spawner launches a child process with. No `clap`-based parser
//! is added since nothing in this crate reads `argv` (§1 Non-goals).

use crate::options::HookOptions;

/// Serializes `options` as `--hook-port N --hook-host H --hook-name N
/// --hook-type T` for the four reserved keys (in that order), followed by
/// `--<key> <value>` for every other recognized option that differs from
/// its default. Object-shaped values are compact JSON text.
#[must_use]
pub fn serialize_cli_args(options: &HookOptions) -> Vec<String> {
    let mut args = vec![
        "--hook-port".to_string(),
        options.port.to_string(),
        "--hook-host".to_string(),
        options.host.clone(),
        "--hook-name".to_string(),
        options.name.clone(),
        "--hook-type".to_string(),
        options.r#type.clone(),
    ];

    if options.debug {
        args.push("--debug".to_string());
        args.push("true".to_string());
    }

    if options.quiet {
        args.push("--quiet".to_string());
        args.push("true".to_string());
    }

    if options.no_config {
        args.push("--noConfig".to_string());
        args.push("true".to_string());
    }

    if let Some(socket) = &options.socket {
        args.push("--hook-socket".to_string());
        args.push(socket.display().to_string());
    }

    if !options.transports.is_empty() {
        let encoded: Vec<serde_json::Value> = options
            .transports
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": t.type_key,
                    "options": t.options,
                })
            })
            .collect();
        args.push("--transports".to_string());
        args.push(serde_json::Value::Array(encoded).to_string());
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{HookOptionsBuilder, TransportSpec};

    #[test]
    fn reserved_keys_come_first_in_fixed_order() {
        let options = HookOptionsBuilder::new()
            .name("worker")
            .hook_type("custom")
            .port(6000)
            .host("0.0.0.0")
            .build();
        let args = serialize_cli_args(&options);
        assert_eq!(
            &args[..8],
            &[
                "--hook-port",
                "6000",
                "--hook-host",
                "0.0.0.0",
                "--hook-name",
                "worker",
                "--hook-type",
                "custom",
            ]
        );
    }

    #[test]
    fn object_valued_transport_is_compact_json() {
        let options = HookOptionsBuilder::new()
            .transport(TransportSpec {
                type_key: "store".to_string(),
                options: serde_json::json!({"path": "/tmp/x"}),
            })
            .build();
        let args = serialize_cli_args(&options);
        let transports_idx = args.iter().position(|a| a == "--transports").unwrap();
        assert!(args[transports_idx + 1].contains("\"type\":\"store\""));
    }
}
