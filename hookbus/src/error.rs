//! Re-exports the shared error taxonomy (§7). `hookbus` doesn't add error
//! variants of its own; every failure mode named in the spec is already
//! covered by `hookbus_core::error::HookError`.

pub use hookbus_core::error::{HookError, Result};
