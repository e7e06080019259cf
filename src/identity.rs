//! Identity resolution for fieldops commands.
//!
//! Every command acts as some account. Rather than requiring `--as` on every
//! invocation, the acting account is resolved through a chain:
//!
//! 1. `--as <account>`: explicit per-command override
//! 2. `FIELDOPS_ACTOR` env var: process/session level
//! 3. `default-actor` in `~/.fieldops/config.toml`
//!
//! Authentication happens upstream; this only names the account.

use std::env;

use crate::config::Config;

/// Error message shown when identity cannot be resolved.
pub const IDENTITY_REQUIRED: &str = "identity required: pass --as <account>, \
    set FIELDOPS_ACTOR, or add `default-actor = \"...\"` to ~/.fieldops/config.toml";

/// Resolve the acting account id from the tiered resolution chain.
pub fn resolve_identity(explicit: Option<&str>, config: &Config) -> Result<String, String> {
    // 1. Explicit --as flag.
    if let Some(id) = explicit {
        return Ok(id.to_string());
    }

    // 2. FIELDOPS_ACTOR environment variable.
    if let Ok(id) = env::var("FIELDOPS_ACTOR")
        && !id.is_empty()
    {
        return Ok(id);
    }

    // 3. Config default.
    if let Some(id) = config.default_actor.as_deref().filter(|s| !s.is_empty()) {
        return Ok(id.to_string());
    }

    Err(IDENTITY_REQUIRED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_wins() {
        // Returned before the environment or config are consulted.
        let config = Config {
            default_actor: Some("rep".into()),
            ..Config::default()
        };
        assert_eq!(resolve_identity(Some("ana"), &config).unwrap(), "ana");
    }
}
