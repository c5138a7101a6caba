//! Environment variable loading helpers.
//!
//! Fallback chains live here so business code never chains `or_else` over
//! `std::env::var` by hand.

use std::env;
use std::path::Path;

/// Load `.env` from the current directory without overriding variables that
/// are already set. Runs at most once per process.
pub fn load_dotenv() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let path = env::current_dir()
            .map(|d| d.join(".env"))
            .unwrap_or_else(|_| std::path::PathBuf::from(".env"));
        load_dotenv_from(&path);
    });
}

/// Load a specific dotenv file (no-op when it does not exist).
pub fn load_dotenv_from(path: &Path) {
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };
    for (key, value) in parse_dotenv(&content) {
        if env::var(&key).is_err() {
            env::set_var(&key, &value);
        }
    }
    tracing::debug!(path = %path.display(), "loaded dotenv file");
}

/// Parse `KEY=value` lines. Blank lines and `#` comments are skipped, inline
/// comments are stripped from unquoted values, and surrounding quotes removed.
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let mut value = value.trim();
        if let Some(hash_pos) = value.find('#') {
            let before_hash = value[..hash_pos].trim_end();
            if !before_hash.contains('"') && !before_hash.contains('\'') {
                value = before_hash;
            }
        }
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        if !key.is_empty() {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    pairs
}

/// Read `primary`, then each alias; fall back to `default` when all are unset or empty.
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    env_optional(primary, aliases).unwrap_or_else(default)
}

/// Read `primary`, then each alias. Blank values count as unset.
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    std::iter::once(primary)
        .chain(aliases.iter().copied())
        .find_map(|k| env::var(k).ok())
        .and_then(|s| {
            let s = s.trim().to_string();
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        })
}

/// Boolean env var: 0/false/no/off are false, any other value is true.
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    match env_optional(primary, aliases) {
        Some(s) => !matches!(s.to_lowercase().as_str(), "0" | "false" | "no" | "off"),
        None => default,
    }
}

/// Unsigned integer env var; unparsable values fall back to `default` with a warning.
pub fn env_u64(primary: &str, aliases: &[&str], default: u64) -> u64 {
    match env_optional(primary, aliases) {
        Some(s) => s.parse().unwrap_or_else(|_| {
            tracing::warn!(key = primary, value = %s, "ignoring non-numeric value");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotenv_strips_comments_and_quotes() {
        let content = r#"
# comment
OCI_CONFIG_PROFILE=PROD
export LOG_LEVEL="DEBUG"
DEFAULT_COMPARTMENT_OCID=ocid1.compartment.oc1..aaa # trailing
QUOTED='a # b'
NOVALUE
"#;
        let pairs = parse_dotenv(content);
        assert_eq!(
            pairs,
            vec![
                ("OCI_CONFIG_PROFILE".to_string(), "PROD".to_string()),
                ("LOG_LEVEL".to_string(), "DEBUG".to_string()),
                (
                    "DEFAULT_COMPARTMENT_OCID".to_string(),
                    "ocid1.compartment.oc1..aaa".to_string()
                ),
                ("QUOTED".to_string(), "a # b".to_string()),
            ]
        );
    }

    #[test]
    fn test_env_optional_uses_alias_and_ignores_blank() {
        env::set_var("OCIMCP_TEST_LOADER_PRIMARY", "   ");
        env::set_var("OCIMCP_TEST_LOADER_ALIAS", "from-alias");
        assert_eq!(
            env_optional("OCIMCP_TEST_LOADER_PRIMARY", &["OCIMCP_TEST_LOADER_ALIAS"]),
            Some("from-alias".to_string())
        );
        env::remove_var("OCIMCP_TEST_LOADER_PRIMARY");
        env::remove_var("OCIMCP_TEST_LOADER_ALIAS");
    }

    #[test]
    fn test_env_bool_and_u64() {
        env::set_var("OCIMCP_TEST_LOADER_BOOL", "off");
        assert!(!env_bool("OCIMCP_TEST_LOADER_BOOL", &[], true));
        env::set_var("OCIMCP_TEST_LOADER_BOOL", "1");
        assert!(env_bool("OCIMCP_TEST_LOADER_BOOL", &[], false));
        env::remove_var("OCIMCP_TEST_LOADER_BOOL");
        assert!(env_bool("OCIMCP_TEST_LOADER_BOOL", &[], true));

        env::set_var("OCIMCP_TEST_LOADER_U64", "abc");
        assert_eq!(env_u64("OCIMCP_TEST_LOADER_U64", &[], 60), 60);
        env::set_var("OCIMCP_TEST_LOADER_U64", "15");
        assert_eq!(env_u64("OCIMCP_TEST_LOADER_U64", &[], 60), 15);
        env::remove_var("OCIMCP_TEST_LOADER_U64");
    }
}
