use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, warn};

/// Load `.env` files from `project_root`
///
/// Precedence (later overrides earlier):
/// 1. .env
/// 2. .env.local
/// 3. Actual process environment variables
///
/// Returns the files that were found and loaded.
pub fn load_dotenv(project_root: &Path) -> Vec<PathBuf> {
    let mut loaded = Vec::new();

    // dotenvy never overwrites an existing variable, so the most specific
    // file goes first
    for name in [".env.local", ".env"] {
        let path = project_root.join(name);
        match dotenvy::from_path(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "loaded env file");
                loaded.push(path);
            }
            Err(e) if e.not_found() => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to load env file"),
        }
    }

    loaded
}

/// Get an environment variable with a default value
///
/// A value that is set but does not parse falls back to `default` with a
/// warning.
///
/// # Example
/// ```
/// use solanum::config::env;
///
/// let depth: usize = env("SOLANUM_MAX_RESOLVE_DEPTH", 64);
/// ```
pub fn env<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "ignoring unparsable environment variable");
            default
        }),
        Err(_) => default,
    }
}

/// Get an optional environment variable
pub fn env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_env_default_and_parse() {
        std::env::set_var("SOLANUM_TEST_ENV_PARSE", " 12 ");
        std::env::set_var("SOLANUM_TEST_ENV_BAD", "twelve");

        assert_eq!(env("SOLANUM_TEST_ENV_PARSE", 0u32), 12);
        assert_eq!(env("SOLANUM_TEST_ENV_BAD", 7u32), 7);
        assert_eq!(env("SOLANUM_TEST_ENV_MISSING", 3u32), 3);
        assert_eq!(env_optional::<u32>("SOLANUM_TEST_ENV_MISSING"), None);
        assert_eq!(env_optional::<u32>("SOLANUM_TEST_ENV_PARSE"), Some(12));
    }

    #[test]
    fn test_load_dotenv_local_overrides_base() {
        let root = std::env::temp_dir().join(format!("solanum-dotenv-{}", std::process::id()));
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join(".env"), "SOLANUM_TEST_DOTENV=base\nSOLANUM_TEST_DOTENV_BASE=yes\n").unwrap();
        fs::write(root.join(".env.local"), "SOLANUM_TEST_DOTENV=local\n").unwrap();

        let loaded = load_dotenv(&root);

        assert_eq!(loaded, vec![root.join(".env.local"), root.join(".env")]);
        assert_eq!(std::env::var("SOLANUM_TEST_DOTENV").unwrap(), "local");
        assert_eq!(std::env::var("SOLANUM_TEST_DOTENV_BASE").unwrap(), "yes");

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_load_dotenv_without_files() {
        let root = std::env::temp_dir().join(format!("solanum-no-dotenv-{}", std::process::id()));
        fs::create_dir_all(&root).unwrap();

        assert!(load_dotenv(&root).is_empty());

        fs::remove_dir_all(&root).unwrap();
    }
}
