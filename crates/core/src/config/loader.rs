//! Config path resolution
//!
//! The path comes from the `RENDERHOOK_CONFIG` environment variable when
//! set, otherwise `renderhook.toml` next to the host executable.

use std::path::PathBuf;

use super::{ConfigError, ConfigResult};

/// Environment variable overriding the config path
pub const CONFIG_ENV: &str = "RENDERHOOK_CONFIG";

/// Config file name looked up next to the host executable
pub const CONFIG_FILE_NAME: &str = "renderhook.toml";

/// Returns the config path the session loads from
pub fn config_path() -> ConfigResult<PathBuf> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => default_config_path(),
    }
}

/// Returns `renderhook.toml` in the host executable's directory
pub fn default_config_path() -> ConfigResult<PathBuf> {
    let exe = std::env::current_exe().map_err(ConfigError::IoError)?;

    exe.parent()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoConfigPath)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::config::SessionConfig;

    #[test]
    fn test_default_path_next_to_executable() {
        let path = default_config_path().unwrap();
        let exe = std::env::current_exe().unwrap();

        assert!(path.ends_with(CONFIG_FILE_NAME));
        assert_eq!(path.parent(), exe.parent());
    }

    #[test]
    fn test_env_override_takes_precedence() {
        let dir = std::env::temp_dir().join(format!("renderhook-env-{}", std::process::id()));
        let path = dir.join("custom.toml");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "debug = true\nbackends = [\"vulkan\"]\n").unwrap();

        std::env::set_var(CONFIG_ENV, &path);
        assert_eq!(config_path().unwrap(), path);

        let config = SessionConfig::load().unwrap();
        assert!(config.debug);
        assert_eq!(config.backends, vec![Backend::Vulkan]);

        std::fs::write(&path, "backends = [\"opengl\"]\n").unwrap();
        let mut reloaded = config.clone();
        reloaded.reload().unwrap();
        assert!(!reloaded.debug);
        assert_eq!(reloaded.backends, vec![Backend::OpenGL]);

        std::env::remove_var(CONFIG_ENV);
        assert_eq!(config_path().unwrap(), default_config_path().unwrap());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
