use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Confluence base URL, e.g. https://example.atlassian.net/wiki
    pub base_url: String,
    /// Email associated with the API token
    pub user_email: String,
    /// API token for basic auth. Never serialized back out, so `config
    /// show --format json` cannot leak it.
    #[serde(skip_serializing)]
    pub api_token: String,
    /// Default space key when --space is not given
    pub space: Option<String>,
    /// Sync ledger file
    pub state_file: PathBuf,
    /// Timeout applied to every remote request, in seconds
    pub request_timeout_secs: u64,
    /// Config file this was loaded from, when one existed
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            user_email: String::new(),
            api_token: String::new(),
            space: None,
            state_file: PathBuf::from(".docs-sync-state.json"),
            request_timeout_secs: 30,
            config_file: None,
        }
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Self::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
            config.config_file = Some(path);
        }

        // Apply environment variable overrides
        if let Ok(base_url) = std::env::var("DOCSYNC_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(user_email) = std::env::var("DOCSYNC_USER_EMAIL") {
            config.user_email = user_email;
        }
        if let Ok(api_token) = std::env::var("DOCSYNC_API_TOKEN") {
            config.api_token = api_token;
        }
        if let Ok(space) = std::env::var("DOCSYNC_SPACE") {
            config.space = Some(space);
        }
        if let Ok(state_file) = std::env::var("DOCSYNC_STATE_FILE") {
            config.state_file = PathBuf::from(state_file);
        }

        Ok(config)
    }

    /// Default config file path: ~/.config/docsync/config.yaml
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docsync")
            .join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    e
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.state_file, PathBuf::from(".docs-sync-state.json"));
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.base_url.is_empty());
    }

    #[test]
    fn test_load_no_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "base_url: https://example.atlassian.net/wiki").unwrap();
        writeln!(file, "user_email: docs@example.com").unwrap();
        writeln!(file, "space: ARCH").unwrap();
        writeln!(file, "request_timeout_secs: 10").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(config.base_url, "https://example.atlassian.net/wiki");
        assert_eq!(config.user_email, "docs@example.com");
        assert_eq!(config.space.as_deref(), Some("ARCH"));
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "user_email: fromfile@example.com").unwrap();

        // Set env var
        std::env::set_var("DOCSYNC_USER_EMAIL", "fromenv@example.com");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.user_email, "fromenv@example.com");

        // Clean up
        std::env::remove_var("DOCSYNC_USER_EMAIL");
    }

    #[test]
    fn test_api_token_is_never_serialized() {
        let mut config = Config::default();
        config.api_token = "super-secret-token".to_string();

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super-secret-token"));
        assert!(!json.contains("api_token"));
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
