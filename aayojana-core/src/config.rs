//! Client configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{AayojanaError, AayojanaResult};
use crate::identity::UserId;

static DEFAULT_REQUEST_TIMEOUT: &str = "10s";

fn default_request_timeout() -> String {
    DEFAULT_REQUEST_TIMEOUT.to_string()
}

fn is_default_request_timeout(t: &String) -> bool {
    t == DEFAULT_REQUEST_TIMEOUT
}

/// Configuration at ~/.config/aayojana/config.toml
///
/// Any key can be overridden from the environment with an `AAYOJANA_`
/// prefix, e.g. `AAYOJANA_ACCESS_TOKEN`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AayojanaConfig {
    #[serde(default)]
    pub project_url: String,

    #[serde(default)]
    pub anon_key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Identity the CLI acts as.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    #[serde(
        default = "default_request_timeout",
        skip_serializing_if = "is_default_request_timeout"
    )]
    pub request_timeout: String,
}

impl Default for AayojanaConfig {
    fn default() -> Self {
        AayojanaConfig {
            project_url: String::new(),
            anon_key: String::new(),
            access_token: None,
            user_id: None,
            request_timeout: default_request_timeout(),
        }
    }
}

impl AayojanaConfig {
    pub fn config_path() -> AayojanaResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AayojanaError::Config("Could not determine config directory".into()))?
            .join("aayojana");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default path, creating a commented template first if
    /// there is no file yet.
    pub fn load() -> AayojanaResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> AayojanaResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("AAYOJANA"))
            .build()
            .map_err(|e| AayojanaError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AayojanaError::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> AayojanaResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| AayojanaError::Config(e.to_string()))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> AayojanaResult<()> {
        let contents = format!(
            "\
# aayojana configuration

# Your backend project (required):
# project_url = \"https://your-project.example.co\"
# anon_key = \"public-anon-key\"

# Session token of the signed-in user:
# access_token = \"...\"
# user_id = \"...\"

# How long to wait for the backend:
# request_timeout = \"{}\"
",
            DEFAULT_REQUEST_TIMEOUT
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AayojanaError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| AayojanaError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn validate(&self) -> AayojanaResult<()> {
        if self.project_url.trim().is_empty() {
            return Err(AayojanaError::Config(
                "project_url is not set. Add it to your config file or set AAYOJANA_PROJECT_URL"
                    .into(),
            ));
        }
        if self.anon_key.trim().is_empty() {
            return Err(AayojanaError::Config(
                "anon_key is not set. Add it to your config file or set AAYOJANA_ANON_KEY".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> AayojanaResult<Duration> {
        humantime::parse_duration(&self.request_timeout).map_err(|e| {
            AayojanaError::Config(format!(
                "Invalid request_timeout '{}': {e}",
                self.request_timeout
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_values_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
project_url = "https://abc.backend.example"
anon_key = "anon"
user_id = "user-1"
request_timeout = "2s 500ms"
"#,
        )
        .unwrap();

        let config = AayojanaConfig::load_from(&path).unwrap();
        assert_eq!(config.project_url, "https://abc.backend.example");
        assert_eq!(config.user_id, Some(UserId::from("user-1")));
        assert_eq!(config.request_timeout().unwrap(), Duration::from_millis(2500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_template_loads_but_does_not_validate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        AayojanaConfig::create_default_config(&path).unwrap();
        let config = AayojanaConfig::load_from(&path).unwrap();

        assert_eq!(config.request_timeout().unwrap(), Duration::from_secs(10));
        assert!(matches!(config.validate(), Err(AayojanaError::Config(_))));
    }

    #[test]
    fn save_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = AayojanaConfig {
            project_url: "https://abc.backend.example".into(),
            anon_key: "anon".into(),
            access_token: Some("token".into()),
            user_id: None,
            request_timeout: default_request_timeout(),
        };

        config.save(&path).unwrap();
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(!saved.contains("request_timeout"));

        let loaded = AayojanaConfig::load_from(&path).unwrap();
        assert_eq!(loaded.access_token.as_deref(), Some("token"));
    }

    #[test]
    fn bad_timeout_is_a_config_error() {
        let config = AayojanaConfig {
            request_timeout: "soon".into(),
            ..AayojanaConfig::default()
        };
        assert!(matches!(config.request_timeout(), Err(AayojanaError::Config(_))));
    }
}
