use gemini_live::{ConnectionDescriptor, SessionSetup, types::ResponseModality};
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    // The exact startup message the console has always shipped with.
    #[error("set GEMINI_API_KEY in .env")]
    MissingApiKey,
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Default Live API model when `LIVE_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "models/gemini-2.0-flash-exp";

/// Default identity backend when `IDENTITY_URL` is not set.
pub const DEFAULT_IDENTITY_URL: &str = "http://localhost:8787";

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub modality: ResponseModality,
    pub identity_url: String,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Fails before any UI renders when the credential is absent; that is
    /// the only fatal misconfiguration.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let model = std::env::var("LIVE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let modality_str = std::env::var("LIVE_MODALITY").unwrap_or_else(|_| "audio".to_string());
        let modality = match modality_str.to_lowercase().as_str() {
            "audio" => ResponseModality::Audio,
            "text" => ResponseModality::Text,
            other => {
                return Err(ConfigError::InvalidValue(
                    "LIVE_MODALITY".to_string(),
                    format!("'{}' is not a supported modality", other),
                ));
            }
        };

        let identity_url =
            std::env::var("IDENTITY_URL").unwrap_or_else(|_| DEFAULT_IDENTITY_URL.to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            api_key,
            model,
            modality,
            identity_url,
            log_level,
        })
    }

    /// The connection descriptor handed to the session provider.
    pub fn descriptor(&self) -> ConnectionDescriptor {
        ConnectionDescriptor::new(self.api_key.clone())
    }

    /// The setup parameters for a new live session.
    pub fn session_setup(&self) -> SessionSetup {
        SessionSetup::new(self.model.clone()).with_modalities(vec![self.modality])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("GEMINI_API_KEY");
            env::remove_var("LIVE_MODEL");
            env::remove_var("LIVE_MODALITY");
            env::remove_var("IDENTITY_URL");
            env::remove_var("RUST_LOG");
        }
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            format!("{}", ConfigError::MissingApiKey),
            "set GEMINI_API_KEY in .env"
        );
        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal() {
        clear_env_vars();
        unsafe {
            env::set_var("GEMINI_API_KEY", "abc123");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.api_key, "abc123");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.modality, ResponseModality::Audio);
        assert_eq!(config.identity_url, DEFAULT_IDENTITY_URL);
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_config_missing_api_key_fails_before_ui() {
        clear_env_vars();

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
        assert_eq!(err.to_string(), "set GEMINI_API_KEY in .env");
    }

    #[test]
    #[serial]
    fn test_config_blank_api_key_is_missing() {
        clear_env_vars();
        unsafe {
            env::set_var("GEMINI_API_KEY", "   ");
        }

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("GEMINI_API_KEY", "custom-key");
            env::set_var("LIVE_MODEL", "models/gemini-exp-1206");
            env::set_var("LIVE_MODALITY", "text");
            env::set_var("IDENTITY_URL", "https://id.example.com");
            env::set_var("RUST_LOG", "debug");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.model, "models/gemini-exp-1206");
        assert_eq!(config.modality, ResponseModality::Text);
        assert_eq!(config.identity_url, "https://id.example.com");
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    #[serial]
    fn test_config_invalid_modality() {
        clear_env_vars();
        unsafe {
            env::set_var("GEMINI_API_KEY", "abc123");
            env::set_var("LIVE_MODALITY", "video");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "LIVE_MODALITY"),
            _ => panic!("Expected InvalidValue for LIVE_MODALITY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("GEMINI_API_KEY", "abc123");
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }

    #[test]
    #[serial]
    fn test_descriptor_targets_bidi_endpoint() {
        clear_env_vars();
        unsafe {
            env::set_var("GEMINI_API_KEY", "abc123");
        }

        let config = Config::from_env().unwrap();
        assert!(config.descriptor().uri().ends_with(".BidiGenerateContent"));
    }
}
