use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_endpoint() -> String {
    "http://127.0.0.1:1234/v1/chat/completions".to_string()
}

fn default_models() -> Vec<String> {
    vec!["deepseek-chat".to_string(), "deepseek-coder".to_string()]
}

fn default_greeting() -> String {
    "Hello! I'm AI Assistant running locally. How can I help you today?".to_string()
}

fn default_progress_interval_ms() -> u64 {
    400
}

fn default_width() -> u32 {
    600
}

fn default_height() -> u32 {
    720
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub resizable: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig {
            endpoint: default_endpoint(),
            models: default_models(),
            greeting: default_greeting(),
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width: default_width(),
            height: default_height(),
            resizable: false,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(&Self::get_config_path())
    }

    pub fn load_from(config_path: &Path) -> Self {
        if !config_path.exists() {
            log::info!("No config at {}, using defaults", config_path.display());
            return Config::default();
        }

        match fs::read_to_string(config_path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Error parsing {}: {:#}. Using defaults.", config_path.display(), e);
                    Config::default()
                }
            },
            Err(e) => {
                log::warn!("Error reading {}: {}. Using defaults.", config_path.display(), e);
                Config::default()
            }
        }
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        if config.chat.models.is_empty() {
            log::warn!("Config lists no models, falling back to the built-in list");
            config.chat.models = default_models();
        }
        Ok(config)
    }

    pub fn get_config_path() -> PathBuf {
        if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home).join(".config/deepseek-chat/config.toml")
        } else {
            PathBuf::from("config.toml")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.chat.endpoint, "http://127.0.0.1:1234/v1/chat/completions");
        assert_eq!(config.chat.models, vec!["deepseek-chat", "deepseek-coder"]);
        assert_eq!(config.chat.progress_interval_ms, 400);
        assert_eq!(config.window.width, 600);
        assert_eq!(config.window.height, 720);
        assert!(!config.window.resizable);
    }

    #[test]
    fn test_endpoint_override_keeps_other_defaults() {
        let config = Config::parse(
            r#"
            [chat]
            endpoint = "http://10.0.0.5:8080/v1/chat/completions"
            "#,
        )
        .unwrap();
        assert_eq!(config.chat.endpoint, "http://10.0.0.5:8080/v1/chat/completions");
        assert_eq!(config.chat.models.len(), 2);
        assert!(config.chat.greeting.starts_with("Hello!"));
    }

    #[test]
    fn test_empty_model_list_falls_back() {
        let config = Config::parse(
            r#"
            [chat]
            models = []
            "#,
        )
        .unwrap();
        assert_eq!(config.chat.models, default_models());
    }

    #[test]
    fn test_window_section() {
        let config = Config::parse(
            r#"
            [window]
            width = 800
            resizable = true
            "#,
        )
        .unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 720);
        assert!(config.window.resizable);
    }

    #[test]
    fn test_load_from_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[chat]\nmodels = [\"local-model\"]\n").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.chat.models, vec!["local-model"]);
        assert_eq!(config.chat.progress_interval_ms, 400);
    }

    #[test]
    fn test_load_from_invalid_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[chat\nendpoint = ").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.chat.endpoint, default_endpoint());
        assert_eq!(config.window.width, 600);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml"));
        assert_eq!(config.chat.models, default_models());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Config::parse("[chat\nendpoint = ").is_err());
    }
}
