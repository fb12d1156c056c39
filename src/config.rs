//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Error;
use crate::llm::{GeminiClient, GenerationConfig, GEMINI_API_URL};
use crate::service::{AnswerService, ModeSettings};
use crate::store::{FileStore, PersistentStore, API_KEY};
use crate::Result;

/// Environment variable consulted when no API key has been saved
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the models API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Directory holding the key-value store
    #[serde(default = "config_dir")]
    pub data_dir: PathBuf,

    /// Sampling parameters for single-answer mode
    #[serde(default = "default_answer")]
    pub answer: GenerationConfig,

    /// Sampling parameters for suggestion mode
    #[serde(default = "default_suggestions")]
    pub suggestions: GenerationConfig,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_base() -> String {
    GEMINI_API_URL.to_string()
}

fn default_answer() -> GenerationConfig {
    GenerationConfig::ANSWER
}

fn default_suggestions() -> GenerationConfig {
    GenerationConfig::SUGGESTIONS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            data_dir: config_dir(),
            answer: default_answer(),
            suggestions: default_suggestions(),
        }
    }
}

impl Config {
    pub fn mode_settings(&self) -> ModeSettings {
        ModeSettings {
            answer: self.answer,
            suggestions: self.suggestions,
        }
    }

    pub fn store(&self) -> FileStore {
        FileStore::new(&self.data_dir)
    }

    pub fn client(&self) -> GeminiClient {
        GeminiClient::with_base_url(&self.api_base, &self.model)
    }

    pub fn service(&self) -> AnswerService<GeminiClient> {
        AnswerService::with_settings(self.client(), self.mode_settings())
    }

    /// Validate sampling ranges.
    pub fn validate(&self) -> Result<()> {
        for (mode, params) in [("answer", &self.answer), ("suggestions", &self.suggestions)] {
            if !(0.0..=1.0).contains(&params.temperature) {
                return Err(Error::Config(format!(
                    "{mode}.temperature must be between 0.0 and 1.0, got {}",
                    params.temperature
                )));
            }
            if !(0.0..=1.0).contains(&params.top_p) {
                return Err(Error::Config(format!(
                    "{mode}.topP must be between 0.0 and 1.0, got {}",
                    params.top_p
                )));
            }
            if params.max_output_tokens == 0 {
                return Err(Error::Config(format!("{mode}.maxOutputTokens must be positive")));
            }
        }
        if self.model.trim().is_empty() {
            return Err(Error::Config("model cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// API key from the environment, if set
pub fn env_api_key() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty())
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".guru")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration from file, falling back to defaults
pub fn load() -> Result<Config> {
    load_from(&config_path())
}

fn load_from(path: &std::path::Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config at {:?}: {}", path, e)))?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to file
pub fn save(config: &Config) -> Result<()> {
    save_to(config, &config_path())
}

fn save_to(config: &Config, path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Interactive setup: model, API key, optional connectivity check
pub async fn onboard() -> Result<()> {
    use crate::ui;
    use inquire::{Confirm, Password, PasswordDisplayMode, Select, Text};

    ui::print_guru_header("Setup Wizard", "Local");
    println!("  Welcome! Let's get Guru ready to write your client replies.\n");

    let mut config = load().unwrap_or_default();

    // 1. Model
    let models = vec!["gemini-2.0-flash", "gemini-1.5-flash", "gemini-1.5-pro", "Other"];
    let choice = Select::new("Choose a Gemini model:", models)
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;
    config.model = if choice == "Other" {
        Text::new("Model name:")
            .prompt()
            .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?
    } else {
        choice.to_string()
    };

    // 2. API key
    let key = Password::new("Enter your Gemini API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(Error::Config("API key cannot be empty".to_string()));
    }

    // 3. Optional key check
    let check = Confirm::new("Test the API key now?")
        .with_default(true)
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;
    if check {
        ui::print_thinking("Contacting Gemini");
        match config.service().test_credential(&key).await {
            Ok(()) => ui::print_success("API key works"),
            Err(e) => ui::print_warning(&format!("Key check failed: {}", e)),
        }
    }

    // 4. Save
    ui::print_thinking("Saving configuration");
    save(&config)?;
    config.store().set(API_KEY, &key)?;

    println!();
    ui::print_success("Setup complete!");
    ui::print_step("Try: guru answer -c \"Can you start Monday?\" -s \"yes, 9am\"");

    Ok(())
}

/// Reset Guru by deleting all configuration, history and the stored key
pub fn reset() -> Result<()> {
    use crate::ui;
    use inquire::Confirm;

    ui::print_warning("CAUTION: This will delete Guru's configuration, API key and history.");

    let confirmed = Confirm::new("Are you absolutely sure you want to reset Guru?")
        .with_default(false)
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;

    if confirmed {
        let dir = config_dir();
        if dir.exists() {
            ui::print_thinking(&format!("Deleting {:?}", dir));
            std::fs::remove_dir_all(dir)?;
            ui::print_success("Guru has been reset.");
        } else {
            ui::print_step("No configuration directory found.");
        }
    } else {
        ui::print_step("Reset cancelled.");
    }

    Ok(())
}
