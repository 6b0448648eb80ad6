use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, TestGenError};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TestGenConfig {
   pub api_base_url: String,

   /// Optional API key for authentication (overridden by `LLM_TESTGEN_API_KEY`
   /// env var)
   pub api_key: Option<String>,

   /// HTTP request timeout in seconds
   pub request_timeout_secs: u64,

   /// HTTP connection timeout in seconds
   pub connect_timeout_secs: u64,

   pub max_retries:        u32,
   pub initial_backoff_ms: u64,
   pub temperature:        f32,
   pub generation_model:   String,

   /// Extensions the applier is allowed to create test files with
   pub valid_extensions: Vec<String>,
}

impl Default for TestGenConfig {
   fn default() -> Self {
      Self {
         api_base_url:         "http://localhost:4000".to_string(),
         api_key:              None,
         request_timeout_secs: 120,
         connect_timeout_secs: 30,
         max_retries:          3,
         initial_backoff_ms:   1000,
         temperature:          0.2, // Low temperature for consistent structured output
         generation_model:     "claude-sonnet-4.5".to_string(),
         valid_extensions:     vec![
            "py".to_string(),
            "txt".to_string(),
            "md".to_string(),
            "cpp".to_string(),
            "c".to_string(),
            "java".to_string(),
            "js".to_string(),
            "html".to_string(),
            "css".to_string(),
            "ts".to_string(),
            "json".to_string(),
         ],
      }
   }
}

impl TestGenConfig {
   /// Load config from the default location
   /// (~/.config/llm-testgen/config.toml). Falls back to Default if the file
   /// doesn't exist. Environment variables override config file values:
   /// - `LLM_TESTGEN_API_URL` overrides `api_base_url`
   /// - `LLM_TESTGEN_API_KEY` overrides `api_key`
   pub fn load() -> Result<Self> {
      let config_path = if let Ok(custom_path) = std::env::var("LLM_TESTGEN_CONFIG") {
         PathBuf::from(custom_path)
      } else {
         Self::default_config_path().unwrap_or_else(|_| PathBuf::new())
      };

      let mut config = if config_path.exists() {
         Self::from_file(&config_path)?
      } else {
         Self::default()
      };

      Self::apply_env_overrides(&mut config);
      Ok(config)
   }

   /// Load config from a specific file
   pub fn from_file(path: &Path) -> Result<Self> {
      let contents = std::fs::read_to_string(path)
         .map_err(|e| TestGenError::Other(format!("Failed to read config: {e}")))?;
      let mut config: Self = toml::from_str(&contents)
         .map_err(|e| TestGenError::Other(format!("Failed to parse config: {e}")))?;

      Self::apply_env_overrides(&mut config);
      Ok(config)
   }

   /// Apply environment variable overrides to config
   fn apply_env_overrides(config: &mut Self) {
      if let Ok(api_url) = std::env::var("LLM_TESTGEN_API_URL") {
         config.api_base_url = api_url;
      }

      if let Ok(api_key) = std::env::var("LLM_TESTGEN_API_KEY") {
         config.api_key = Some(api_key);
      }
   }

   /// Get default config path (platform-safe)
   /// Tries HOME (Unix/Linux/macOS) then USERPROFILE (Windows)
   pub fn default_config_path() -> Result<PathBuf> {
      if let Ok(home) = std::env::var("HOME") {
         return Ok(PathBuf::from(home).join(".config/llm-testgen/config.toml"));
      }

      if let Ok(home) = std::env::var("USERPROFILE") {
         return Ok(PathBuf::from(home).join(".config/llm-testgen/config.toml"));
      }

      Err(TestGenError::Other("No home directory found (tried HOME and USERPROFILE)".to_string()))
   }

   /// Whether `filename` carries an extension the applier may write.
   pub fn is_valid_extension(&self, filename: &str) -> bool {
      Path::new(filename)
         .extension()
         .and_then(|e| e.to_str())
         .is_some_and(|ext| self.valid_extensions.iter().any(|v| v == ext))
   }
}
