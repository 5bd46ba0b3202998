//! Load — config loading from TOML and environment overrides, plus validation.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::model::{FilterConfig, SamplerConfig, ScannerConfig};
use crate::error::ScanError;

impl ScannerConfig {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist. Environment variables are applied on top.
    ///
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load(path: &str) -> Result<Self, ScanError> {
        let mut config = if Path::new(path).exists() {
            tracing::info!("Loading scanner configuration from: {}", path);
            Self::from_file(path)?
        } else {
            tracing::info!("Scanner config not found at {}, using defaults", path);
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, ScanError> {
        let mut file = File::open(path)
            .map_err(|e| ScanError::Config(format!("cannot open {}: {}", path, e)))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ScanError::Config(format!("cannot read {}: {}", path, e)))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ScanError> {
        toml::from_str(contents).map_err(|e| ScanError::Config(e.to_string()))
    }

    /// Apply environment overrides for critical values.
    ///
    /// `lookup` is injected so tests don't touch the process environment.
    /// Unparseable numeric values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY").or_else(|| lookup("API_KEY")) {
            if !key.trim().is_empty() {
                self.analysis.api_key = Some(key.trim().to_string());
            }
        }
        if let Some(model) = lookup("SCANNER_ANALYSIS_MODEL") {
            self.analysis.model = model;
        }
        if let Some(window) = lookup("SCANNER_WINDOW_SIZE").and_then(|s| s.parse().ok()) {
            self.sampler.window_size = window;
        }
        if let Some(max) = lookup("SCANNER_MAX_LINES").and_then(|s| s.parse().ok()) {
            self.filter.max_lines = max;
        }
    }

    /// Validate that configuration values are sane
    pub fn validate(&self) -> Result<(), String> {
        self.sampler.validate()?;
        self.filter.validate()?;
        if self.analysis.endpoint.is_empty() {
            return Err("analysis.endpoint must not be empty".to_string());
        }
        if self.analysis.model.is_empty() {
            return Err("analysis.model must not be empty".to_string());
        }
        if self.analysis.timeout_secs == 0 {
            return Err("analysis.timeout_secs must be > 0".to_string());
        }
        Ok(())
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.window_size == 0 {
            return Err("sampler.window_size must be > 0".to_string());
        }
        if self.max_input_bytes == 0 {
            return Err("sampler.max_input_bytes must be > 0".to_string());
        }
        if self.max_decompressed_bytes < self.window_size as u64 {
            return Err("sampler.max_decompressed_bytes must be >= window_size".to_string());
        }
        Ok(())
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_lines == 0 {
            return Err("filter.max_lines must be > 0".to_string());
        }
        let vocabularies = [
            ("keywords", &self.keywords),
            ("identifiers", &self.identifiers),
            ("state_dump_markers", &self.state_dump_markers),
            ("device_name_markers", &self.device_name_markers),
            ("device_markers", &self.device_markers),
            ("signal_markers", &self.signal_markers),
            ("link_event_markers", &self.link_event_markers),
        ];
        for (name, words) in vocabularies {
            if words.is_empty() || words.iter().any(|w| w.is_empty()) {
                return Err(format!("filter.{} must contain only non-empty literals", name));
            }
        }
        Ok(())
    }
}
