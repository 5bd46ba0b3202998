use std::path::Path;

use anyhow::{Context, Result};
use scanner::ScannerConfig;
use serde::{Deserialize, Serialize};

/// Scanner TOML used when neither `SCANNER_CONFIG_FILE` nor
/// `scanner_config_file` is set.
pub const DEFAULT_SCANNER_CONFIG_FILE: &str = "/etc/pencil-scan/scanner.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// Standalone scanner TOML. When present it replaces `[scanner]`.
    #[serde(default)]
    pub scanner_config_file: Option<String>,
    #[serde(default)]
    pub scanner: ScannerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Upper bound on a whole request, analysis included.
    pub request_timeout_secs: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    File { path: String },
}

impl GatewayConfig {
    /// Load configuration from gateway.toml and environment variables
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        // Compile-time defaults first so missing keys never fail deserialization
        let defaults = config::Config::try_from(&GatewayConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        // 1. /etc/pencil-scan/gateway.toml (production)
        // 2. config/gateway.toml (local development)
        // 3. crates/gateway/config/gateway.toml (workspace root)
        let config_paths = vec![
            "/etc/pencil-scan/gateway",
            "config/gateway",
            "crates/gateway/config/gateway",
        ];

        for path in config_paths {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Double underscore for nested keys: GATEWAY_SERVER__BIND_ADDRESS
        builder = builder.add_source(
            config::Environment::with_prefix("GATEWAY")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Final scanner configuration.
    ///
    /// Priority: `SCANNER_CONFIG_FILE` > `scanner_config_file` > default path
    /// > embedded `[scanner]`. Scanner env overrides always apply last.
    pub fn resolve_scanner<F>(&self, lookup: F) -> Result<ScannerConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup("SCANNER_CONFIG_FILE")
            .or_else(|| self.scanner_config_file.clone())
            .unwrap_or_else(|| DEFAULT_SCANNER_CONFIG_FILE.to_string());

        let mut scanner = if Path::new(&path).exists() {
            tracing::info!("Loading scanner configuration from: {}", path);
            ScannerConfig::from_file(&path).with_context(|| format!("Failed to load {}", path))?
        } else {
            self.scanner.clone()
        };
        scanner.apply_env_overrides(lookup);
        Ok(scanner)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.server
            .bind_address
            .parse::<std::net::SocketAddr>()
            .context("Invalid bind_address")?;

        if self.server.request_timeout_secs == 0 {
            anyhow::bail!("server.request_timeout_secs must be > 0");
        }

        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "0.0.0.0:8080".to_string(),
                request_timeout_secs: 300,
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            logging: LoggingConfig {
                level: "info,gateway=debug,scanner=debug".to_string(),
                format: LogFormat::Pretty,
                output: LogOutput::Stdout,
            },
            scanner_config_file: None,
            scanner: ScannerConfig::default(),
        }
    }
}
