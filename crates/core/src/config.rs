//! Configuration management for s3deploy

use crate::error::{Error, Result};
use dirs::home_dir;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration directory name
const CONFIG_DIR: &str = "s3deploy";

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Region used when nothing else is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Optional configuration file (`~/.config/s3deploy/config.toml`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub s3: S3Config,
    pub logging: Option<LoggingConfig>,
}

/// S3 section of the configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Config {
    pub bucket: Option<String>,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Values collected from command-line flags and environment variables.
///
/// Empty strings count as "not provided".
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub bucket: Option<String>,
    pub upload_dir: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

/// Fully resolved settings for one deploy run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub bucket: String,
    pub upload_dir: PathBuf,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub endpoint: Option<String>,
}

/// Get the default configuration file path
pub fn get_config_path() -> Result<PathBuf> {
    let home = home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
    Ok(home.join(".config").join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load configuration from an explicit file path
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Err(Error::ConfigNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        Error::InvalidConfig(format!("Failed to read config file: {}", e))
    })?;

    let config: ConfigFile = toml::from_str(&content)?;

    Ok(config)
}

/// Load the configuration file.
///
/// An explicit path must exist. The default location is optional and an
/// empty configuration is returned when it is absent.
pub fn load_config(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return load_config_file(path);
    }

    let path = match get_config_path() {
        Ok(path) => path,
        Err(_) => return Ok(ConfigFile::default()),
    };

    if path.exists() {
        tracing::debug!(path = %path.display(), "loading config file");
        load_config_file(&path)
    } else {
        Ok(ConfigFile::default())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Merge flag/env values over the configuration file and validate the result.
///
/// Returns `Error::Config` naming every missing setting.
pub fn resolve_config(sources: ConfigSources, file: &ConfigFile) -> Result<DeployConfig> {
    let s3 = &file.s3;

    let bucket = non_empty(sources.bucket).or_else(|| non_empty(s3.bucket.clone()));
    let access_key_id =
        non_empty(sources.access_key_id).or_else(|| non_empty(s3.access_key_id.clone()));
    let secret_access_key =
        non_empty(sources.secret_access_key).or_else(|| non_empty(s3.secret_access_key.clone()));
    let upload_dir = non_empty(sources.upload_dir);

    let mut missing = Vec::new();
    if bucket.is_none() {
        missing.push("bucket");
    }
    if upload_dir.is_none() {
        missing.push("dir");
    }
    if access_key_id.is_none() {
        missing.push("aws_key");
    }
    if secret_access_key.is_none() {
        missing.push("aws_secret");
    }

    match (bucket, upload_dir, access_key_id, secret_access_key) {
        (Some(bucket), Some(upload_dir), Some(access_key_id), Some(secret_access_key)) => {
            let config = DeployConfig {
                bucket,
                upload_dir: PathBuf::from(upload_dir),
                access_key_id,
                secret_access_key,
                region: non_empty(sources.region)
                    .or_else(|| non_empty(s3.region.clone()))
                    .unwrap_or_else(|| DEFAULT_REGION.to_string()),
                endpoint: non_empty(sources.endpoint).or_else(|| non_empty(s3.endpoint.clone())),
            };
            validate_config(&config)?;
            Ok(config)
        }
        _ => Err(Error::Config(format!("Missing required settings: {}", missing.join(", ")))),
    }
}

/// Validate configuration
pub fn validate_config(config: &DeployConfig) -> Result<()> {
    if config.bucket.is_empty() {
        return Err(Error::InvalidInput("Bucket name cannot be empty".to_string()));
    }

    if config.bucket.contains('/') {
        return Err(Error::InvalidInput(format!(
            "Bucket name cannot contain '/': {}",
            config.bucket
        )));
    }

    if let Some(endpoint) = &config.endpoint {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(Error::InvalidInput(format!(
                "Endpoint must start with http:// or https://: {}",
                endpoint
            )));
        }
    }

    Ok(())
}
