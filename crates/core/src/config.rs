//! Configuration management for sitepilot

use crate::error::{Error, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration directory name
const CONFIG_DIR: &str = "sitepilot";

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Managed "CachingOptimized" cache policy
pub const CACHE_POLICY_CACHING_OPTIMIZED: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";

/// Managed "CORS-S3Origin" origin request policy
pub const ORIGIN_REQUEST_POLICY_CORS_S3: &str = "88a5eaf4-2fd4-4709-b370-b4c650ea3fcf";

/// Main configuration structure
///
/// Every section is optional in the file; missing values fall back to the
/// defaults below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub cdn: CdnConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// AWS regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Region the bucket lives in
    #[serde(default = "default_region")]
    pub region: String,
    /// Region of the CloudFront control plane
    #[serde(default = "default_cdn_region")]
    pub cdn_region: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            cdn_region: default_cdn_region(),
        }
    }
}

/// Local content tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_entry_document")]
    pub entry_document: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            dir: default_site_dir(),
            entry_document: default_entry_document(),
        }
    }
}

/// Distribution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdnConfig {
    #[serde(default = "default_cache_policy_id")]
    pub cache_policy_id: String,
    #[serde(default = "default_origin_request_policy_id")]
    pub origin_request_policy_id: String,
    #[serde(default = "default_price_class")]
    pub price_class: String,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            cache_policy_id: default_cache_policy_id(),
            origin_request_policy_id: default_origin_request_policy_id(),
            price_class: default_price_class(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_region() -> String {
    "eu-north-1".to_string()
}

fn default_cdn_region() -> String {
    "us-east-1".to_string()
}

fn default_site_dir() -> PathBuf {
    PathBuf::from("sites")
}

fn default_entry_document() -> String {
    "index.html".to_string()
}

fn default_cache_policy_id() -> String {
    CACHE_POLICY_CACHING_OPTIMIZED.to_string()
}

fn default_origin_request_policy_id() -> String {
    ORIGIN_REQUEST_POLICY_CORS_S3.to_string()
}

fn default_price_class() -> String {
    "PriceClass_100".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl DeployConfig {
    /// Configured log level, `warn` when the section is absent
    pub fn log_level(&self) -> &str {
        self.logging.as_ref().map(|l| l.level.as_str()).unwrap_or("warn")
    }

    /// Regional S3 endpoint the bucket is served from
    pub fn storage_endpoint(&self) -> String {
        format!("https://s3.{}.amazonaws.com", self.aws.region)
    }
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let home = home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
    Ok(home.join(".config").join(CONFIG_DIR))
}

/// Get the configuration file path
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

/// Load configuration from an explicit file
pub fn load_config_from(path: &Path) -> Result<DeployConfig> {
    if !path.exists() {
        return Err(Error::ConfigNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        Error::InvalidConfig(format!("Failed to read config file: {}", e))
    })?;

    let config: DeployConfig = toml::from_str(&content).map_err(|e| {
        Error::InvalidConfig(format!("Failed to parse config file: {}", e))
    })?;

    Ok(config)
}

/// Load configuration from the default location, falling back to defaults
pub fn load_config() -> Result<DeployConfig> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(DeployConfig::default());
    }

    load_config_from(&config_path)
}

/// Validate configuration
pub fn validate_config(config: &DeployConfig) -> Result<()> {
    if config.aws.region.trim().is_empty() {
        return Err(Error::InvalidInput("AWS region cannot be empty".to_string()));
    }

    if config.aws.cdn_region.trim().is_empty() {
        return Err(Error::InvalidInput("CDN region cannot be empty".to_string()));
    }

    if config.site.dir.as_os_str().is_empty() {
        return Err(Error::InvalidInput("Site directory cannot be empty".to_string()));
    }

    // The entry document is served as the default root object, so it must be
    // a plain file name at the root of the tree
    let entry = &config.site.entry_document;
    if entry.is_empty() || entry.contains('/') || entry.contains('\\') {
        return Err(Error::InvalidInput(format!(
            "Entry document must be a file name at the site root (got '{}')",
            entry
        )));
    }

    if config.cdn.cache_policy_id.is_empty() || config.cdn.origin_request_policy_id.is_empty() {
        return Err(Error::InvalidInput(
            "CDN cache and origin request policy ids cannot be empty".to_string(),
        ));
    }

    if !config.cdn.price_class.starts_with("PriceClass_") {
        return Err(Error::InvalidInput(format!(
            "Unknown price class '{}'",
            config.cdn.price_class
        )));
    }

    Ok(())
}
