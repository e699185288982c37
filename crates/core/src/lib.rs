//! sitepilot-core - Core library for the sitepilot CLI
//!
//! This library deploys a static site folder to an S3 bucket, either as a
//! plain re-upload with an optional CloudFront invalidation, or as a first-time
//! secure setup: private bucket, origin access control, distribution and a
//! bucket policy that trusts that one distribution.

pub mod bucket;
pub mod cdn;
pub mod clock;
pub mod config;
pub mod content;
pub mod deploy;
pub mod error;
pub mod invalidate;
pub mod lockdown;
pub mod metadata;
pub mod policy;
pub mod progress;
pub mod provision;
pub mod storage;
pub mod sync;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use bucket::{create_new_bucket, validate_bucket_name, BucketTarget};
pub use cdn::{Cdn, CloudFrontCdn};
pub use clock::{Clock, SystemClock};
pub use config::{get_config_path, load_config, load_config_from, validate_config};
pub use config::{AwsConfig, CdnConfig, DeployConfig, LoggingConfig, SiteConfig};
pub use content::ContentRoot;
pub use deploy::{DeployMode, DeployReport, Deployer, Stage};
pub use error::{Error, Result, ServiceError, ServiceErrorKind};
pub use invalidate::{InvalidationOutcome, InvalidationRequest};
pub use lockdown::AccessLockState;
pub use metadata::ContentItem;
pub use progress::{Reporter, SilentReporter};
pub use provision::Distribution;
pub use storage::{ObjectStore, S3Store};
