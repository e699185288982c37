//! Error types for sitepilot-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sitepilot-core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sitepilot-core
///
/// Every deployment step has its own variant so the caller can tell which
/// step aborted the run. Collaborator failures carry the raw service code.
#[derive(Error, Debug)]
pub enum Error {
    /// Local content is missing or unusable
    #[error("{0}")]
    Preflight(String),

    /// Bucket is missing or not accessible
    #[error("{message}")]
    Access { bucket: String, message: String },

    /// Bucket creation failed
    #[error("Create bucket '{bucket}' failed (AWS: {code})")]
    BucketCreate { bucket: String, code: String },

    /// A single object upload failed; nothing after it was attempted
    #[error("Upload failed for '{key}' (AWS: {code}) after {uploaded} file(s)")]
    Upload {
        key: String,
        code: String,
        uploaded: usize,
    },

    /// Bucket could not be locked private
    #[error("Could not lock bucket '{bucket}' during {action} (AWS: {code})")]
    Lockdown {
        bucket: String,
        action: &'static str,
        code: String,
    },

    /// Origin access control or distribution creation failed
    #[error("Could not create {resource} (AWS: {code})")]
    Provision {
        resource: &'static str,
        code: String,
    },

    /// Bucket policy could not be attached
    #[error("Could not set bucket policy on '{bucket}' (AWS: {code})")]
    Policy { bucket: String, code: String },

    /// Cache invalidation failed
    #[error("CloudFront invalidation failed for '{distribution_id}' (AWS: {code})")]
    Invalidation {
        distribution_id: String,
        code: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidConfig(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error
    #[error("Could not read content tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Name of the step that produced this error, for terminal output
    pub fn step(&self) -> &'static str {
        match self {
            Error::Preflight(_) => "preflight",
            Error::Access { .. } => "bucket access check",
            Error::BucketCreate { .. } => "bucket creation",
            Error::Upload { .. } => "upload",
            Error::Lockdown { .. } => "bucket lockdown",
            Error::Provision { .. } => "CDN provisioning",
            Error::Policy { .. } => "bucket policy",
            Error::Invalidation { .. } => "cache invalidation",
            Error::Config(_) | Error::ConfigNotFound(_) | Error::InvalidConfig(_) => {
                "configuration"
            }
            Error::InvalidInput(_) => "input validation",
            Error::Io(_) | Error::Walk(_) => "local IO",
            Error::Json(_) => "bucket policy",
        }
    }

    /// Process exit code for this error
    ///
    /// `2` when the operator has to fix their input, `1` for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Preflight(_)
            | Error::InvalidInput(_)
            | Error::Config(_)
            | Error::ConfigNotFound(_)
            | Error::InvalidConfig(_) => 2,
            _ => 1,
        }
    }
}

/// Broad class of a collaborator failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    NotFound,
    Forbidden,
    Other,
}

/// Failure reported by the storage or CDN service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    /// Raw service error code, e.g. `AccessDenied`
    pub code: String,
    pub message: String,
}

/// Codes the services use for "the thing you asked about does not exist"
const NOT_FOUND_CODES: &[&str] = &[
    "NotFound",
    "NoSuchBucket",
    "NoSuchBucketPolicy",
    "NoSuchWebsiteConfiguration",
    "NoSuchDistribution",
];

/// Codes for permission failures
const FORBIDDEN_CODES: &[&str] = &["AccessDenied", "Forbidden", "AllAccessDisabled"];

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::NotFound, code, "not found")
    }

    pub fn forbidden(code: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Forbidden, code, "access denied")
    }

    pub fn other(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Other, code, message)
    }

    /// Classify from the HTTP status and service code of a failed call
    ///
    /// A known code wins over the status; the status decides when the code
    /// is missing or unknown.
    pub fn classify(status: Option<u16>, code: Option<&str>, message: impl Into<String>) -> Self {
        let kind = match code {
            Some(c) if NOT_FOUND_CODES.contains(&c) => ServiceErrorKind::NotFound,
            Some(c) if FORBIDDEN_CODES.contains(&c) => ServiceErrorKind::Forbidden,
            _ => match status {
                Some(404) => ServiceErrorKind::NotFound,
                Some(403) => ServiceErrorKind::Forbidden,
                _ => ServiceErrorKind::Other,
            },
        };

        let code = match (code, status) {
            (Some(c), _) => c.to_string(),
            (None, Some(s)) => format!("HTTP{}", s),
            (None, None) => "ClientError".to_string(),
        };

        Self::new(kind, code, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ServiceErrorKind::NotFound
    }
}
