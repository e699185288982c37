//! Bucket name rules, access checks and creation

use crate::error::{Error, Result};
use crate::storage::{BucketStatus, ObjectStore};
use tracing::info;

/// Storage destination of a deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketTarget {
    pub name: String,
    pub region: String,
    /// Whether this run created the bucket
    pub created: bool,
}

/// Check a name against the S3 naming rules for new buckets
pub fn validate_bucket_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput("Bucket name is required".to_string()));
    }

    if name.contains('_') || name.to_lowercase() != name {
        return Err(Error::InvalidInput(
            "Bucket name must be lowercase and contain no underscores".to_string(),
        ));
    }

    if name.len() < 3 || name.len() > 63 {
        return Err(Error::InvalidInput(
            "Bucket name must be between 3 and 63 characters".to_string(),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(Error::InvalidInput(
            "Bucket name can only contain lowercase letters, digits, hyphens, and dots".to_string(),
        ));
    }

    let edge_ok = |c: Option<char>| c.map(|c| c.is_ascii_alphanumeric()).unwrap_or(false);
    if !edge_ok(name.chars().next()) || !edge_ok(name.chars().last()) {
        return Err(Error::InvalidInput(
            "Bucket name must start and end with a letter or digit".to_string(),
        ));
    }

    if name.contains("..") {
        return Err(Error::InvalidInput(
            "Bucket name cannot contain two adjacent dots".to_string(),
        ));
    }

    Ok(())
}

/// The bucket must already exist and be ours
pub async fn check_access(store: &dyn ObjectStore, bucket: &str) -> Result<()> {
    let status = store.head_bucket(bucket).await.map_err(|e| Error::Access {
        bucket: bucket.to_string(),
        message: format!(
            "Could not access the bucket (AWS: {}). Check name and permissions.",
            e.code
        ),
    })?;

    match status {
        BucketStatus::Exists => Ok(()),
        BucketStatus::NotFound => Err(Error::Access {
            bucket: bucket.to_string(),
            message: "Bucket not found (404). Check the bucket name.".to_string(),
        }),
        BucketStatus::Forbidden => Err(Error::Access {
            bucket: bucket.to_string(),
            message: "Bucket exists but you don't have access (403). Check your AWS credentials/permissions."
                .to_string(),
        }),
    }
}

/// Reuse the bucket when it is ours, create it when it does not exist
pub async fn ensure_bucket(
    store: &dyn ObjectStore,
    bucket: &str,
    region: &str,
) -> Result<BucketTarget> {
    match bucket_status(store, bucket).await? {
        BucketStatus::Exists => Ok(BucketTarget {
            name: bucket.to_string(),
            region: region.to_string(),
            created: false,
        }),
        BucketStatus::NotFound => create(store, bucket, region).await,
        BucketStatus::Forbidden => Err(name_taken(bucket)),
    }
}

/// Create a bucket that must not exist yet
pub async fn create_new_bucket(
    store: &dyn ObjectStore,
    bucket: &str,
    region: &str,
) -> Result<BucketTarget> {
    validate_bucket_name(bucket)?;

    match bucket_status(store, bucket).await? {
        BucketStatus::NotFound => create(store, bucket, region).await,
        BucketStatus::Exists => Err(Error::Access {
            bucket: bucket.to_string(),
            message: "Bucket already exists.".to_string(),
        }),
        BucketStatus::Forbidden => Err(name_taken(bucket)),
    }
}

async fn bucket_status(store: &dyn ObjectStore, bucket: &str) -> Result<BucketStatus> {
    store.head_bucket(bucket).await.map_err(|e| Error::Access {
        bucket: bucket.to_string(),
        message: format!("Unexpected error checking bucket (AWS: {}).", e.code),
    })
}

async fn create(store: &dyn ObjectStore, bucket: &str, region: &str) -> Result<BucketTarget> {
    validate_bucket_name(bucket)?;

    store
        .create_bucket(bucket, region)
        .await
        .map_err(|e| Error::BucketCreate {
            bucket: bucket.to_string(),
            code: e.code,
        })?;

    info!(bucket, region, "bucket created");
    Ok(BucketTarget {
        name: bucket.to_string(),
        region: region.to_string(),
        created: true,
    })
}

fn name_taken(bucket: &str) -> Error {
    Error::Access {
        bucket: bucket.to_string(),
        message: "Bucket name already taken. Choose another.".to_string(),
    }
}
