//! Forces a bucket private before a CDN fronts it

use crate::error::{Error, Result, ServiceError};
use crate::storage::{ObjectStore, PublicAccessBlock};
use tracing::{debug, info};

/// Conceptual access state of a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLockState {
    PublicWritable,
    LockedPrivate,
}

/// Block all public access, then drop website hosting and any old policy
///
/// Safe to repeat: a bucket that is already locked comes out unchanged.
pub async fn lock_bucket(store: &dyn ObjectStore, bucket: &str) -> Result<AccessLockState> {
    store
        .put_public_access_block(bucket, PublicAccessBlock::deny_all())
        .await
        .map_err(|e| lockdown_error(bucket, "public access block", e))?;

    tolerate_missing(
        store.delete_website_config(bucket).await,
        bucket,
        "website removal",
    )?;

    tolerate_missing(
        store.delete_bucket_policy(bucket).await,
        bucket,
        "policy removal",
    )?;

    info!(bucket, "bucket locked private");
    Ok(AccessLockState::LockedPrivate)
}

/// "Nothing to delete" is success, anything else aborts
fn tolerate_missing(
    result: std::result::Result<(), ServiceError>,
    bucket: &str,
    action: &'static str,
) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => {
            debug!(bucket, action, code = %e.code, "nothing to remove");
            Ok(())
        }
        Err(e) => Err(lockdown_error(bucket, action, e)),
    }
}

fn lockdown_error(bucket: &str, action: &'static str, err: ServiceError) -> Error {
    Error::Lockdown {
        bucket: bucket.to_string(),
        action,
        code: err.code,
    }
}
