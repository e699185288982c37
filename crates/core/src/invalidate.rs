//! Full cache invalidation

use crate::cdn::Cdn;
use crate::clock::Clock;
use crate::error::{Error, Result};
use tracing::info;

/// Every object behind the distribution
pub const INVALIDATE_ALL: &str = "/*";

/// A submitted invalidation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationRequest {
    pub caller_reference: String,
    pub paths: Vec<String>,
}

/// What happened to the invalidation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationOutcome {
    Submitted(InvalidationRequest),
    /// No distribution id was given
    Skipped,
}

/// Invalidate `/*` on `distribution_id`
///
/// The caller reference is `<prefix>-<token>` so repeated runs never collide.
pub async fn invalidate_all(
    cdn: &dyn Cdn,
    clock: &dyn Clock,
    distribution_id: &str,
    prefix: &str,
) -> Result<InvalidationRequest> {
    let request = InvalidationRequest {
        caller_reference: clock.token(prefix),
        paths: vec![INVALIDATE_ALL.to_string()],
    };

    cdn.create_invalidation(
        distribution_id,
        request.paths.clone(),
        &request.caller_reference,
    )
    .await
    .map_err(|e| Error::Invalidation {
        distribution_id: distribution_id.to_string(),
        code: e.code,
    })?;

    info!(distribution_id, caller_reference = %request.caller_reference, "invalidation sent");
    Ok(request)
}
