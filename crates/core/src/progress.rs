//! Progress notifications for whoever drives a deployment

use crate::deploy::Stage;
use crate::error::Error;
use crate::metadata::ContentItem;
use crate::provision::Distribution;

/// Receives deployment progress
///
/// All methods default to doing nothing.
pub trait Reporter: Send + Sync {
    fn stage(&self, _stage: Stage) {}

    /// One object landed in the bucket
    fn uploaded(&self, _item: &ContentItem) {}

    /// The distribution exists, whatever happens to the rest of the run
    fn distribution_created(&self, _distribution: &Distribution) {}

    fn invalidation_skipped(&self) {}

    fn aborted(&self, _stage: Stage, _error: &Error) {}
}

/// Reporter that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {}
