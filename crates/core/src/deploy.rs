//! Deployment orchestration
//!
//! Two flows share one fail-fast sequence:
//!
//! - **Redeploy**: preflight, upload, then invalidate when a distribution id
//!   is known.
//! - **Provision**: preflight (creating the bucket when absent), upload, lock
//!   the bucket private, create the CDN, bind the bucket policy, invalidate.
//!
//! The first failing step ends the run. Nothing is retried or rolled back.

use crate::bucket::{check_access, ensure_bucket, BucketTarget};
use crate::cdn::Cdn;
use crate::clock::Clock;
use crate::config::DeployConfig;
use crate::content::ContentRoot;
use crate::error::{Error, Result};
use crate::invalidate::{invalidate_all, InvalidationOutcome};
use crate::lockdown::{lock_bucket, AccessLockState};
use crate::metadata::MetadataResolver;
use crate::policy::{bind_trust_policy, PolicyDocument};
use crate::progress::{Reporter, SilentReporter};
use crate::provision::{CdnProvisioner, Distribution};
use crate::storage::ObjectStore;
use crate::sync::sync_content;
use std::fmt;
use tracing::{error, info};

/// Caller-reference prefix for invalidations sent by a redeploy
const REDEPLOY_PREFIX: &str = "redeploy";
/// Caller-reference prefix for the invalidation closing a provisioning run
const PROVISION_PREFIX: &str = "inval";

/// Where a deployment run is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Preflight,
    Syncing,
    Locking,
    ProvisioningCdn,
    BindingPolicy,
    Invalidating,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Preflight => "preflight",
            Stage::Syncing => "upload",
            Stage::Locking => "bucket lockdown",
            Stage::ProvisioningCdn => "CDN provisioning",
            Stage::BindingPolicy => "bucket policy",
            Stage::Invalidating => "cache invalidation",
            Stage::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// Which flow to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployMode {
    /// Upload to an existing bucket; invalidate when an id is given
    Redeploy { distribution_id: Option<String> },
    /// First-time hosting behind a new private distribution
    Provision,
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct DeployReport {
    pub bucket: BucketTarget,
    pub uploaded: usize,
    /// Stages entered, in order, ending with `Done`
    pub stages: Vec<Stage>,
    pub lock_state: Option<AccessLockState>,
    pub distribution: Option<Distribution>,
    pub policy: Option<PolicyDocument>,
    pub invalidation: InvalidationOutcome,
}

impl DeployReport {
    /// Public URL of the site, when this run created the distribution
    pub fn site_url(&self) -> Option<String> {
        self.distribution.as_ref().map(Distribution::url)
    }
}

/// Runs deployments against a storage service and a CDN
pub struct Deployer<'a> {
    store: &'a dyn ObjectStore,
    cdn: &'a dyn Cdn,
    clock: &'a dyn Clock,
    config: &'a DeployConfig,
    reporter: &'a dyn Reporter,
}

impl<'a> Deployer<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        cdn: &'a dyn Cdn,
        clock: &'a dyn Clock,
        config: &'a DeployConfig,
    ) -> Self {
        Self {
            store,
            cdn,
            clock,
            config,
            reporter: &SilentReporter,
        }
    }

    pub fn with_reporter(mut self, reporter: &'a dyn Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Deploy `root` to `bucket`
    ///
    /// On failure the reporter hears which stage aborted before the error is
    /// returned.
    pub async fn run(
        &self,
        root: &ContentRoot,
        bucket: &str,
        mode: &DeployMode,
    ) -> Result<DeployReport> {
        let mut stages = Vec::new();

        match self.execute(root, bucket, mode, &mut stages).await {
            Ok(report) => Ok(report),
            Err(e) => {
                let stage = stages.last().copied().unwrap_or(Stage::Idle);
                error!(%stage, step = e.step(), error = %e, "deployment aborted");
                self.reporter.aborted(stage, &e);
                Err(e)
            }
        }
    }

    fn enter(&self, stages: &mut Vec<Stage>, stage: Stage) {
        info!(%stage, "entering stage");
        stages.push(stage);
        self.reporter.stage(stage);
    }

    async fn execute(
        &self,
        root: &ContentRoot,
        bucket: &str,
        mode: &DeployMode,
        stages: &mut Vec<Stage>,
    ) -> Result<DeployReport> {
        let region = self.config.aws.region.as_str();

        self.enter(stages, Stage::Preflight);
        root.preflight()?;
        if bucket.trim().is_empty() {
            return Err(Error::InvalidInput("Bucket name is required".to_string()));
        }
        let target = match mode {
            DeployMode::Redeploy { .. } => {
                check_access(self.store, bucket).await?;
                BucketTarget {
                    name: bucket.to_string(),
                    region: region.to_string(),
                    created: false,
                }
            }
            DeployMode::Provision => ensure_bucket(self.store, bucket, region).await?,
        };

        self.enter(stages, Stage::Syncing);
        let resolver = MetadataResolver::for_entry_document(root.entry_document());
        let uploaded = sync_content(self.store, bucket, root, &resolver, self.reporter).await?;

        let mut report = DeployReport {
            bucket: target,
            uploaded,
            stages: Vec::new(),
            lock_state: None,
            distribution: None,
            policy: None,
            invalidation: InvalidationOutcome::Skipped,
        };

        match mode {
            DeployMode::Redeploy { distribution_id } => {
                let distribution_id = distribution_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty());

                match distribution_id {
                    Some(id) => {
                        self.enter(stages, Stage::Invalidating);
                        let request =
                            invalidate_all(self.cdn, self.clock, id, REDEPLOY_PREFIX).await?;
                        report.invalidation = InvalidationOutcome::Submitted(request);
                    }
                    None => {
                        info!("no distribution id, skipping invalidation");
                        self.reporter.invalidation_skipped();
                    }
                }
            }
            DeployMode::Provision => {
                self.enter(stages, Stage::Locking);
                report.lock_state = Some(lock_bucket(self.store, bucket).await?);

                self.enter(stages, Stage::ProvisioningCdn);
                let distribution = CdnProvisioner::new(self.cdn, self.clock, self.config)
                    .provision(bucket)
                    .await?;
                self.reporter.distribution_created(&distribution);

                self.enter(stages, Stage::BindingPolicy);
                report.policy = Some(bind_trust_policy(self.store, bucket, &distribution).await?);

                self.enter(stages, Stage::Invalidating);
                let request =
                    invalidate_all(self.cdn, self.clock, &distribution.id, PROVISION_PREFIX)
                        .await?;
                report.invalidation = InvalidationOutcome::Submitted(request);
                report.distribution = Some(distribution);
            }
        }

        self.enter(stages, Stage::Done);
        report.stages = stages.clone();
        Ok(report)
    }
}
