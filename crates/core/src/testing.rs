//! In-memory storage and CDN fakes sharing one call log

use crate::cdn::{Cdn, CreatedDistribution, DistributionSpec, OriginAccessControlSpec};
use crate::error::ServiceError;
use crate::lockdown::AccessLockState;
use crate::storage::{BucketStatus, ObjectStore, ObjectUpload, PublicAccessBlock};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// One collaborator call, in the order it was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    HeadBucket(String),
    CreateBucket { bucket: String, region: String },
    PutObject {
        key: String,
        content_type: Option<String>,
        cache_control: Option<String>,
    },
    PutPublicAccessBlock(PublicAccessBlock),
    DeleteWebsiteConfig,
    DeleteBucketPolicy,
    PutBucketPolicy(String),
    CreateOriginAccessControl(OriginAccessControlSpec),
    CreateDistribution(DistributionSpec),
    CreateInvalidation {
        distribution_id: String,
        paths: Vec<String>,
        caller_reference: String,
    },
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<Call> {
    log.lock().unwrap().clone()
}

#[derive(Debug)]
struct BucketState {
    status: BucketStatus,
    objects: BTreeMap<String, ObjectUpload>,
    access_block: Option<PublicAccessBlock>,
    website: bool,
    policy: Option<String>,
}

/// Bucket that behaves like S3 for the calls we make
pub struct FakeStore {
    log: CallLog,
    state: Mutex<BucketState>,
    failures: Mutex<HashMap<&'static str, ServiceError>>,
    fail_put_at: Option<(usize, ServiceError)>,
    put_attempts: Mutex<usize>,
}

impl FakeStore {
    pub fn new(log: CallLog, status: BucketStatus) -> Self {
        Self {
            log,
            state: Mutex::new(BucketState {
                status,
                objects: BTreeMap::new(),
                access_block: None,
                website: false,
                policy: None,
            }),
            failures: Mutex::new(HashMap::new()),
            fail_put_at: None,
            put_attempts: Mutex::new(0),
        }
    }

    /// Bucket previously served as a public website
    pub fn with_public_website(self) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.website = true;
            state.policy = Some(r#"{"Statement":[{"Principal":"*"}]}"#.to_string());
        }
        self
    }

    /// Fail every call to `op` with `err`
    pub fn failing(self, op: &'static str, err: ServiceError) -> Self {
        self.failures.lock().unwrap().insert(op, err);
        self
    }

    /// Fail the `n`-th upload attempt (1-based)
    pub fn failing_upload_at(mut self, n: usize, err: ServiceError) -> Self {
        self.fail_put_at = Some((n, err));
        self
    }

    pub fn object_keys(&self) -> Vec<String> {
        self.state.lock().unwrap().objects.keys().cloned().collect()
    }

    pub fn object(&self, key: &str) -> Option<ObjectUpload> {
        self.state.lock().unwrap().objects.get(key).cloned()
    }

    pub fn policy(&self) -> Option<String> {
        self.state.lock().unwrap().policy.clone()
    }

    pub fn lock_state(&self) -> AccessLockState {
        let state = self.state.lock().unwrap();
        let blocked = state.access_block.map(|b| b.is_deny_all()).unwrap_or(false);
        if blocked && !state.website {
            AccessLockState::LockedPrivate
        } else {
            AccessLockState::PublicWritable
        }
    }

    fn record(&self, call: Call) {
        self.log.lock().unwrap().push(call);
    }

    fn check(&self, op: &'static str) -> Result<(), ServiceError> {
        match self.failures.lock().unwrap().get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn head_bucket(&self, bucket: &str) -> Result<BucketStatus, ServiceError> {
        self.record(Call::HeadBucket(bucket.to_string()));
        self.check("head_bucket")?;
        Ok(self.state.lock().unwrap().status)
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), ServiceError> {
        self.record(Call::CreateBucket {
            bucket: bucket.to_string(),
            region: region.to_string(),
        });
        self.check("create_bucket")?;
        self.state.lock().unwrap().status = BucketStatus::Exists;
        Ok(())
    }

    async fn put_object(&self, _bucket: &str, upload: ObjectUpload) -> Result<(), ServiceError> {
        self.record(Call::PutObject {
            key: upload.key.clone(),
            content_type: upload.content_type.clone(),
            cache_control: upload.cache_control.clone(),
        });

        let attempt = {
            let mut attempts = self.put_attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };
        if let Some((n, err)) = &self.fail_put_at {
            if *n == attempt {
                return Err(err.clone());
            }
        }
        self.check("put_object")?;

        self.state
            .lock()
            .unwrap()
            .objects
            .insert(upload.key.clone(), upload);
        Ok(())
    }

    async fn put_public_access_block(
        &self,
        _bucket: &str,
        config: PublicAccessBlock,
    ) -> Result<(), ServiceError> {
        self.record(Call::PutPublicAccessBlock(config));
        self.check("put_public_access_block")?;
        self.state.lock().unwrap().access_block = Some(config);
        Ok(())
    }

    async fn delete_website_config(&self, _bucket: &str) -> Result<(), ServiceError> {
        self.record(Call::DeleteWebsiteConfig);
        self.check("delete_website_config")?;
        let mut state = self.state.lock().unwrap();
        if !state.website {
            return Err(ServiceError::not_found("NoSuchWebsiteConfiguration"));
        }
        state.website = false;
        Ok(())
    }

    async fn delete_bucket_policy(&self, _bucket: &str) -> Result<(), ServiceError> {
        self.record(Call::DeleteBucketPolicy);
        self.check("delete_bucket_policy")?;
        let mut state = self.state.lock().unwrap();
        if state.policy.take().is_none() {
            return Err(ServiceError::not_found("NoSuchBucketPolicy"));
        }
        Ok(())
    }

    async fn put_bucket_policy(&self, _bucket: &str, document: &str) -> Result<(), ServiceError> {
        self.record(Call::PutBucketPolicy(document.to_string()));
        self.check("put_bucket_policy")?;
        self.state.lock().unwrap().policy = Some(document.to_string());
        Ok(())
    }
}

pub const FAKE_DISTRIBUTION_ID: &str = "E1FAKEDIST";
pub const FAKE_DISTRIBUTION_DOMAIN: &str = "d111111abcdef8.cloudfront.net";
pub const FAKE_DISTRIBUTION_ARN: &str =
    "arn:aws:cloudfront::123456789012:distribution/E1FAKEDIST";
pub const FAKE_OAC_ID: &str = "E2FAKEOAC";

/// CDN that hands out fixed identifiers
pub struct FakeCdn {
    log: CallLog,
    failures: Mutex<HashMap<&'static str, ServiceError>>,
}

impl FakeCdn {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn failing(self, op: &'static str, err: ServiceError) -> Self {
        self.failures.lock().unwrap().insert(op, err);
        self
    }

    fn record(&self, call: Call) {
        self.log.lock().unwrap().push(call);
    }

    fn check(&self, op: &'static str) -> Result<(), ServiceError> {
        match self.failures.lock().unwrap().get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Cdn for FakeCdn {
    async fn create_origin_access_control(
        &self,
        spec: OriginAccessControlSpec,
    ) -> Result<String, ServiceError> {
        self.record(Call::CreateOriginAccessControl(spec));
        self.check("create_origin_access_control")?;
        Ok(FAKE_OAC_ID.to_string())
    }

    async fn create_distribution(
        &self,
        spec: DistributionSpec,
    ) -> Result<CreatedDistribution, ServiceError> {
        self.record(Call::CreateDistribution(spec));
        self.check("create_distribution")?;
        Ok(CreatedDistribution {
            id: FAKE_DISTRIBUTION_ID.to_string(),
            domain_name: FAKE_DISTRIBUTION_DOMAIN.to_string(),
            arn: FAKE_DISTRIBUTION_ARN.to_string(),
        })
    }

    async fn create_invalidation(
        &self,
        distribution_id: &str,
        paths: Vec<String>,
        caller_reference: &str,
    ) -> Result<(), ServiceError> {
        self.record(Call::CreateInvalidation {
            distribution_id: distribution_id.to_string(),
            paths,
            caller_reference: caller_reference.to_string(),
        });
        self.check("create_invalidation")
    }
}

/// Write `files` under a fresh temporary directory
pub fn site_tree(files: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for file in files {
        let path = dir.path().join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, format!("<!-- {} -->", file)).unwrap();
    }
    dir
}
