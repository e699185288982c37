//! Object storage collaborator and its S3 implementation

use crate::config::DeployConfig;
use crate::error::{ServiceError, ServiceErrorKind};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::http::HttpResponse,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration, PublicAccessBlockConfiguration},
    Client,
};

#[cfg(test)]
use mockall::automock;

/// Outcome of a bucket existence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    Exists,
    NotFound,
    /// The bucket exists but belongs to someone else or we lack permission
    Forbidden,
}

/// One object write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUpload {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
}

/// Public access block flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicAccessBlock {
    pub block_public_acls: bool,
    pub ignore_public_acls: bool,
    pub block_public_policy: bool,
    pub restrict_public_buckets: bool,
}

impl PublicAccessBlock {
    /// Every public access vector denied
    pub const fn deny_all() -> Self {
        Self {
            block_public_acls: true,
            ignore_public_acls: true,
            block_public_policy: true,
            restrict_public_buckets: true,
        }
    }

    pub fn is_deny_all(&self) -> bool {
        *self == Self::deny_all()
    }
}

/// Storage operations the deployment needs
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn head_bucket(&self, bucket: &str) -> Result<BucketStatus, ServiceError>;

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), ServiceError>;

    async fn put_object(&self, bucket: &str, upload: ObjectUpload) -> Result<(), ServiceError>;

    async fn put_public_access_block(
        &self,
        bucket: &str,
        config: PublicAccessBlock,
    ) -> Result<(), ServiceError>;

    /// Fails with a `NotFound` kind when no website configuration exists
    async fn delete_website_config(&self, bucket: &str) -> Result<(), ServiceError>;

    /// Fails with a `NotFound` kind when no policy exists
    async fn delete_bucket_policy(&self, bucket: &str) -> Result<(), ServiceError>;

    async fn put_bucket_policy(&self, bucket: &str, document: &str) -> Result<(), ServiceError>;
}

/// S3 client for a single region
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Create a new S3 store from a loaded SDK configuration
    ///
    /// Requests go to the configured regional endpoint so bucket calls never
    /// bounce through the global one.
    pub fn new(sdk_config: &aws_config::SdkConfig, config: &DeployConfig) -> Self {
        Self {
            client: Client::from_conf(client_config(sdk_config, config)),
        }
    }
}

fn client_config(sdk_config: &aws_config::SdkConfig, config: &DeployConfig) -> aws_sdk_s3::Config {
    aws_sdk_s3::config::Builder::from(sdk_config)
        .region(aws_sdk_s3::config::Region::new(config.aws.region.clone()))
        .endpoint_url(config.storage_endpoint())
        .build()
}

/// Translate an SDK failure into a classified service error
///
/// Every AWS SDK crate shares the same `SdkError`, so the CDN adapter uses
/// this too.
pub(crate) fn service_error<E>(err: SdkError<E, HttpResponse>) -> ServiceError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = err.code().map(str::to_string);
    ServiceError::classify(status, code.as_deref(), DisplayErrorContext(&err).to_string())
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn head_bucket(&self, bucket: &str) -> Result<BucketStatus, ServiceError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(BucketStatus::Exists),
            Err(e) => {
                // HEAD responses carry no body, so the status is all we get
                let err = service_error(e);
                match err.kind {
                    ServiceErrorKind::NotFound => Ok(BucketStatus::NotFound),
                    ServiceErrorKind::Forbidden => Ok(BucketStatus::Forbidden),
                    ServiceErrorKind::Other => Err(err),
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), ServiceError> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 is the default location and rejects an explicit constraint
        if region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        request.send().await.map_err(service_error)?;
        Ok(())
    }

    async fn put_object(&self, bucket: &str, upload: ObjectUpload) -> Result<(), ServiceError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(upload.key)
            .body(ByteStream::from(upload.body))
            .set_content_type(upload.content_type)
            .set_cache_control(upload.cache_control)
            .send()
            .await
            .map_err(service_error)?;

        Ok(())
    }

    async fn put_public_access_block(
        &self,
        bucket: &str,
        config: PublicAccessBlock,
    ) -> Result<(), ServiceError> {
        let block = PublicAccessBlockConfiguration::builder()
            .block_public_acls(config.block_public_acls)
            .ignore_public_acls(config.ignore_public_acls)
            .block_public_policy(config.block_public_policy)
            .restrict_public_buckets(config.restrict_public_buckets)
            .build();

        self.client
            .put_public_access_block()
            .bucket(bucket)
            .public_access_block_configuration(block)
            .send()
            .await
            .map_err(service_error)?;

        Ok(())
    }

    async fn delete_website_config(&self, bucket: &str) -> Result<(), ServiceError> {
        self.client
            .delete_bucket_website()
            .bucket(bucket)
            .send()
            .await
            .map_err(service_error)?;

        Ok(())
    }

    async fn delete_bucket_policy(&self, bucket: &str) -> Result<(), ServiceError> {
        self.client
            .delete_bucket_policy()
            .bucket(bucket)
            .send()
            .await
            .map_err(service_error)?;

        Ok(())
    }

    async fn put_bucket_policy(&self, bucket: &str, document: &str) -> Result<(), ServiceError> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(document)
            .send()
            .await
            .map_err(service_error)?;

        Ok(())
    }
}
