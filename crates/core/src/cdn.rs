//! CDN collaborator and its CloudFront implementation

use crate::error::ServiceError;
use crate::storage::service_error;
use async_trait::async_trait;
use aws_sdk_cloudfront::{
    error::BuildError,
    types::{
        AllowedMethods, CachedMethods, DefaultCacheBehavior, DistributionConfig, HttpVersion,
        InvalidationBatch, Method, OriginAccessControlConfig, OriginAccessControlOriginTypes,
        OriginAccessControlSigningBehaviors, OriginAccessControlSigningProtocols, Origin, Origins,
        Paths, PriceClass, S3OriginConfig, ViewerCertificate, ViewerProtocolPolicy,
    },
    Client,
};

#[cfg(test)]
use mockall::automock;

/// Origin access control request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginAccessControlSpec {
    pub name: String,
    pub description: String,
}

/// Distribution request: one private S3 origin behind HTTPS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionSpec {
    pub caller_reference: String,
    pub comment: String,
    pub origin_id: String,
    pub origin_domain: String,
    pub origin_access_control_id: String,
    pub default_root_object: String,
    pub cache_policy_id: String,
    pub origin_request_policy_id: String,
    pub price_class: String,
}

/// Identity of a created distribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedDistribution {
    pub id: String,
    pub domain_name: String,
    pub arn: String,
}

/// CDN operations the deployment needs
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Cdn: Send + Sync {
    /// Returns the new identity's id
    async fn create_origin_access_control(
        &self,
        spec: OriginAccessControlSpec,
    ) -> Result<String, ServiceError>;

    async fn create_distribution(
        &self,
        spec: DistributionSpec,
    ) -> Result<CreatedDistribution, ServiceError>;

    async fn create_invalidation(
        &self,
        distribution_id: &str,
        paths: Vec<String>,
        caller_reference: &str,
    ) -> Result<(), ServiceError>;
}

/// CloudFront client
pub struct CloudFrontCdn {
    client: Client,
}

impl CloudFrontCdn {
    /// CloudFront is global but its control plane answers in one region
    pub fn new(sdk_config: &aws_config::SdkConfig, region: &str) -> Self {
        let config = aws_sdk_cloudfront::config::Builder::from(sdk_config)
            .region(aws_sdk_cloudfront::config::Region::new(region.to_string()))
            .build();

        Self {
            client: Client::from_conf(config),
        }
    }
}

fn build_error(err: BuildError) -> ServiceError {
    ServiceError::other("InvalidRequest", err.to_string())
}

fn read_only_methods() -> Vec<Method> {
    vec![Method::Get, Method::Head]
}

fn distribution_config(spec: DistributionSpec) -> Result<DistributionConfig, BuildError> {
    let origin = Origin::builder()
        .id(&spec.origin_id)
        .domain_name(spec.origin_domain)
        .origin_access_control_id(spec.origin_access_control_id)
        // OAC origins still need an empty legacy identity
        .s3_origin_config(S3OriginConfig::builder().origin_access_identity("").build())
        .build()?;

    let allowed_methods = AllowedMethods::builder()
        .quantity(2)
        .set_items(Some(read_only_methods()))
        .cached_methods(
            CachedMethods::builder()
                .quantity(2)
                .set_items(Some(read_only_methods()))
                .build()?,
        )
        .build()?;

    let cache_behavior = DefaultCacheBehavior::builder()
        .target_origin_id(spec.origin_id)
        .viewer_protocol_policy(ViewerProtocolPolicy::RedirectToHttps)
        .compress(true)
        .allowed_methods(allowed_methods)
        .cache_policy_id(spec.cache_policy_id)
        .origin_request_policy_id(spec.origin_request_policy_id)
        .build()?;

    DistributionConfig::builder()
        .caller_reference(spec.caller_reference)
        .comment(spec.comment)
        .enabled(true)
        .default_root_object(spec.default_root_object)
        .http_version(HttpVersion::Http2and3)
        .price_class(PriceClass::from(spec.price_class.as_str()))
        .is_ipv6_enabled(true)
        .viewer_certificate(
            ViewerCertificate::builder()
                .cloud_front_default_certificate(true)
                .build(),
        )
        .origins(Origins::builder().quantity(1).items(origin).build()?)
        .default_cache_behavior(cache_behavior)
        .build()
}

#[async_trait]
impl Cdn for CloudFrontCdn {
    async fn create_origin_access_control(
        &self,
        spec: OriginAccessControlSpec,
    ) -> Result<String, ServiceError> {
        let config = OriginAccessControlConfig::builder()
            .name(spec.name)
            .description(spec.description)
            .signing_protocol(OriginAccessControlSigningProtocols::Sigv4)
            .signing_behavior(OriginAccessControlSigningBehaviors::Always)
            .origin_access_control_origin_type(OriginAccessControlOriginTypes::S3)
            .build()
            .map_err(build_error)?;

        let response = self
            .client
            .create_origin_access_control()
            .origin_access_control_config(config)
            .send()
            .await
            .map_err(service_error)?;

        response
            .origin_access_control()
            .map(|oac| oac.id().to_string())
            .ok_or_else(|| ServiceError::other("MissingResponse", "no origin access control returned"))
    }

    async fn create_distribution(
        &self,
        spec: DistributionSpec,
    ) -> Result<CreatedDistribution, ServiceError> {
        let config = distribution_config(spec).map_err(build_error)?;

        let response = self
            .client
            .create_distribution()
            .distribution_config(config)
            .send()
            .await
            .map_err(service_error)?;

        let distribution = response
            .distribution()
            .ok_or_else(|| ServiceError::other("MissingResponse", "no distribution returned"))?;

        Ok(CreatedDistribution {
            id: distribution.id().to_string(),
            domain_name: distribution.domain_name().to_string(),
            arn: distribution.arn().to_string(),
        })
    }

    async fn create_invalidation(
        &self,
        distribution_id: &str,
        paths: Vec<String>,
        caller_reference: &str,
    ) -> Result<(), ServiceError> {
        let batch = InvalidationBatch::builder()
            .paths(
                Paths::builder()
                    .quantity(paths.len() as i32)
                    .set_items(Some(paths))
                    .build()
                    .map_err(build_error)?,
            )
            .caller_reference(caller_reference)
            .build()
            .map_err(build_error)?;

        self.client
            .create_invalidation()
            .distribution_id(distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(service_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> DistributionSpec {
        DistributionSpec {
            caller_reference: "deploy-site-1".to_string(),
            comment: "Secure static site for site".to_string(),
            origin_id: "S3-site".to_string(),
            origin_domain: "site.s3.eu-north-1.amazonaws.com".to_string(),
            origin_access_control_id: "E2OAC".to_string(),
            default_root_object: "index.html".to_string(),
            cache_policy_id: crate::config::CACHE_POLICY_CACHING_OPTIMIZED.to_string(),
            origin_request_policy_id: crate::config::ORIGIN_REQUEST_POLICY_CORS_S3.to_string(),
            price_class: "PriceClass_100".to_string(),
        }
    }

    #[test]
    fn test_distribution_config_builds() {
        assert!(distribution_config(spec()).is_ok());
    }

    #[test]
    fn test_distribution_config_unknown_price_class_still_builds() {
        // Unknown values pass through for the service to reject
        let mut spec = spec();
        spec.price_class = "PriceClass_Future".to_string();
        assert!(distribution_config(spec).is_ok());
    }
}
