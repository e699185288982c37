//! Origin access control and distribution creation

use crate::cdn::{Cdn, DistributionSpec, OriginAccessControlSpec};
use crate::clock::Clock;
use crate::config::DeployConfig;
use crate::error::{Error, Result};
use tracing::info;

/// CDN identity allowed to sign requests to the private bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginAccessControl {
    pub id: String,
}

/// A distribution created by this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub id: String,
    pub domain_name: String,
    pub arn: String,
    pub origin_domain: String,
    pub cache_policy_id: String,
    pub origin_request_policy_id: String,
}

impl Distribution {
    pub fn url(&self) -> String {
        format!("https://{}/", self.domain_name)
    }
}

/// Creates the CDN side of a new site
pub struct CdnProvisioner<'a> {
    cdn: &'a dyn Cdn,
    clock: &'a dyn Clock,
    config: &'a DeployConfig,
}

impl<'a> CdnProvisioner<'a> {
    pub fn new(cdn: &'a dyn Cdn, clock: &'a dyn Clock, config: &'a DeployConfig) -> Self {
        Self { cdn, clock, config }
    }

    /// Regional endpoint the distribution reads from
    pub fn origin_domain(&self, bucket: &str) -> String {
        format!("{}.s3.{}.amazonaws.com", bucket, self.config.aws.region)
    }

    /// OAC first: the distribution's origin has to name an existing identity
    pub async fn provision(&self, bucket: &str) -> Result<Distribution> {
        let oac = self.create_origin_access_control().await?;
        self.create_distribution(bucket, &oac).await
    }

    pub async fn create_origin_access_control(&self) -> Result<OriginAccessControl> {
        let spec = OriginAccessControlSpec {
            name: self.clock.token("oac-s3"),
            description: "OAC for private S3 origin".to_string(),
        };

        let id = self
            .cdn
            .create_origin_access_control(spec)
            .await
            .map_err(|e| Error::Provision {
                resource: "origin access control",
                code: e.code,
            })?;

        info!(oac_id = %id, "origin access control created");
        Ok(OriginAccessControl { id })
    }

    pub fn distribution_spec(&self, bucket: &str, oac: &OriginAccessControl) -> DistributionSpec {
        DistributionSpec {
            caller_reference: self.clock.token(&format!("deploy-{}", bucket)),
            comment: format!("Secure static site for {}", bucket),
            origin_id: format!("S3-{}", bucket),
            origin_domain: self.origin_domain(bucket),
            origin_access_control_id: oac.id.clone(),
            default_root_object: self.config.site.entry_document.clone(),
            cache_policy_id: self.config.cdn.cache_policy_id.clone(),
            origin_request_policy_id: self.config.cdn.origin_request_policy_id.clone(),
            price_class: self.config.cdn.price_class.clone(),
        }
    }

    pub async fn create_distribution(
        &self,
        bucket: &str,
        oac: &OriginAccessControl,
    ) -> Result<Distribution> {
        let spec = self.distribution_spec(bucket, oac);
        let origin_domain = spec.origin_domain.clone();

        let created = self
            .cdn
            .create_distribution(spec)
            .await
            .map_err(|e| Error::Provision {
                resource: "CloudFront distribution",
                code: e.code,
            })?;

        info!(
            distribution_id = %created.id,
            domain = %created.domain_name,
            "distribution created"
        );

        Ok(Distribution {
            id: created.id,
            domain_name: created.domain_name,
            arn: created.arn,
            origin_domain,
            cache_policy_id: self.config.cdn.cache_policy_id.clone(),
            origin_request_policy_id: self.config.cdn.origin_request_policy_id.clone(),
        })
    }
}
