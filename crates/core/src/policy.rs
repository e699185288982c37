//! Bucket policy letting exactly one distribution read the bucket

use crate::error::{Error, Result};
use crate::provision::Distribution;
use crate::storage::ObjectStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

const POLICY_VERSION: &str = "2012-10-17";
const CLOUDFRONT_SERVICE: &str = "cloudfront.amazonaws.com";
const SOURCE_ARN_KEY: &str = "AWS:SourceArn";

/// IAM resource policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub sid: String,
    pub effect: String,
    pub principal: ServicePrincipal,
    pub action: String,
    pub resource: String,
    /// operator -> (key -> value)
    pub condition: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServicePrincipal {
    pub service: String,
}

impl PolicyDocument {
    /// `s3:GetObject` on every object, for CloudFront acting for `distribution_arn` only
    pub fn cloudfront_read_only(bucket: &str, distribution_arn: &str) -> Self {
        let mut string_equals = BTreeMap::new();
        string_equals.insert(SOURCE_ARN_KEY.to_string(), distribution_arn.to_string());

        let mut condition = BTreeMap::new();
        condition.insert("StringEquals".to_string(), string_equals);

        Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![PolicyStatement {
                sid: "AllowCloudFrontReadOnly".to_string(),
                effect: "Allow".to_string(),
                principal: ServicePrincipal {
                    service: CLOUDFRONT_SERVICE.to_string(),
                },
                action: "s3:GetObject".to_string(),
                resource: format!("arn:aws:s3:::{}/*", bucket),
                condition,
            }],
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Attach the read-only policy for `distribution` to `bucket`
pub async fn bind_trust_policy(
    store: &dyn ObjectStore,
    bucket: &str,
    distribution: &Distribution,
) -> Result<PolicyDocument> {
    let policy = PolicyDocument::cloudfront_read_only(bucket, &distribution.arn);
    let document = policy.to_json()?;

    store
        .put_bucket_policy(bucket, &document)
        .await
        .map_err(|e| Error::Policy {
            bucket: bucket.to_string(),
            code: e.code,
        })?;

    info!(bucket, distribution_arn = %distribution.arn, "bucket policy attached");
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::storage::MockObjectStore;
    use std::sync::{Arc, Mutex};

    const ARN: &str = "arn:aws:cloudfront::123456789012:distribution/E1DIST";

    fn distribution() -> Distribution {
        Distribution {
            id: "E1DIST".to_string(),
            domain_name: "d1.cloudfront.net".to_string(),
            arn: ARN.to_string(),
            origin_domain: "site.s3.eu-north-1.amazonaws.com".to_string(),
            cache_policy_id: "cache".to_string(),
            origin_request_policy_id: "origin".to_string(),
        }
    }

    #[test]
    fn test_policy_json_shape() {
        let json = PolicyDocument::cloudfront_read_only("site", ARN).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["Version"], "2012-10-17");
        let statements = value["Statement"].as_array().unwrap();
        assert_eq!(statements.len(), 1);

        let statement = &statements[0];
        assert_eq!(statement["Sid"], "AllowCloudFrontReadOnly");
        assert_eq!(statement["Effect"], "Allow");
        assert_eq!(statement["Principal"]["Service"], "cloudfront.amazonaws.com");
        assert_eq!(statement["Action"], "s3:GetObject");
        assert_eq!(statement["Resource"], "arn:aws:s3:::site/*");
        assert_eq!(statement["Condition"]["StringEquals"]["AWS:SourceArn"], ARN);
        assert_eq!(statement["Condition"].as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bind_attaches_policy_for_this_distribution() {
        let attached = Arc::new(Mutex::new(None));
        let captured = attached.clone();

        let mut store = MockObjectStore::new();
        store
            .expect_put_bucket_policy()
            .withf(|bucket, _| bucket == "site")
            .times(1)
            .returning(move |_, document| {
                *captured.lock().unwrap() = Some(document.to_string());
                Ok(())
            });

        let policy = bind_trust_policy(&store, "site", &distribution()).await.unwrap();

        let document = attached.lock().unwrap().clone().unwrap();
        let parsed: PolicyDocument = serde_json::from_str(&document).unwrap();
        assert_eq!(parsed, policy);
        assert_eq!(
            parsed.statement[0].condition["StringEquals"][SOURCE_ARN_KEY],
            ARN
        );
    }

    #[tokio::test]
    async fn test_bind_failure_is_policy_error() {
        let mut store = MockObjectStore::new();
        store
            .expect_put_bucket_policy()
            .returning(|_, _| Err(ServiceError::forbidden("AccessDenied")));

        let err = bind_trust_policy(&store, "site", &distribution()).await.unwrap_err();
        assert!(matches!(err, Error::Policy { ref code, .. } if code == "AccessDenied"));
    }
}
