//! Property parsing and validation shared by the credentials builders

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::credentials::{keys, ConnectionProperties, InvalidProperty};
use crate::domain::remote::StsTarget;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const GLOBAL_STS_ENDPOINT: &str = "https://sts.amazonaws.com";

/// Allow-list token expanding to every AWS STS endpoint
pub const ALL_AWS_ENDPOINTS_TOKEN: &str = "[aws]";

/// GetSessionToken bounds, in seconds
pub const MIN_SESSION_DURATION: i32 = 900;
pub const MAX_SESSION_DURATION: i32 = 129_600;

/// AssumeRole bounds, in seconds
pub const MIN_ROLE_SESSION_DURATION: i32 = 900;
pub const MAX_ROLE_SESSION_DURATION: i32 = 43_200;

static REGION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2}(-gov|-iso|-isob)?-[a-z]+-\d+$").unwrap());

static AWS_STS_ENDPOINT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://sts(\.[a-z]{2}(-gov|-iso|-isob)?-[a-z]+-\d+)?\.amazonaws\.com(\.cn)?$")
        .unwrap()
});

static SESSION_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w+=,.@-]{2,64}$").unwrap());

pub fn is_valid_region(region: &str) -> bool {
    REGION_PATTERN.is_match(region)
}

pub fn is_valid_session_name(name: &str) -> bool {
    SESSION_NAME_PATTERN.is_match(name)
}

/// Which STS endpoints a connection may point at
#[derive(Debug, Clone, Default)]
pub struct StsEndpointPolicy {
    allowlist: Vec<String>,
}

impl StsEndpointPolicy {
    /// An empty allow-list means every AWS STS endpoint
    pub fn new(allowlist: Vec<String>) -> Self {
        Self {
            allowlist: allowlist
                .into_iter()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn is_allowed(&self, url: &str) -> bool {
        if self.allowlist.is_empty() {
            return AWS_STS_ENDPOINT_PATTERN.is_match(url);
        }

        self.allowlist.iter().any(|allowed| {
            if allowed == ALL_AWS_ENDPOINTS_TOKEN {
                AWS_STS_ENDPOINT_PATTERN.is_match(url)
            } else {
                allowed == url
            }
        })
    }
}

/// Region and endpoint handling common to every credentials type
#[derive(Debug, Clone)]
pub struct StsSettings {
    default_region: String,
    endpoint_policy: StsEndpointPolicy,
}

impl Default for StsSettings {
    fn default() -> Self {
        Self::new(DEFAULT_REGION, StsEndpointPolicy::default())
    }
}

impl StsSettings {
    pub fn new(default_region: impl Into<String>, endpoint_policy: StsEndpointPolicy) -> Self {
        Self {
            default_region: default_region.into(),
            endpoint_policy,
        }
    }

    pub fn default_region(&self) -> &str {
        &self.default_region
    }

    pub fn region<'a>(&'a self, properties: &'a ConnectionProperties) -> &'a str {
        properties
            .non_blank(keys::REGION)
            .unwrap_or(&self.default_region)
    }

    pub fn target(&self, properties: &ConnectionProperties) -> StsTarget {
        StsTarget::new(
            self.region(properties),
            properties.non_blank(keys::STS_ENDPOINT).map(str::to_string),
        )
    }

    pub fn validate(&self, properties: &ConnectionProperties) -> Vec<InvalidProperty> {
        let mut invalid = Vec::new();

        if let Some(region) = properties.non_blank(keys::REGION) {
            if !is_valid_region(region) {
                invalid.push(InvalidProperty::new(
                    keys::REGION,
                    format!("The region {region} is not a valid AWS region"),
                ));
            }
        }

        if let Some(endpoint) = properties.non_blank(keys::STS_ENDPOINT) {
            if !self.endpoint_policy.is_allowed(endpoint) {
                invalid.push(InvalidProperty::new(
                    keys::STS_ENDPOINT,
                    "The STS endpoint is not a valid URL or is not allowed, please, provide a valid URL",
                ));
            }
        }

        invalid
    }
}

/// Parse a duration in seconds within `[min, max]`; `Ok(None)` when absent
pub fn parse_duration(
    properties: &ConnectionProperties,
    min: i32,
    max: i32,
) -> Result<Option<i32>, InvalidProperty> {
    let Some(raw) = properties.non_blank(keys::SESSION_DURATION_SECONDS) else {
        return Ok(None);
    };

    match raw.trim().parse::<i32>() {
        Ok(seconds) if (min..=max).contains(&seconds) => Ok(Some(seconds)),
        _ => Err(InvalidProperty::new(
            keys::SESSION_DURATION_SECONDS,
            format!("Session duration must be a whole number of seconds between {min} and {max}"),
        )),
    }
}

/// Components of an IAM role ARN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleArn {
    pub partition: String,
    pub account_id: String,
    pub role_name: String,
}

impl RoleArn {
    /// Parse `arn:<partition>:iam::<account>:role/<path/><name>`
    pub fn parse(arn: &str) -> Result<Self, String> {
        let arn = arn.trim();
        if arn.is_empty() {
            return Err("ARN is empty".to_string());
        }

        let parts: Vec<&str> = arn.splitn(6, ':').collect();
        if parts.len() != 6 || parts[0] != "arn" {
            return Err(format!("Malformed ARN - doesn't start with 'arn:': {arn}"));
        }

        let (partition, service, account_id, resource) = (parts[1], parts[2], parts[4], parts[5]);

        if partition.is_empty() {
            return Err("Malformed ARN - no partition specified".to_string());
        }
        if service != "iam" {
            return Err(format!("The ARN must belong to the iam service, not '{service}'"));
        }
        if account_id.len() != 12 || !account_id.chars().all(|c| c.is_ascii_digit()) {
            return Err("Malformed ARN - the account ID must be 12 digits".to_string());
        }

        let role_path = resource
            .strip_prefix("role/")
            .ok_or_else(|| "The ARN must reference an IAM role".to_string())?;
        let role_name = role_path.rsplit('/').next().unwrap_or_default();
        if role_name.is_empty() {
            return Err("Malformed ARN - the role name is empty".to_string());
        }

        Ok(Self {
            partition: partition.to_string(),
            account_id: account_id.to_string(),
            role_name: role_name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regions() {
        assert!(is_valid_region("us-east-1"));
        assert!(is_valid_region("cn-north-1"));
        assert!(is_valid_region("us-gov-west-1"));
        assert!(!is_valid_region("moon-base-1"));
        assert!(!is_valid_region("US-EAST-1"));
    }

    #[test]
    fn test_default_endpoint_policy_accepts_aws_endpoints() {
        let policy = StsEndpointPolicy::default();

        assert!(policy.is_allowed("https://sts.amazonaws.com"));
        assert!(policy.is_allowed("https://sts.eu-west-1.amazonaws.com"));
        assert!(policy.is_allowed("https://sts.cn-north-1.amazonaws.com.cn"));
        assert!(!policy.is_allowed("http://sts.amazonaws.com"));
        assert!(!policy.is_allowed("https://sts.evil.example.com"));
    }

    #[test]
    fn test_custom_endpoint_policy() {
        let policy = StsEndpointPolicy::new(vec!["http://localhost:4566".to_string()]);
        assert!(policy.is_allowed("http://localhost:4566"));
        assert!(!policy.is_allowed("https://sts.amazonaws.com"));

        let with_aws = StsEndpointPolicy::new(vec![
            "http://localhost:4566".to_string(),
            ALL_AWS_ENDPOINTS_TOKEN.to_string(),
        ]);
        assert!(with_aws.is_allowed("https://sts.amazonaws.com"));
    }

    #[test]
    fn test_settings_target_uses_default_region() {
        let settings = StsSettings::default();
        let target = settings.target(&ConnectionProperties::new());

        assert_eq!(target.region, "us-east-1");
        assert!(target.endpoint.is_none());
    }

    #[test]
    fn test_settings_validation() {
        let settings = StsSettings::default();
        let props = ConnectionProperties::new()
            .with(keys::REGION, "nowhere")
            .with(keys::STS_ENDPOINT, "ftp://sts");

        let invalid = settings.validate(&props);
        let names: Vec<_> = invalid.iter().map(|p| p.property_name()).collect();
        assert_eq!(names, vec!["region", "stsEndpoint"]);
    }

    #[test]
    fn test_parse_duration() {
        let props = |v: &str| ConnectionProperties::new().with(keys::SESSION_DURATION_SECONDS, v);

        assert_eq!(parse_duration(&ConnectionProperties::new(), 900, 3600), Ok(None));
        assert_eq!(parse_duration(&props("1800"), 900, 3600), Ok(Some(1800)));
        assert!(parse_duration(&props("60"), 900, 3600).is_err());
        assert!(parse_duration(&props("-900"), 900, 3600).is_err());
        assert!(parse_duration(&props("1h"), 900, 3600).is_err());
    }

    #[test]
    fn test_role_arn_parse() {
        let arn = RoleArn::parse("arn:aws:iam::123456789012:role/team/deployer").unwrap();
        assert_eq!(arn.partition, "aws");
        assert_eq!(arn.account_id, "123456789012");
        assert_eq!(arn.role_name, "deployer");
    }

    #[test]
    fn test_role_arn_invalid() {
        assert_eq!(RoleArn::parse("").unwrap_err(), "ARN is empty");
        assert!(RoleArn::parse("not-an-arn").is_err());
        assert!(RoleArn::parse("arn:aws:s3:::bucket").is_err());
        assert!(RoleArn::parse("arn:aws:iam::12345:role/x").is_err());
        assert!(RoleArn::parse("arn:aws:iam::123456789012:user/alice").is_err());
    }

    #[test]
    fn test_session_names() {
        assert!(is_valid_session_name("aws-connector-session"));
        assert!(is_valid_session_name("user@example.com"));
        assert!(!is_valid_session_name("has space"));
        assert!(!is_valid_session_name("x"));
    }
}
