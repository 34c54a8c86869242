//! AWS SDK implementations of the remote identity services

mod error;
mod iam_client;
mod sts_client;

pub use iam_client::AwsIdentityManagementService;
pub use sts_client::AwsSecurityTokenService;

use aws_smithy_types::DateTime as SmithyDateTime;
use chrono::{DateTime, Utc};

/// Name attached to the per-call credentials given to the SDK
pub(crate) const PROVIDER_NAME: &str = "aws-connector";

pub(crate) fn to_chrono(value: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}
