use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;

use crate::domain::RemoteError;

/// Map an SDK failure onto a [`RemoteError`], keeping the service error code when there is one
pub(crate) fn remote_error<E>(service: &str, err: &E) -> RemoteError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match err.code() {
        Some(code) => RemoteError::service(service, code, err.message()),
        None => RemoteError::raw(DisplayErrorContext(err).to_string()),
    }
}

pub(crate) fn missing_field(service: &str, field: &str) -> RemoteError {
    RemoteError::raw(format!("The {service} response did not contain {field}"))
}
