//! Mapping of SDK errors onto bw-core error kinds
//!
//! Classification goes by the S3 error code when the service returned one,
//! and by the failure stage (timeout, dispatch) otherwise.

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

use bw_core::Error;

/// Convert an SDK error for an operation on `resource` into a bw-core error
pub(crate) fn classify<E, R>(err: SdkError<E, R>, resource: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let transport = matches!(
        err,
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_)
    );
    let code = err.code().map(str::to_string);
    let message = DisplayErrorContext(&err).to_string();
    tracing::debug!(resource, ?code, %message, "s3 request failed");
    classify_code(code.as_deref(), transport, message, resource)
}

pub(crate) fn classify_code(
    code: Option<&str>,
    transport: bool,
    message: String,
    resource: &str,
) -> Error {
    match code {
        Some("NoSuchBucket" | "NoSuchKey" | "NotFound" | "NoSuchVersion") => {
            Error::NotFound(resource.to_string())
        }
        Some(
            "AccessDenied"
            | "AllAccessDisabled"
            | "AccessControlListNotSupported"
            | "InvalidAccessKeyId"
            | "SignatureDoesNotMatch"
            | "ExpiredToken",
        ) => Error::Auth(message),
        Some("BucketAlreadyExists" | "BucketAlreadyOwnedByYou" | "BucketNotEmpty" | "OperationAborted") => {
            Error::Conflict(message)
        }
        Some("NotImplemented") => Error::UnsupportedFeature(message),
        Some(
            "InvalidBucketName"
            | "InvalidArgument"
            | "InvalidLocationConstraint"
            | "IllegalLocationConstraintException"
            | "InvalidStorageClass"
            | "MalformedXML",
        ) => Error::InvalidArgument(message),
        Some(code) => Error::Service {
            code: code.to_string(),
            message,
        },
        None if transport => Error::Network(message),
        None => Error::General(message),
    }
}
