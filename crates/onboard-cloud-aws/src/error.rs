//! AWS provider error types

use aws_sdk_iam::error::{DisplayErrorContext, ProvideErrorMetadata};
use onboard_cloud::CloudError;
use thiserror::Error;

/// Error codes AWS services use for "no such resource"
const NOT_FOUND_CODES: [&str; 6] = [
    "NoSuchEntity",
    "NotFound",
    "NoSuchBucket",
    "ResourceNotFoundException",
    "NoSuchConfigurationRecorderException",
    "NoSuchDeliveryChannelException",
];

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("{resource} not found ({operation})")]
    NotFound { operation: String, resource: String },

    #[error("{operation} failed for {resource}: {message}")]
    Sdk {
        operation: String,
        resource: String,
        code: Option<String>,
        message: String,
    },

    #[error("{operation} for {resource} was not applied: {message}")]
    Unsuccessful {
        operation: String,
        resource: String,
        message: String,
    },

    #[error("{operation} returned no {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },

    #[error("could not decode policy document of {resource}: {message}")]
    Decode { resource: String, message: String },
}

impl AwsError {
    /// Classify an SDK error. Not-found codes become [`AwsError::NotFound`];
    /// everything else keeps its code and full error chain.
    pub fn from_sdk<E>(operation: &str, resource: &str, err: E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error,
    {
        let code = err.code().map(str::to_string);
        if is_not_found(code.as_deref(), err.message()) {
            tracing::debug!("{} {}: not found ({:?})", operation, resource, code);
            return Self::NotFound {
                operation: operation.to_string(),
                resource: resource.to_string(),
            };
        }

        Self::Sdk {
            operation: operation.to_string(),
            resource: resource.to_string(),
            code,
            message: DisplayErrorContext(&err).to_string(),
        }
    }

    pub fn unsuccessful(operation: &str, resource: &str, message: impl Into<String>) -> Self {
        Self::Unsuccessful {
            operation: operation.to_string(),
            resource: resource.to_string(),
            message: message.into(),
        }
    }
}

/// CloudFormation reports a missing stack as a validation error
fn is_not_found(code: Option<&str>, message: Option<&str>) -> bool {
    match code {
        Some("ValidationError") => message.is_some_and(|m| m.contains("does not exist")),
        Some(code) => NOT_FOUND_CODES.contains(&code),
        None => false,
    }
}

impl From<AwsError> for CloudError {
    fn from(err: AwsError) -> Self {
        match err {
            AwsError::NotFound { resource, .. } => CloudError::NotFound(resource),
            AwsError::Unsuccessful {
                operation,
                resource,
                message,
            } => CloudError::rejected(operation, resource, message),
            AwsError::Sdk {
                operation,
                resource,
                code,
                message,
            } => match code {
                Some(code) => {
                    CloudError::rejected(operation, resource, format!("{}: {}", code, message))
                }
                None => CloudError::Api(format!("{} {}: {}", operation, resource, message)),
            },
            other => CloudError::Api(other.to_string()),
        }
    }
}
