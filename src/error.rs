use thiserror::Error;

use crate::provider::diagnostics::Diagnostics;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(Diagnostics),

    #[error("SerializationError: {0}")]
    SerializationError(#[source] serde_json::Error),

    #[error("YamlError: {0}")]
    YamlError(#[source] serde_yaml::Error),

    #[error("TemplateError: {0}")]
    TemplateError(#[source] handlebars::RenderError),

    #[error("IoError: {0}")]
    IoError(#[source] std::io::Error),

    #[error("CRD {0} has no OpenAPI schema for its spec")]
    MissingSchema(String),

    #[error("system clock is outside the range of a nanosecond timestamp")]
    ClockOutOfRange,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Diagnostics describing this error, for callers that only speak diagnostics.
    pub fn diagnostics(&self) -> Diagnostics {
        match self {
            Error::InvalidConfiguration(diags) => diags.clone(),
            other => {
                let mut diags = Diagnostics::new();
                diags.error(
                    &crate::provider::diagnostics::AttributePath::root(),
                    "Provider error",
                    other.to_string(),
                );
                diags
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::YamlError(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}
