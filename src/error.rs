//! Error types. Errors are `anyhow::Error` everywhere; the failure point attaches an `ErrorType`
//! as context so the web layer and the CLI can tell what kind of failure occurred.

use std::fmt::{Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The remote store could not be reached or refused the credentials.
    Connection,
    /// A record could not be written to the remote store.
    Write,
    /// Records could not be read from the remote store.
    Read,
    /// A stored date could not be parsed.
    Parse,
    /// User input was rejected before anything was submitted.
    Validation,
    /// The configuration or the secrets files are missing or invalid.
    Config,
    /// The web server could not be started or failed while running.
    Service,
}

impl ErrorType {
    /// Returns the `ErrorType` attached to `err`, if any.
    pub fn of(err: &Error) -> Option<ErrorType> {
        err.downcast_ref::<ErrorType>().copied()
    }
}

impl Display for ErrorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorType::Connection => "Connection error",
            ErrorType::Write => "Write error",
            ErrorType::Read => "Read error",
            ErrorType::Parse => "Parse error",
            ErrorType::Validation => "Validation error",
            ErrorType::Config => "Configuration error",
            ErrorType::Service => "Service error",
        };
        f.write_str(s)
    }
}

/// Tags the error of a `Result` with an `ErrorType`.
pub trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Into::<Error>::into(e).context(error_type))
    }
}
