//! Error kinds for duel operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on this to decide what to do; the simulation loop, for
/// example, absorbs every inference kind and substitutes fallback text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// Invalid configuration or parameters
    ConfigInvalid,

    /// A required credential (API token) is missing
    CredentialMissing,

    // =========================================================================
    // Inference errors
    // =========================================================================
    /// The model call failed or returned nothing usable
    InferenceFailed,

    /// The server rejected the credentials
    AuthenticationFailed,

    /// The requested model is not available on the endpoint
    ModelNotFound,

    /// Rate limit exceeded
    RateLimited,

    /// The response body could not be decoded
    InvalidResponse,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    /// Network error (connect, timeout, broken stream)
    NetworkFailed,

    // =========================================================================
    // Encoding errors
    // =========================================================================
    /// Serialization/deserialization failed
    SerializationFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::CredentialMissing => "CredentialMissing",

            ErrorKind::InferenceFailed => "InferenceFailed",
            ErrorKind::AuthenticationFailed => "AuthenticationFailed",
            ErrorKind::ModelNotFound => "ModelNotFound",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::InvalidResponse => "InvalidResponse",

            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
            ErrorKind::NetworkFailed => "NetworkFailed",

            ErrorKind::SerializationFailed => "SerializationFailed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
