//! Error status: whether a failure is on the transient side

use crate::ErrorKind;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    /// The same request will fail again
    Permanent,
    /// The server or network may recover (overload, rate limit, dropped connection)
    Temporary,
}

impl ErrorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorStatus::Permanent => "permanent",
            ErrorStatus::Temporary => "temporary",
        }
    }
}

impl From<ErrorKind> for ErrorStatus {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InferenceFailed | ErrorKind::NetworkFailed | ErrorKind::RateLimited => {
                ErrorStatus::Temporary
            }
            _ => ErrorStatus::Permanent,
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_kind() {
        assert_eq!(ErrorStatus::from(ErrorKind::NetworkFailed), ErrorStatus::Temporary);
        assert_eq!(ErrorStatus::from(ErrorKind::RateLimited), ErrorStatus::Temporary);
        assert_eq!(ErrorStatus::from(ErrorKind::AuthenticationFailed), ErrorStatus::Permanent);
        assert_eq!(ErrorStatus::from(ErrorKind::ConfigInvalid), ErrorStatus::Permanent);
        assert_eq!(ErrorStatus::Temporary.to_string(), "temporary");
    }
}
