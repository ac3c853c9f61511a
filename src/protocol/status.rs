//! Transport status codes.
//!
//! A [`Status`] is what a transaction reports independently of its reply
//! body. The values follow the host platform's `status_t` convention so that
//! unmodified peers interpret them the same way.

use std::fmt;

/// Transport-level status of one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub i32);

impl Status {
    /// Success.
    pub const OK: Status = Status(0);
    /// Generic failure.
    pub const UNKNOWN_ERROR: Status = Status(i32::MIN);
    /// Identity token did not match the service descriptor.
    pub const PERMISSION_DENIED: Status = Status(-1);
    /// Server busy; the request was not run.
    pub const WOULD_BLOCK: Status = Status(-11);
    /// Argument out of range.
    pub const BAD_VALUE: Status = Status(-22);
    /// Peer process is gone.
    pub const DEAD_OBJECT: Status = Status(-32);
    /// Operation declared but not provided by the service.
    pub const INVALID_OPERATION: Status = Status(-38);
    /// A fixed-schema field could not be read.
    pub const NOT_ENOUGH_DATA: Status = Status(-61);
    /// Opcode not handled by this service.
    pub const UNKNOWN_TRANSACTION: Status = Status(-74);
    /// The transaction could not be delivered.
    pub const FAILED_TRANSACTION: Status = Status(i32::MIN + 2);

    /// Raw status code.
    #[inline]
    pub fn code(self) -> i32 {
        self.0
    }

    /// Check if this is the success status.
    #[inline]
    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::OK => "OK",
            Self::UNKNOWN_ERROR => "UNKNOWN_ERROR",
            Self::PERMISSION_DENIED => "PERMISSION_DENIED",
            Self::WOULD_BLOCK => "WOULD_BLOCK",
            Self::BAD_VALUE => "BAD_VALUE",
            Self::DEAD_OBJECT => "DEAD_OBJECT",
            Self::INVALID_OPERATION => "INVALID_OPERATION",
            Self::NOT_ENOUGH_DATA => "NOT_ENOUGH_DATA",
            Self::UNKNOWN_TRANSACTION => "UNKNOWN_TRANSACTION",
            Self::FAILED_TRANSACTION => "FAILED_TRANSACTION",
            _ => return None,
        })
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        Status(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}({})", name, self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_is_zero() {
        assert_eq!(Status::OK.code(), 0);
        assert!(Status::OK.is_ok());
        assert!(!Status::UNKNOWN_TRANSACTION.is_ok());
    }

    #[test]
    fn test_display_named_and_raw() {
        assert_eq!(Status::UNKNOWN_TRANSACTION.to_string(), "UNKNOWN_TRANSACTION(-74)");
        assert_eq!(Status(7).to_string(), "7");
    }

    #[test]
    fn test_failure_codes_are_distinct() {
        let codes = [
            Status::PERMISSION_DENIED,
            Status::NOT_ENOUGH_DATA,
            Status::UNKNOWN_TRANSACTION,
            Status::UNKNOWN_ERROR,
            Status::FAILED_TRANSACTION,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
