//==================================================
// File: errors/mod.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Bridge error taxonomy
// Objective: One recoverable error type for every host-facing failure, with a
//            stable script-visible tag and console error code per variant
//==================================================

use thiserror::Error;

//==================================================
// Section 1.0 - Error Types
//==================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// Lists, procedures and the like cannot travel through a host message.
    #[error("{0} has no atom representation")]
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("outlet {index} out of range, object has {outlets} outlet(s)")]
    OutletOutOfRange { index: i64, outlets: usize },
    #[error("no receiver named '{0}'")]
    UnknownReceiver(String),
    #[error("no table named '{0}'")]
    TableNotFound(String),
    #[error("index {index} out of range for table '{table}' of length {len}")]
    IndexOutOfRange { table: String, index: i64, len: usize },
    #[error("invalid delay {0} ms")]
    InvalidDelay(f64),
    #[error("error evaluating {text}: {message}")]
    Evaluation { text: String, message: String },
    #[error("error loading {path}: {message}")]
    Load { path: String, message: String },
    #[error("{count} atoms exceeds the limit of {limit}")]
    TooManyAtoms { count: usize, limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Conversion,
    Outlet,
    Receiver,
    TableMissing,
    Index,
    Delay,
    Evaluation,
    Load,
    Limit,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Conversion => "E101",
            ErrorCode::Outlet => "E102",
            ErrorCode::Receiver => "E103",
            ErrorCode::TableMissing => "E104",
            ErrorCode::Index => "E105",
            ErrorCode::Delay => "E106",
            ErrorCode::Evaluation => "E107",
            ErrorCode::Load => "E108",
            ErrorCode::Limit => "E109",
        }
    }
}

impl BridgeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            BridgeError::Conversion(_) => ErrorCode::Conversion,
            BridgeError::OutletOutOfRange { .. } => ErrorCode::Outlet,
            BridgeError::UnknownReceiver(_) => ErrorCode::Receiver,
            BridgeError::TableNotFound(_) => ErrorCode::TableMissing,
            BridgeError::IndexOutOfRange { .. } => ErrorCode::Index,
            BridgeError::InvalidDelay(_) => ErrorCode::Delay,
            BridgeError::Evaluation { .. } => ErrorCode::Evaluation,
            BridgeError::Load { .. } => ErrorCode::Load,
            BridgeError::TooManyAtoms { .. } => ErrorCode::Limit,
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code().as_str()
    }

    /// Symbol a script matches against in `(catch 'tag ...)`.
    pub fn tag(&self) -> &'static str {
        match self {
            BridgeError::Conversion(_) => "conversion-error",
            BridgeError::OutletOutOfRange { .. } => "outlet-out-of-range",
            BridgeError::UnknownReceiver(_) => "unknown-receiver",
            BridgeError::TableNotFound(_) => "table-not-found",
            BridgeError::IndexOutOfRange { .. } => "index-out-of-range",
            BridgeError::InvalidDelay(_) => "invalid-delay",
            BridgeError::Evaluation { .. } => "evaluation-error",
            BridgeError::Load { .. } => "load-error",
            BridgeError::TooManyAtoms { .. } => "too-many-atoms",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_errors_have_distinct_codes() {
        let missing = BridgeError::TableNotFound("missing".into());
        let range = BridgeError::IndexOutOfRange {
            table: "arr".into(),
            index: -1,
            len: 4,
        };
        assert_eq!(missing.code_str(), "E104");
        assert_eq!(range.code_str(), "E105");
        assert_eq!(missing.tag(), "table-not-found");
        assert_eq!(
            range.to_string(),
            "index -1 out of range for table 'arr' of length 4"
        );
    }

    #[test]
    fn conversion_error_is_transparent() {
        let err: BridgeError = ConversionError::Unsupported("(1 2)".into()).into();
        assert_eq!(err.to_string(), "(1 2) has no atom representation");
        assert_eq!(err.tag(), "conversion-error");
    }
}

//==================================================
// End of file
//==================================================
