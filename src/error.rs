//! Structured error handling for lucon
//!
//! Provides a unified error type with:
//! - Error codes for programmatic handling
//! - Structured, JSON-friendly responses
//! - Context preservation (source location, causes)
//!
//! # Error Categories
//!
//! - Parse errors — syntax errors in policy, route, or query text
//! - Solve errors — resolution limits and malformed goals
//! - Composition errors — failures deriving a verification theory
//! - Validation errors — input validation failures

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::ParseError;
use crate::solver::SolveError;

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Parse errors (1xxx)
    /// Generic parse error
    ParseError = 1000,
    /// Invalid clause (head or body goal not callable)
    InvalidClause = 1001,
    /// Unexpected end of input
    UnexpectedEof = 1002,

    // Solve errors (2xxx)
    /// Generic solve error
    SolveError = 2000,
    /// Goal could not be constructed
    MalformedGoal = 2001,
    /// Resolution step limit exceeded
    StepLimitExceeded = 2002,
    /// Resolution deadline exceeded
    DeadlineExceeded = 2003,

    // Composition errors (3xxx)
    /// Failure composing policy and route theories
    CompositionFailed = 3000,

    // Validation errors (5xxx)
    /// Generic validation error
    ValidationError = 5000,
    /// Empty input
    EmptyInput = 5001,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidClause => "Invalid clause",
            ErrorCode::UnexpectedEof => "Unexpected end of input",
            ErrorCode::SolveError => "Solve error",
            ErrorCode::MalformedGoal => "Malformed goal",
            ErrorCode::StepLimitExceeded => "Resolution step limit exceeded",
            ErrorCode::DeadlineExceeded => "Resolution deadline exceeded",
            ErrorCode::CompositionFailed => "Theory composition failed",
            ErrorCode::ValidationError => "Validation error",
            ErrorCode::EmptyInput => "Empty input",
            ErrorCode::InternalError => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for lucon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LuconError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional key-value context
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, String>,
}

impl LuconError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: HashMap::new(),
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    /// Create a solve error
    pub fn solve(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SolveError, message)
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"INTERNAL_ERROR","message":"{}"}}"#, self.message)
        })
    }
}

impl fmt::Display for LuconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;
        for (key, value) in &self.context {
            write!(f, " ({}={})", key, value)?;
        }
        Ok(())
    }
}

impl std::error::Error for LuconError {}

// ============================================================================
// Conversions from module error types
// ============================================================================

impl From<ParseError> for LuconError {
    fn from(err: ParseError) -> Self {
        let code = match &err {
            ParseError::Syntax { .. } => ErrorCode::ParseError,
            ParseError::InvalidClause { .. } => ErrorCode::InvalidClause,
            ParseError::UnexpectedEof => ErrorCode::UnexpectedEof,
        };
        let mut lucon = LuconError::new(code, err.to_string());
        match err {
            ParseError::Syntax { position, .. } | ParseError::InvalidClause { position, .. } => {
                lucon = lucon.with_context("position", position.to_string());
            }
            ParseError::UnexpectedEof => {}
        }
        lucon
    }
}

impl From<SolveError> for LuconError {
    fn from(err: SolveError) -> Self {
        let code = match &err {
            SolveError::MalformedGoal(_) => ErrorCode::MalformedGoal,
            SolveError::StepLimit(_) => ErrorCode::StepLimitExceeded,
            SolveError::DeadlineExceeded => ErrorCode::DeadlineExceeded,
            SolveError::NoMoreSolutions => ErrorCode::SolveError,
        };
        LuconError::new(code, err.to_string())
    }
}

/// A Result type using LuconError
pub type LuconResult<T> = Result<T, LuconError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LuconError::validation("test error");
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "test error");
    }

    #[test]
    fn test_error_with_context() {
        let err = LuconError::parse("syntax error").with_context("position", "42");
        assert_eq!(err.context.get("position"), Some(&"42".to_string()));
        assert!(err.to_string().contains("position=42"));
    }

    #[test]
    fn test_from_parse_error() {
        let parse = ParseError::Syntax {
            position: 7,
            message: "unexpected input".to_string(),
        };
        let err: LuconError = parse.into();
        assert_eq!(err.code, ErrorCode::ParseError);
        assert_eq!(err.context.get("position"), Some(&"7".to_string()));
    }

    #[test]
    fn test_from_solve_error() {
        let err: LuconError = SolveError::DeadlineExceeded.into();
        assert_eq!(err.code, ErrorCode::DeadlineExceeded);

        let err: LuconError = SolveError::StepLimit(100).into();
        assert_eq!(err.code, ErrorCode::StepLimitExceeded);
    }

    #[test]
    fn test_error_to_json() {
        let err = LuconError::parse("bad clause");
        let json = err.to_json();
        assert!(json.contains("PARSE_ERROR"));
        assert!(json.contains("bad clause"));
    }

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::ParseError.code(), 1000);
        assert_eq!(ErrorCode::MalformedGoal.code(), 2001);
        assert_eq!(ErrorCode::CompositionFailed.code(), 3000);
    }
}
