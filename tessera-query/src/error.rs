//! Error types for filter evaluation, mutation, and planner operations.
//!
//! Every failure surfaced by the engine is a [`QueryError`] carrying:
//! - an [`ErrorCode`] for programmatic handling
//! - context about the operation, field path, and (for bulk operations) the
//!   document that caused the failure
//! - optional suggestions and help text
//!
//! # Error Codes
//!
//! Error codes follow a pattern: T{category}{number}
//! - 1xxx: Predicate and schema errors
//! - 2xxx: Mutation errors
//! - 3xxx: Driver errors
//! - 7xxx: Configuration errors
//! - 9xxx: Internal errors
//!
//! ```rust
//! use tessera_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::required_field("Address", "street");
//! assert_eq!(err.code, ErrorCode::RequiredFieldViolation);
//! assert_eq!(err.code.code(), "T2001");
//! ```

use std::fmt;
use thiserror::Error;

use crate::value::RecordId;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Predicate and schema errors (1xxx)
    /// A predicate is incompatible with the value it inspects (T1003).
    PredicateType = 1003,
    /// A field name is not declared on the type (T1004).
    UnknownField = 1004,
    /// A type name is not declared in the schema (T1005).
    UnknownType = 1005,

    // Mutation errors (2xxx)
    /// Unset or null written to a required field (T2001).
    RequiredFieldViolation = 2001,
    /// Structural update on an absent nested document (T2002).
    MissingTarget = 2002,
    /// Value shape does not match the declared field type (T2003).
    InvalidDataType = 2003,
    /// Invalid mutation parameter, e.g. division by zero (T2004).
    InvalidParameter = 2004,

    // Driver errors (3xxx)
    /// Record not found in the store (T3001).
    RecordNotFound = 3001,
    /// The store could not be reached (T3002).
    ConnectionFailed = 3002,
    /// The store rejected a write because of a constraint (T3003).
    ConstraintViolation = 3003,

    // Configuration errors (7xxx)
    /// Invalid configuration (T7001).
    InvalidConfiguration = 7001,

    // Internal errors (9xxx)
    /// Internal error (T9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "T1003").
    pub fn code(&self) -> String {
        format!("T{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::PredicateType => "Predicate incompatible with field value",
            Self::UnknownField => "Unknown field",
            Self::UnknownType => "Unknown type",
            Self::RequiredFieldViolation => "Required field violation",
            Self::MissingTarget => "Missing mutation target",
            Self::InvalidDataType => "Invalid data type",
            Self::InvalidParameter => "Invalid parameter",
            Self::RecordNotFound => "Record not found",
            Self::ConnectionFailed => "Data store connection failed",
            Self::ConstraintViolation => "Constraint violation",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Suggestion for fixing an error.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggestion text.
    pub text: String,
    /// Optional code example.
    pub code: Option<String>,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
        }
    }

    /// Add a code example.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The collection involved.
    pub collection: Option<String>,
    /// The type involved.
    pub type_name: Option<String>,
    /// Dotted path of the field involved.
    pub field: Option<String>,
    /// Position of the failing document (or list element) in a bulk operation.
    pub document_index: Option<usize>,
    /// Id of the failing document, when known.
    pub document_id: Option<RecordId>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<Suggestion>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur during query operations.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(suggestion));
        self
    }

    /// Add a code suggestion.
    pub fn with_code_suggestion(mut self, text: impl Into<String>, code: impl Into<String>) -> Self {
        self.context
            .suggestions
            .push(Suggestion::new(text).with_code(code));
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the collection.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.context.collection = Some(collection.into());
        self
    }

    /// Set the type name.
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.context.type_name = Some(type_name.into());
        self
    }

    /// Set the field path.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Record the document (or list element) index, keeping an inner one.
    pub fn at_index(mut self, index: usize) -> Self {
        self.context.document_index.get_or_insert(index);
        self
    }

    /// Record the failing document id.
    pub fn with_document_id(mut self, id: RecordId) -> Self {
        self.context.document_id = Some(id);
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// A condition was applied to a value it cannot inspect.
    pub fn predicate_type(condition: &str, found: &str) -> Self {
        Self::new(
            ErrorCode::PredicateType,
            format!("Condition `{}` cannot be applied to a {} value", condition, found),
        )
        .with_suggestion("Use list conditions (every, some, none, isEmpty) only on list fields")
        .with_suggestion("Use is/isNot only on composite fields")
    }

    /// A field is not declared on the type.
    pub fn unknown_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        let type_name = type_name.into();
        let field = field.into();
        Self::new(
            ErrorCode::UnknownField,
            format!("Type {} has no field named {}", type_name, field),
        )
        .with_type(&type_name)
        .with_field(&field)
    }

    /// A type is not declared in the schema.
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self::new(
            ErrorCode::UnknownType,
            format!("Type {} is not declared in the schema", type_name),
        )
        .with_type(&type_name)
    }

    /// Unset or null was written to a required field.
    pub fn required_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        let type_name = type_name.into();
        let field = field.into();
        Self::new(
            ErrorCode::RequiredFieldViolation,
            format!(
                "Field {} of {} is required and cannot be unset or null",
                field, type_name
            ),
        )
        .with_type(&type_name)
        .with_field(&field)
        .with_suggestion(format!("Provide a value for the {} field", field))
        .with_help("Mark the field optional in the schema if it may be absent")
    }

    /// A structural update targeted an absent nested document.
    pub fn missing_target(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::MissingTarget,
            format!("Cannot update {}: the nested document is unset or null", field),
        )
        .with_field(&field)
        .with_code_suggestion(
            "Use upsert to create the document when it is absent",
            "Mutation::upsert(set_value, update_data)",
        )
    }

    /// A value has the wrong shape for its field.
    pub fn invalid_data_type(field: impl Into<String>, expected: &str, found: &str) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::InvalidDataType,
            format!("Field {} expects {} but got {}", field, expected, found),
        )
        .with_field(&field)
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        let message = message.into();
        Self::new(
            ErrorCode::InvalidParameter,
            format!("Invalid input for {}: {}", field, message),
        )
        .with_field(&field)
    }

    /// Create a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        let what = what.into();
        Self::new(ErrorCode::RecordNotFound, format!("No record found: {}", what))
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::ConnectionFailed,
            format!("Connection error: {}", message),
        )
        .with_suggestion("Check that the data store is reachable")
        .with_help("Connection failures may be retried by the caller")
    }

    /// Create a constraint violation error.
    pub fn constraint_violation(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ConstraintViolation,
            format!("Constraint violation: {}", message.into()),
        )
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidConfiguration,
            format!("Invalid configuration: {}", message.into()),
        )
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message.into()))
    }

    // ============== Error Checks ==============

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::RecordNotFound
    }

    /// Check if this is a predicate type error.
    pub fn is_predicate_type(&self) -> bool {
        self.code == ErrorCode::PredicateType
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        self.code == ErrorCode::ConnectionFailed
    }

    /// Check if the caller may retry the operation.
    ///
    /// The engine never retries on its own.
    pub fn is_retryable(&self) -> bool {
        self.code == ErrorCode::ConnectionFailed
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref collection) = self.context.collection {
            output.push_str(&format!("  → Collection: {}\n", collection));
        }
        if let Some(ref type_name) = self.context.type_name {
            output.push_str(&format!("  → Type: {}\n", type_name));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }
        if let Some(index) = self.context.document_index {
            output.push_str(&format!("  → Document index: {}\n", index));
        }
        if let Some(ref id) = self.context.document_id {
            output.push_str(&format!("  → Document id: {}\n", id));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion.text));
                if let Some(ref code) = suggestion.code {
                    output.push_str(&format!(
                        "     ```\n     {}\n     ```\n",
                        code.replace('\n', "\n     ")
                    ));
                }
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

/// Helper for creating errors with context.
#[macro_export]
macro_rules! query_error {
    ($code:expr, $msg:expr) => {
        $crate::error::QueryError::new($code, $msg)
    };
    ($code:expr, $msg:expr, $($key:ident = $value:expr),+ $(,)?) => {{
        let mut err = $crate::error::QueryError::new($code, $msg);
        $(
            err = err.$key($value);
        )+
        err
    }};
}
