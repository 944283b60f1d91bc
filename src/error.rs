//! Error taxonomy for the dispatch core.
//!
//! Configuration-time failures (duplicate or ambiguous mappings, pipelines
//! without a catch-all) are fatal and surface to whoever registered or first
//! resolved the handler. Per-request failures (missing session attribute,
//! missing required parameter) abort one dispatch. Errors raised by the
//! handler callable itself travel through [`DispatchError::Handler`]
//! untouched: `Display` and `source()` are those of the original error.

use std::time::Duration;

/// Error type returned by handler callables and attribute-producing methods.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every failure the dispatch core can report.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// An equal criteria is already bound to a different handler.
    #[error("cannot map handler '{attempted}' to {criteria}: handler '{existing}' is already mapped")]
    DuplicateMapping {
        criteria: String,
        existing: String,
        attempted: String,
    },

    /// Two registrations match a request with the same specificity rank.
    #[error("ambiguous handler methods mapped for path '{path}': {{{first}, {second}}}")]
    AmbiguousMapping {
        path: String,
        first: String,
        second: String,
    },

    /// No argument resolver supports a declared parameter.
    #[error("no argument resolver supports parameter #{index} '{parameter}' of handler '{handler}'")]
    UnsupportedArgument {
        handler: String,
        parameter: String,
        index: usize,
    },

    /// No return value handler supports the returned value.
    #[error("no return value handler supports return type '{return_type}' of handler '{handler}'")]
    UnsupportedReturnType {
        handler: String,
        return_type: String,
    },

    /// A declared session attribute is neither in the model nor in the store.
    #[error("expected session attribute '{name}'")]
    MissingSessionAttribute { name: String },

    /// A required request parameter, header or path variable is absent.
    #[error("required {source_kind} '{name}' is not present")]
    MissingParameter {
        source_kind: &'static str,
        name: String,
    },

    /// A request string could not be converted to the declared parameter type.
    #[error("cannot convert value '{value}' of '{name}' to {target}")]
    TypeMismatch {
        name: String,
        value: String,
        target: String,
    },

    /// A path pattern could not be compiled.
    #[error("invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A param/header/media-type expression could not be parsed.
    #[error("invalid expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// A model attribute was added without a name and none can be derived.
    #[error("cannot derive a model attribute name for a value of kind '{kind}'")]
    UnnamedAttribute { kind: String },

    /// The request body was read by an earlier resolver.
    #[error("request body has already been consumed")]
    BodyAlreadyConsumed,

    /// Error raised by the handler itself, propagated verbatim.
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// The asynchronous computation did not finish within the configured timeout.
    #[error("async request timed out after {}ms", .timeout.as_millis())]
    AsyncTimeout { timeout: Duration },

    /// The asynchronous computation failed or was abandoned.
    #[error("async processing failed: {source}")]
    AsyncFailure {
        #[source]
        source: HandlerError,
    },
}

impl DispatchError {
    /// True for errors that indicate a misconfigured registry or pipeline
    /// rather than a bad request.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DispatchError::DuplicateMapping { .. }
                | DispatchError::AmbiguousMapping { .. }
                | DispatchError::UnsupportedArgument { .. }
                | DispatchError::UnsupportedReturnType { .. }
                | DispatchError::InvalidPattern { .. }
                | DispatchError::InvalidExpression { .. }
        )
    }

    /// An [`AsyncFailure`](DispatchError::AsyncFailure) carrying `message`.
    #[must_use]
    pub fn async_failure(message: impl Into<String>) -> Self {
        DispatchError::AsyncFailure {
            source: message.into().into(),
        }
    }
}
