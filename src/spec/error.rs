//! Errors raised while validating a workflow description.

/// A workflow that cannot be handed to the compiler.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The workflow declares no processors.
    #[error("workflow contains no processors")]
    Empty,

    /// Two processors share a name.
    #[error("duplicate processor name: {0}")]
    DuplicateName(String),

    /// A name, origin or description contains characters that cannot appear
    /// in a channel name.
    #[error("invalid {kind} {value:?} in processor {processor}: allowed characters are {allowed}")]
    InvalidIdentifier {
        /// Processor the identifier belongs to.
        processor: String,
        /// Which field was rejected.
        kind: &'static str,
        /// The rejected value.
        value: String,
        /// Accepted character class.
        allowed: String,
    },

    /// An option reuses a flag every device already receives.
    #[error("option {option} of processor {processor} clashes with a built-in device flag")]
    ReservedOption {
        /// Processor declaring the option.
        processor: String,
        /// Option name.
        option: String,
    },

    /// An origin or description exceeds its header width.
    #[error("{kind} {value:?} in processor {processor} exceeds {max} characters")]
    IdentifierTooLong {
        /// Processor the identifier belongs to.
        processor: String,
        /// Which field was rejected.
        kind: &'static str,
        /// The rejected value.
        value: String,
        /// Maximum length for this field.
        max: usize,
    },

    /// An option default does not match the declared option type.
    #[error("option {option} of processor {processor}: default {value} is not a valid {expected}")]
    InvalidDefault {
        /// Processor declaring the option.
        processor: String,
        /// Option name.
        option: String,
        /// Rendered default value.
        value: String,
        /// Declared type name.
        expected: &'static str,
    },

    /// The identifier pattern failed to compile.
    #[error(transparent)]
    Pattern(#[from] regex::Error),
}
