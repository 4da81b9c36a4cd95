use thiserror::Error;

/// The three ways a compilation can fail. The first failure aborts the whole
/// compilation, so a caller only ever sees one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A statement does not match its grammar.
    #[error("syntax error at column {column}: {message}: `{line}`")]
    Syntax {
        line: String,
        column: usize,
        message: String,
    },

    /// The text is well formed but means something the DSL forbids.
    #[error("semantic error: {0}")]
    Semantic(String),

    /// A defect in the compiler itself, never caused by user text.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CompileError>;

impl CompileError {
    pub fn syntax(line: &str, column: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line: line.trim().to_string(),
            column,
            message: message.into(),
        }
    }

    pub fn semantic(message: impl Into<String>) -> Self {
        Self::Semantic(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }

    pub fn is_semantic(&self) -> bool {
        matches!(self, Self::Semantic(_))
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    /// The human-readable part of the error, without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Syntax { message, .. } => message,
            Self::Semantic(message) | Self::Internal(message) => message,
        }
    }

    pub fn has_error_contains(&self, text: &str) -> bool {
        self.to_string().contains(text)
    }
}
