use std::fmt;

/// Failure taxonomy for the store and its persistence layer.
///
/// `CorruptStore` is reserved for data taskpad wrote itself: a stored file
/// that no longer parses, or one that breaks a store invariant. `Encode`
/// covers the opposite direction, a value that cannot be rendered for
/// storage or output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    InvalidInput(String),
    CorruptStore(String),
    Encode(String),
    Io(String),
}

impl AppError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn corrupt_store<M: Into<String>>(message: M) -> Self {
        Self::CorruptStore(message.into())
    }

    pub fn encode<M: Into<String>>(message: M) -> Self {
        Self::Encode(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::CorruptStore(_) => "corrupt_store",
            Self::Encode(_) => "encode_error",
            Self::Io(_) => "io_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(message) => message,
            Self::CorruptStore(message) => message,
            Self::Encode(message) => message,
            Self::Io(message) => message,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code(), self.message())
    }
}

impl std::error::Error for AppError {}
