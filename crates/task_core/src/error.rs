use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("invalid_input - {0}")]
    InvalidInput(String),
    #[error("out_of_range - {0}")]
    OutOfRange(String),
    #[error("invalid_data - {0}")]
    InvalidData(String),
    #[error("storage_corrupt - {0}")]
    StorageCorrupt(String),
    #[error("storage_unavailable - {0}")]
    StorageUnavailable(String),
    #[error("io_error - {0}")]
    Io(String),
}

impl AppError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn out_of_range<M: Into<String>>(message: M) -> Self {
        Self::OutOfRange(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn storage_corrupt<M: Into<String>>(message: M) -> Self {
        Self::StorageCorrupt(message.into())
    }

    pub fn storage_unavailable<M: Into<String>>(message: M) -> Self {
        Self::StorageUnavailable(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::OutOfRange(_) => "out_of_range",
            Self::InvalidData(_) => "invalid_data",
            Self::StorageCorrupt(_) => "storage_corrupt",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::Io(_) => "io_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(message)
            | Self::OutOfRange(message)
            | Self::InvalidData(message)
            | Self::StorageCorrupt(message)
            | Self::StorageUnavailable(message)
            | Self::Io(message) => message,
        }
    }

    /// Errors the interactive front-end can report and keep running after.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::OutOfRange(_))
    }
}
