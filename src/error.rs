/// Failure categories shared by the CLI and the HTTP service.
///
/// The kind decides the process exit code (CLI) and the response status
/// (HTTP); the message is what the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Payload is not a JSON list (or is an empty one).
    InvalidInputShape,
    /// A record lacks `year` or the value field.
    MissingField,
    /// A record field has the wrong JSON type.
    InvalidFieldType,
    /// Forecast horizon is zero.
    InvalidHorizon,
    /// The forecasting model rejected the series or failed numerically.
    ModelFitting,
    /// `predict` was called before a successful `fit`.
    NotFitted,
    FileNotFound,
    MalformedFile,
    Io,
    Network,
    Config,
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True for errors caused by the caller's payload (rejected before the model runs).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::InvalidInputShape | ErrorKind::MissingField | ErrorKind::InvalidFieldType
        )
    }

    pub fn exit_code(&self) -> u8 {
        match self.kind {
            ErrorKind::Config | ErrorKind::InvalidHorizon => 2,
            ErrorKind::InvalidInputShape | ErrorKind::MissingField | ErrorKind::InvalidFieldType => 3,
            ErrorKind::ModelFitting | ErrorKind::NotFitted => 4,
            ErrorKind::FileNotFound | ErrorKind::MalformedFile | ErrorKind::Io | ErrorKind::Network => 5,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
