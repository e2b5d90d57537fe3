use serde::ser::SerializeStruct;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("host error: {0}")]
    Host(String),
    #[error("host rate limited")]
    HostRateLimited,
    #[error("host unavailable: {0}")]
    HostUnavailable(String),
    #[error("image retrieval failed: {0}")]
    ImageRetrieval(String),
    #[error("detection failed: {0}")]
    DetectionFailed(String),
    #[error("correlation failed: {0}")]
    CorrelationFailed(String),
    #[error("mapping schema error: {0}")]
    MappingSchema(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AppError", 2)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Host(_) => "HOST_ERROR",
            Self::HostRateLimited => "HOST_RATE_LIMITED",
            Self::HostUnavailable(_) => "HOST_UNAVAILABLE",
            Self::ImageRetrieval(_) => "IMAGE_RETRIEVAL",
            Self::DetectionFailed(_) => "DETECTION_FAILED",
            Self::CorrelationFailed(_) => "CORRELATION_FAILED",
            Self::MappingSchema(_) => "MAPPING_SCHEMA",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::HostRateLimited | Self::HostUnavailable(_) | Self::ImageRetrieval(_)
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        Self::Database(value.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(value: sqlx::migrate::MigrateError) -> Self {
        Self::Database(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
