use potion::Error;
use thiserror::Error;
use warp::reject::Rejection;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{info}")]
pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => Self::new(String::from("RowNotFound")),
            sqlx::Error::PoolTimedOut => Self::new(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(String::from("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(String::from("Worker crashed")),
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("Column not found: {e}")),
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            e => Self::new(format!("{e}")),
        }
    }
}

/// Failed conversion of a request value, tagged with the key it was read from.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("({key}: {info})")]
pub struct TypeError {
    key: String,
    info: String,
}

impl TypeError {
    pub fn new(key: &str, info: &str) -> Self {
        Self {
            key: key.to_string(),
            info: info.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    AlreadyExists(String),

    #[error("You can't subscribe to yourself")]
    SelfRelation,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("You don't have permission to perform this action")]
    Forbidden,

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation { .. } => 400,
            ServiceError::Unauthorized(_) => 401,
            ServiceError::Forbidden => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::AlreadyExists(_) | ServiceError::SelfRelation => 409,
            ServiceError::Query(_) | ServiceError::Internal(_) => 500,
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(value: sqlx::Error) -> Self {
        let error = QueryError::from(value);
        log::error!("Query failed: {error}");
        ServiceError::Query(error)
    }
}

impl From<TypeError> for ServiceError {
    fn from(value: TypeError) -> Self {
        ServiceError::Validation {
            field: value.key,
            message: value.info,
        }
    }
}

impl From<ServiceError> for Error {
    fn from(value: ServiceError) -> Self {
        Error {
            code: value.status_code().into(),
            info: Some(value.to_string()),
            redirect: None,
        }
    }
}

impl From<ServiceError> for Rejection {
    fn from(value: ServiceError) -> Self {
        let error: Error = value.into();
        error.into()
    }
}
