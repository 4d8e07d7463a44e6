use thiserror::Error;

#[derive(Debug, Error)]
pub enum FundGraphError {
    #[error("connection error: {0}")]
    ConnectionError(String),
    #[error("schema error: {0}")]
    SchemaError(String),
    #[error("query error: {0}")]
    QueryError(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("ingestion of {entity} failed at row {row}: {cause}")]
    Ingestion {
        entity: String,
        row: usize,
        cause: String,
    },
}

impl FundGraphError {
    pub fn connection<T: Into<String>>(msg: T) -> Self {
        FundGraphError::ConnectionError(msg.into())
    }

    pub fn schema<T: Into<String>>(msg: T) -> Self {
        FundGraphError::SchemaError(msg.into())
    }

    pub fn query<T: Into<String>>(msg: T) -> Self {
        FundGraphError::QueryError(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        FundGraphError::NotFound(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        FundGraphError::InvalidInput(msg.into())
    }

    pub fn ingestion<T: Into<String>>(entity: &str, row: usize, cause: T) -> Self {
        FundGraphError::Ingestion {
            entity: entity.to_string(),
            row,
            cause: cause.into(),
        }
    }
}
