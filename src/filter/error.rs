use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Invalid field name: {0}")]
    InvalidField(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),
}
