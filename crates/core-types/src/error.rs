use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Required field '{0}' is missing")]
    MissingField(&'static str),

    #[error("Field '{field}' has an unsupported value: {value}")]
    InvalidField { field: &'static str, value: String },
}
