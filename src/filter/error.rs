use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// `field` is the query parameter name as the client sent it.
    #[error("Invalid filter parameter '{field}': {message}")]
    InvalidFilterParameter { field: &'static str, message: String },
}

impl FilterError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        FilterError::InvalidFilterParameter { field, message: message.into() }
    }

    pub fn field(&self) -> &'static str {
        match self {
            FilterError::InvalidFilterParameter { field, .. } => field,
        }
    }
}
