use thiserror::Error;

pub const UNSOLVABLE_MESSAGE: &str =
    "Could not calculate the lump-sum investment. Please check the inputs.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("{field} {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("{}", UNSOLVABLE_MESSAGE)]
    Unsolvable,
}

impl CalcError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CalcError>;
