use thiserror::Error;

/// Violations of the bookkeeping rules. The API layer maps these to 400/409.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("tension must be between {min} and {max} lbs, got {value}")]
    TensionOutOfRange { value: i32, min: i32, max: i32 },
    #[error("order in status '{0}' cannot be cancelled")]
    NotCancellable(String),
    #[error("order in status '{0}' can no longer change status")]
    TerminalStatus(String),
    #[error("minimum spend of {min_spend} cents not reached")]
    MinSpendNotReached { min_spend: i64 },
    #[error("only available for a first order")]
    FirstOrderOnly,
    #[error("insufficient points: balance {balance}, required {required}")]
    InsufficientPoints { balance: i64, required: i64 },
    #[error("percentage discount must be between 0 and 100")]
    InvalidPercentage,
    #[error("{0} cannot be negative")]
    Negative(&'static str),
}

impl DomainError {
    /// Conflicts are state violations; everything else is invalid input.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::NotCancellable(_) | DomainError::TerminalStatus(_)
        )
    }
}
