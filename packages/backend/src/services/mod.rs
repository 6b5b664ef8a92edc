pub mod leaderboard;
pub mod progression;
pub mod reference;
pub mod round;
pub mod session;

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("no verses match your filters")]
    NoEligibleContent,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }
}
