use std::sync::Arc;

/// Outcome of collecting one document from the hosting service.
#[derive(Debug, Clone)]
pub enum FetchOutcome<T> {
    /// The operation succeeded and data was found.
    Found(T),

    /// The requested repository does not exist or is not visible.
    NotFound,

    /// An error occurred while collecting data for the repository.
    Error(Arc<ohno::AppError>),
}

impl<T> FetchOutcome<T> {
    /// Convert into a `Result`, turning `NotFound` into an error naming `what`.
    pub fn into_result(self, what: &str) -> crate::Result<T> {
        match self {
            Self::Found(data) => Ok(data),
            Self::NotFound => Err(ohno::app_err!("{what} not found")),
            Self::Error(e) => Err(ohno::app_err!("fetching {what} failed: {e:#}")),
        }
    }
}
