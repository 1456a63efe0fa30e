use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The captured data cannot be reproduced.
    #[error("{0}")]
    User(String),

    /// The caller paired a value with a type that cannot hold it.
    #[error("{0}")]
    InvalidOperation(String),
}

impl Error {
    pub fn is_user_error(&self) -> bool {
        matches!(self, Error::User(..))
    }
}

impl From<replay_util::error::Error> for Error {
    fn from(error: replay_util::error::Error) -> Self {
        Error::User(format!("Unable to serialize XML content: {}", error))
    }
}
