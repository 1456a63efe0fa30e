use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The text '{text}' is not a valid value of type {ty}")]
    InvalidValue { ty: String, text: String },

    #[error("The data set in element <{0}> has no schema")]
    MissingSchema(String),
}

impl Error {
    pub(crate) fn invalid_value(ty: impl ToString, text: &str) -> Self {
        Error::InvalidValue {
            ty: ty.to_string(),
            text: text.to_owned(),
        }
    }
}
