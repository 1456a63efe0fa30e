use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to parse URI")]
    UriParseError(#[from] url::ParseError),

    #[error("'{0}' is not a valid decimal number")]
    InvalidDecimal(String),
}
