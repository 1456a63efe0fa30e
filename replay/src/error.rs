use thiserror::Error;

use replay_codegen::error::Error as CodegenError;
use replay_deserializer::error::Error as DeserializerError;
use replay_trace::error::Error as TraceError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error(transparent)]
    Deserialize(#[from] DeserializerError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error("No operation handles the action '{0}'")]
    UnknownOperation(String),

    #[error("Unable to serialize XML content: {0}")]
    Xml(#[from] replay_util::error::Error),

    #[error("Error writing output")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Whether the input data is at fault rather than the calling code.
    pub fn is_user_error(&self) -> bool {
        match self {
            Error::Codegen(error) => error.is_user_error(),
            Error::IoError(..) => false,
            _ => true,
        }
    }
}
