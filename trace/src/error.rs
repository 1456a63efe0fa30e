use thiserror::Error;

use replay_util::error::Error as XmlError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The file in memory is a trace file, a message log file is required.")]
    TraceFile,

    #[error("The file in memory is not a valid message log file.")]
    InvalidMessageLog,

    #[error("Unable to read message log")]
    Io(#[from] std::io::Error),
}

impl From<XmlError> for Error {
    fn from(error: XmlError) -> Self {
        match error {
            XmlError::XmlParseError(quick_xml::Error::Io(error)) => Error::Io(error),
            _ => Error::InvalidMessageLog,
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(error: quick_xml::Error) -> Self {
        XmlError::from(error).into()
    }
}
