use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Error parsing XML input")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("Unexpected end of XML input, <{0}> is not closed")]
    UnclosedElement(String),

    #[error("XML input has no root element")]
    MissingRoot,

    #[error("Unexpected content outside of the root element")]
    UnexpectedContent,
}
