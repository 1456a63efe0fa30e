use std::path::Path;

mod parser;

pub mod error;
pub mod types;

pub use parser::MessageLogParser;
pub use types::{CaptureSide, MessageDirection, ParsedMessage, Sides};

/// Opens a message log file for reading requests captured on `sides`.
pub fn open<P: AsRef<Path>>(
    path: P,
    sides: Sides,
) -> Result<MessageLogParser<std::io::BufReader<std::fs::File>>, error::Error> {
    MessageLogParser::from_path(path, sides)
}

/// Reads every request from an in-memory message log.
pub fn parse_requests(xml: &str, sides: Sides) -> Result<Vec<ParsedMessage>, error::Error> {
    MessageLogParser::from_xml(xml, sides).collect()
}
