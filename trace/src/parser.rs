use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    sync::Arc,
};

use chrono::{DateTime, FixedOffset};
use quick_xml::{events::Event, Reader};
use replay_util::xml::{Namespaces, XmlElement};

use super::{
    error,
    types::{CaptureSide, MessageDirection, ParsedMessage, Sides},
};

const RECORD: &[u8] = b"E2ETraceEvent";
const MESSAGE_LOGGING_SOURCE: &str = "System.ServiceModel.MessageLogging";

const ADDRESSING_NAMESPACES: &[&str] = &[
    "http://www.w3.org/2005/08/addressing",
    "http://schemas.xmlsoap.org/ws/2004/08/addressing",
];

const METADATA_EXCHANGE_ACTIONS: &[&str] = &[
    "http://schemas.xmlsoap.org/ws/2004/09/transfer/Get",
    "http://schemas.xmlsoap.org/ws/2004/09/transfer/GetResponse",
];
const METADATA_EXCHANGE_PREFIX: &str = "http://schemas.xmlsoap.org/ws/2004/09/mex";

const SECURITY_NEGOTIATION_PREFIXES: &[&str] = &[
    "http://schemas.xmlsoap.org/ws/2005/02/trust",
    "http://docs.oasis-open.org/ws-sx/ws-trust/200512",
    "http://docs.oasis-open.org/ws-sx/ws-secureconversation/200512",
    "http://schemas.xmlsoap.org/ws/2005/02/sc",
];

/// What one trace record turned out to be.
#[derive(Debug)]
enum Record {
    /// Emitted by a diagnostic source rather than message logging.
    Diagnostic,
    Skipped(String),
    Message(ParsedMessage),
}

/// Pulls application-level messages out of a message log, one record at a
/// time.
///
/// A log is a sequence of `E2ETraceEvent` records, either at the top level
/// or inside a single wrapper element. Reading stops with an error when the
/// input holds no message logging records at all.
pub struct MessageLogParser<B: BufRead> {
    reader: Reader<B>,
    buffer: Vec<u8>,
    sides: Sides,
    scopes: Vec<Arc<Namespaces>>,

    records: usize,
    message_records: usize,
    finished: bool,
}

impl<'a> MessageLogParser<&'a [u8]> {
    pub fn from_xml(xml: &'a str, sides: Sides) -> Self {
        Self::with_reader(Reader::from_str(xml), sides)
    }
}

impl MessageLogParser<BufReader<File>> {
    pub fn from_path<P: AsRef<Path>>(path: P, sides: Sides) -> Result<Self, error::Error> {
        let file = File::open(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "opened message log");
        Ok(Self::new(BufReader::new(file), sides))
    }
}

impl<B: BufRead> MessageLogParser<B> {
    pub fn new(input: B, sides: Sides) -> Self {
        Self::with_reader(Reader::from_reader(input), sides)
    }

    fn with_reader(reader: Reader<B>, sides: Sides) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            sides,
            scopes: Vec::new(),
            records: 0,
            message_records: 0,
            finished: false,
        }
    }

    /// The next request sent or received on an accepted side.
    pub fn read_next_request(&mut self) -> Result<Option<ParsedMessage>, error::Error> {
        self.read_next(Some(MessageDirection::Request))
    }

    /// The next request or reply captured on an accepted side.
    pub fn read_next_message(&mut self) -> Result<Option<ParsedMessage>, error::Error> {
        self.read_next(None)
    }

    fn read_next(
        &mut self,
        direction: Option<MessageDirection>,
    ) -> Result<Option<ParsedMessage>, error::Error> {
        let result = self.read_matching(direction);
        if result.is_err() {
            self.finished = true;
        }

        result
    }

    fn read_matching(
        &mut self,
        direction: Option<MessageDirection>,
    ) -> Result<Option<ParsedMessage>, error::Error> {
        while let Some(record) = self.read_record()? {
            self.records += 1;

            match interpret(&record, self.sides)? {
                Record::Diagnostic => {
                    tracing::trace!(record = self.records, "skipping diagnostic record")
                }

                Record::Skipped(reason) => {
                    self.message_records += 1;
                    tracing::debug!(record = self.records, %reason, "skipping message");
                }

                Record::Message(message) => {
                    self.message_records += 1;

                    if direction.map_or(true, |direction| direction == message.direction) {
                        return Ok(Some(message));
                    }

                    tracing::debug!(record = self.records, "skipping reply");
                }
            }
        }

        Ok(None)
    }

    /// Reads the next complete `E2ETraceEvent` element.
    fn read_record(&mut self) -> Result<Option<XmlElement>, error::Error> {
        loop {
            if self.finished {
                return Ok(None);
            }

            self.buffer.clear();
            let scope = self.scopes.last().cloned().unwrap_or_default();

            match self.reader.read_event(&mut self.buffer)? {
                Event::Start(start) if start.local_name() == RECORD => {
                    return Ok(Some(XmlElement::read(&mut self.reader, &start, &scope, false)?));
                }

                Event::Empty(start) if start.local_name() == RECORD => {
                    return Ok(Some(XmlElement::read(&mut self.reader, &start, &scope, true)?));
                }

                Event::Start(start) if self.scopes.is_empty() => {
                    let wrapper = XmlElement::read(&mut self.reader, &start, &scope, true)?;
                    tracing::trace!(wrapper = %wrapper.qualified_name(), "entering wrapper");
                    self.scopes.push(wrapper.scope().clone());
                }

                Event::End(..) => {
                    if self.scopes.pop().is_none() {
                        return Err(error::Error::InvalidMessageLog);
                    }
                }

                Event::Text(text) => {
                    if !text.escaped().iter().all(u8::is_ascii_whitespace) {
                        return Err(error::Error::InvalidMessageLog);
                    }
                }

                Event::Start(..) | Event::Empty(..) | Event::CData(..) => {
                    return Err(error::Error::InvalidMessageLog)
                }

                Event::Eof => {
                    self.finished = true;

                    if !self.scopes.is_empty() || self.records == 0 {
                        return Err(error::Error::InvalidMessageLog);
                    }

                    if self.message_records == 0 {
                        return Err(error::Error::TraceFile);
                    }

                    tracing::debug!(
                        records = self.records,
                        message_records = self.message_records,
                        "finished reading message log"
                    );
                    return Ok(None);
                }

                _ => (),
            }
        }
    }
}

impl<B: BufRead> Iterator for MessageLogParser<B> {
    type Item = Result<ParsedMessage, error::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next_request().transpose()
    }
}

fn interpret(record: &XmlElement, sides: Sides) -> Result<Record, error::Error> {
    let system = record
        .child("System", None)
        .ok_or(error::Error::InvalidMessageLog)?;
    let source = system
        .child("Source", None)
        .and_then(|source| source.attribute("Name", None))
        .ok_or(error::Error::InvalidMessageLog)?;

    if source != MESSAGE_LOGGING_SOURCE {
        return Ok(Record::Diagnostic);
    }

    let log_record = match record.descendant("MessageLogTraceRecord") {
        Some(log_record) => log_record,
        None => return Ok(Record::Diagnostic),
    };

    let log_source = log_record.attribute("Source", None).unwrap_or_default();
    let (side, direction) = match log_source {
        "ServiceLevelSendRequest" | "ServiceLevelSendDatagram" => {
            (CaptureSide::Client, MessageDirection::Request)
        }
        "ServiceLevelReceiveReply" => (CaptureSide::Client, MessageDirection::Reply),
        "ServiceLevelReceiveRequest" | "ServiceLevelReceiveDatagram" => {
            (CaptureSide::Service, MessageDirection::Request)
        }
        "ServiceLevelSendReply" => (CaptureSide::Service, MessageDirection::Reply),
        other => return Ok(Record::Skipped(format!("logged at {} level", other))),
    };

    if !sides.accepts(side) {
        return Ok(Record::Skipped(format!("captured on the {} side", side)));
    }

    let is_null = log_record
        .attribute("Type", None)
        .map_or(false, |ty| ty.contains("NullMessage"));

    let envelope = match log_record.child("Envelope", None) {
        Some(envelope) if !is_null => envelope,
        _ => return Ok(Record::Skipped("no message".to_owned())),
    };

    let soap_action = match soap_action(log_record, envelope) {
        Some(action) => action,
        None => {
            tracing::warn!("message without an action, skipping");
            return Ok(Record::Skipped("no action".to_owned()));
        }
    };

    if is_metadata_exchange(&soap_action) {
        return Ok(Record::Skipped(format!("metadata exchange {}", soap_action)));
    }

    if is_security_negotiation(&soap_action) {
        return Ok(Record::Skipped(format!("security negotiation {}", soap_action)));
    }

    let timestamp = timestamp(log_record, system).ok_or(error::Error::InvalidMessageLog)?;

    Ok(Record::Message(ParsedMessage {
        soap_action,
        message: envelope.clone(),
        timestamp,
        side,
        direction,
    }))
}

/// The addressing `Action` header, else the HTTP `SOAPAction` header.
fn soap_action(log_record: &XmlElement, envelope: &XmlElement) -> Option<String> {
    let header = envelope
        .child("Header", None)
        .and_then(|header| {
            header.elements().find(|element| {
                element.name == "Action"
                    && element
                        .namespace
                        .as_deref()
                        .map_or(false, |namespace| ADDRESSING_NAMESPACES.contains(&namespace))
            })
        })
        .map(|action| action.text().trim().to_owned());

    header
        .or_else(|| {
            log_record
                .child("HttpRequest", None)?
                .child("Headers", None)?
                .child("SOAPAction", None)
                .map(|action| action.text().trim().trim_matches('"').to_owned())
        })
        .filter(|action| !action.is_empty())
}

fn timestamp(log_record: &XmlElement, system: &XmlElement) -> Option<DateTime<FixedOffset>> {
    log_record
        .attribute("Time", None)
        .or_else(|| system.child("TimeCreated", None)?.attribute("SystemTime", None))
        .and_then(|time| DateTime::parse_from_rfc3339(time.trim()).ok())
}

fn is_metadata_exchange(action: &str) -> bool {
    METADATA_EXCHANGE_ACTIONS.contains(&action) || action.starts_with(METADATA_EXCHANGE_PREFIX)
}

fn is_security_negotiation(action: &str) -> bool {
    SECURITY_NEGOTIATION_PREFIXES
        .iter()
        .any(|prefix| action.starts_with(prefix))
}
