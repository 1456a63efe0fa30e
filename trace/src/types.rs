use std::{fmt, str::FromStr};

use chrono::{DateTime, FixedOffset};
use replay_util::xml::XmlElement;

pub const SOAP11_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP12_NAMESPACE: &str = "http://www.w3.org/2003/05/soap-envelope";

/// The end of the channel a message was captured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSide {
    Client,
    Service,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDirection {
    Request,
    Reply,
}

/// Which capture sides a reader returns messages for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sides {
    Client,
    Service,
    Both,
}

#[derive(Debug, Clone)]
pub struct ParsedMessage {
    pub soap_action: String,
    /// The SOAP envelope as captured.
    pub message: XmlElement,
    pub timestamp: DateTime<FixedOffset>,
    pub side: CaptureSide,
    pub direction: MessageDirection,
}

impl Sides {
    pub fn accepts(self, side: CaptureSide) -> bool {
        matches!(
            (self, side),
            (Sides::Both, _)
                | (Sides::Client, CaptureSide::Client)
                | (Sides::Service, CaptureSide::Service)
        )
    }
}

impl Default for Sides {
    fn default() -> Self {
        Sides::Both
    }
}

impl FromStr for Sides {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "client" => Ok(Sides::Client),
            "service" => Ok(Sides::Service),
            "both" => Ok(Sides::Both),
            other => Err(format!(
                "unknown side '{}', expected client, service or both",
                other
            )),
        }
    }
}

impl fmt::Display for CaptureSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureSide::Client => write!(f, "client"),
            CaptureSide::Service => write!(f, "service"),
        }
    }
}

fn is_soap_namespace(namespace: Option<&str>) -> bool {
    matches!(namespace, Some(SOAP11_NAMESPACE | SOAP12_NAMESPACE))
}

impl ParsedMessage {
    pub fn header(&self) -> Option<&XmlElement> {
        self.message
            .elements()
            .find(|element| element.name == "Header" && is_soap_namespace(element.namespace.as_deref()))
    }

    pub fn body(&self) -> Option<&XmlElement> {
        self.message
            .elements()
            .find(|element| element.name == "Body" && is_soap_namespace(element.namespace.as_deref()))
    }
}
