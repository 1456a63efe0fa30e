use std::{
    collections::BTreeMap,
    io::{BufRead, Cursor, Write},
    sync::Arc,
};

use quick_xml::events::{BytesStart, BytesText, Event};

pub use quick_xml::{events, Reader, Writer};

use super::error::Error;

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

pub trait ToXml {
    fn to_xml<W: Write>(&self, writer: &mut Writer<W>, top_level: bool) -> Result<(), Error>;
}

/// Prefix to namespace bindings in scope at an element. The default
/// namespace is stored under the empty prefix.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Namespaces(BTreeMap<String, String>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub prefix: Option<String>,
    pub name: String,
    pub namespace: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub prefix: Option<String>,
    pub name: String,
    pub namespace: Option<String>,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
    declarations: Vec<(Option<String>, String)>,
    scope: Arc<Namespaces>,
}

pub fn split_name(prefixed_name: &str) -> (Option<&str>, &str) {
    match prefixed_name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, prefixed_name),
    }
}

impl Namespaces {
    pub fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            Some("xml") => Some(XML_NAMESPACE),
            prefix => self
                .0
                .get(prefix.unwrap_or(""))
                .map(String::as_str)
                .filter(|namespace| !namespace.is_empty()),
        }
    }

    fn declare(&mut self, prefix: Option<&str>, namespace: &str) {
        self.0
            .insert(prefix.unwrap_or("").to_owned(), namespace.to_owned());
    }
}

impl XmlElement {
    pub fn new(name: &str, namespace: Option<&str>) -> Self {
        let mut scope = Namespaces::default();
        let mut declarations = Vec::new();

        if let Some(namespace) = namespace {
            scope.declare(None, namespace);
            declarations.push((None, namespace.to_owned()));
        }

        Self {
            prefix: None,
            name: name.to_owned(),
            namespace: namespace.map(ToOwned::to_owned),
            attributes: Vec::new(),
            children: Vec::new(),
            declarations,
            scope: Arc::new(scope),
        }
    }

    /// Parses a complete document and returns its root element.
    pub fn parse(xml: &str) -> Result<Self, Error> {
        let mut reader = Reader::from_str(xml);
        let mut buffer = Vec::new();
        let scope = Arc::new(Namespaces::default());
        let mut root = None;

        loop {
            match reader.read_event(&mut buffer)? {
                Event::Start(start) if root.is_none() => {
                    root = Some(Self::read(&mut reader, &start, &scope, false)?)
                }

                Event::Empty(start) if root.is_none() => {
                    root = Some(Self::read(&mut reader, &start, &scope, true)?)
                }

                Event::Text(text) => {
                    if !text.escaped().iter().all(u8::is_ascii_whitespace) {
                        return Err(Error::UnexpectedContent);
                    }
                }

                Event::Start(..) | Event::Empty(..) | Event::End(..) | Event::CData(..) => {
                    return Err(Error::UnexpectedContent)
                }

                Event::Eof => break,

                _ => (),
            }

            buffer.clear();
        }

        root.ok_or(Error::MissingRoot)
    }

    /// Reads the element opened by `start`, consuming events up to and
    /// including its end tag unless `empty` is set.
    pub fn read<B: BufRead>(
        reader: &mut Reader<B>,
        start: &BytesStart<'_>,
        parent: &Arc<Namespaces>,
        empty: bool,
    ) -> Result<Self, Error> {
        let qualified = reader.decode(start.name())?.to_owned();
        let (prefix, name) = split_name(&qualified);

        let mut declarations = Vec::new();
        let mut raw_attributes = Vec::new();

        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = reader.decode(attribute.key)?;
            let value = attribute.unescape_and_decode_value(reader)?;

            match split_name(key) {
                (None, "xmlns") => declarations.push((None, value)),
                (Some("xmlns"), declared) => declarations.push((Some(declared.to_owned()), value)),
                (prefix, local) => {
                    raw_attributes.push((prefix.map(ToOwned::to_owned), local.to_owned(), value))
                }
            }
        }

        let scope = if declarations.is_empty() {
            parent.clone()
        } else {
            let mut scope = (**parent).clone();
            for (prefix, namespace) in &declarations {
                scope.declare(prefix.as_deref(), namespace);
            }
            Arc::new(scope)
        };

        let attributes = raw_attributes
            .into_iter()
            .map(|(prefix, name, value)| XmlAttribute {
                namespace: prefix
                    .as_deref()
                    .and_then(|prefix| scope.resolve(Some(prefix)))
                    .map(ToOwned::to_owned),
                prefix,
                name,
                value,
            })
            .collect();

        let mut element = Self {
            prefix: prefix.map(ToOwned::to_owned),
            name: name.to_owned(),
            namespace: scope.resolve(prefix).map(ToOwned::to_owned),
            attributes,
            children: Vec::new(),
            declarations,
            scope,
        };

        if empty {
            return Ok(element);
        }

        let mut buffer = Vec::new();

        loop {
            match reader.read_event(&mut buffer)? {
                Event::Start(child) => {
                    let child = Self::read(reader, &child, &element.scope, false)?;
                    element.children.push(XmlNode::Element(child));
                }

                Event::Empty(child) => {
                    let child = Self::read(reader, &child, &element.scope, true)?;
                    element.children.push(XmlNode::Element(child));
                }

                Event::Text(text) => element
                    .children
                    .push(XmlNode::Text(text.unescape_and_decode(reader)?)),

                Event::CData(text) => element
                    .children
                    .push(XmlNode::CData(reader.decode(text.escaped())?.to_owned())),

                Event::Comment(text) => element
                    .children
                    .push(XmlNode::Comment(reader.decode(text.escaped())?.to_owned())),

                Event::End(..) => break,

                Event::Eof => return Err(Error::UnclosedElement(qualified)),

                _ => (),
            }

            buffer.clear();
        }

        if element.elements().next().is_some() {
            element.children.retain(|node| match node {
                XmlNode::Text(text) => !text.trim().is_empty(),
                _ => true,
            });
        }

        Ok(element)
    }

    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.scope
    }

    /// The shared bindings, for reading further elements nested in this one.
    pub fn scope(&self) -> &Arc<Namespaces> {
        &self.scope
    }

    /// Matches the local name, and the namespace when one is given.
    pub fn is(&self, name: &str, namespace: Option<&str>) -> bool {
        self.name == name
            && namespace.map_or(true, |namespace| self.namespace.as_deref() == Some(namespace))
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn first_element(&self) -> Option<&XmlElement> {
        self.elements().next()
    }

    pub fn child(&self, name: &str, namespace: Option<&str>) -> Option<&XmlElement> {
        self.elements().find(|element| element.is(name, namespace))
    }

    /// Depth-first search below this element.
    pub fn descendant(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find_map(|element| {
            if element.name == name {
                Some(element)
            } else {
                element.descendant(name)
            }
        })
    }

    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) | XmlNode::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn attribute(&self, name: &str, namespace: Option<&str>) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| {
                attribute.name == name && attribute.namespace.as_deref() == namespace
            })
            .map(|attribute| attribute.value.as_str())
    }

    pub fn is_nil(&self) -> bool {
        matches!(
            self.attribute("nil", Some(XSI_NAMESPACE)).map(str::trim),
            Some("true" | "1")
        )
    }

    pub fn resolve_prefix(&self, prefix: Option<&str>) -> Option<&str> {
        self.scope.resolve(prefix)
    }

    /// Resolves a `prefix:local` string found in content against the
    /// bindings in scope at this element.
    pub fn resolve_qname<'a>(&'a self, qualified: &'a str) -> (Option<&'a str>, &'a str) {
        let (prefix, local) = split_name(qualified.trim());
        (self.scope.resolve(prefix), local)
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.push(XmlAttribute {
            prefix: None,
            name: name.to_owned(),
            namespace: None,
            value: value.to_owned(),
        });
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.children.push(XmlNode::Text(text.to_owned()));
        self
    }

    /// Serialises the element as a standalone fragment.
    pub fn to_xml_string(&self) -> Result<String, Error> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        self.to_xml(&mut writer, true)?;
        let bytes = writer.into_inner().into_inner();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn collect_prefixes<'a>(&'a self, used: &mut Vec<Option<&'a str>>) {
        let mut add = |prefix: Option<&'a str>| {
            if !used.contains(&prefix) {
                used.push(prefix);
            }
        };

        if self.prefix.is_some() || self.namespace.is_some() {
            add(self.prefix.as_deref());
        }

        for attribute in &self.attributes {
            if attribute.prefix.is_some() {
                add(attribute.prefix.as_deref());
            }

            if attribute.name == "type" && attribute.namespace.as_deref() == Some(XSI_NAMESPACE) {
                if let (Some(prefix), _) = split_name(&attribute.value) {
                    add(Some(prefix));
                }
            }
        }

        for element in self.elements() {
            element.collect_prefixes(used);
        }
    }

    fn fragment_declarations(&self) -> Vec<(Option<String>, String)> {
        let mut used = Vec::new();
        self.collect_prefixes(&mut used);

        let mut declarations = self.declarations.clone();

        for prefix in used {
            if prefix == Some("xml")
                || declarations
                    .iter()
                    .any(|(declared, _)| declared.as_deref() == prefix)
            {
                continue;
            }

            if let Some(namespace) = self.scope.resolve(prefix) {
                declarations.push((prefix.map(ToOwned::to_owned), namespace.to_owned()));
            }
        }

        declarations
    }
}

impl ToXml for XmlElement {
    fn to_xml<W: Write>(&self, writer: &mut Writer<W>, top_level: bool) -> Result<(), Error> {
        let mut start = BytesStart::owned_name(self.qualified_name());

        let declarations = if top_level {
            self.fragment_declarations()
        } else {
            self.declarations.clone()
        };

        for (prefix, namespace) in &declarations {
            let key = match prefix {
                Some(prefix) => format!("xmlns:{}", prefix),
                None => "xmlns".to_owned(),
            };
            start.push_attribute((key.as_str(), namespace.as_str()));
        }

        for attribute in &self.attributes {
            let key = match &attribute.prefix {
                Some(prefix) => format!("{}:{}", prefix, attribute.name),
                None => attribute.name.clone(),
            };
            start.push_attribute((key.as_str(), attribute.value.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start.to_borrowed()))?;
        for child in &self.children {
            child.to_xml(writer, false)?;
        }
        writer.write_event(Event::End(start.to_end()))?;

        Ok(())
    }
}

impl ToXml for XmlNode {
    fn to_xml<W: Write>(&self, writer: &mut Writer<W>, top_level: bool) -> Result<(), Error> {
        match self {
            XmlNode::Element(element) => element.to_xml(writer, top_level)?,
            XmlNode::Text(text) => {
                writer.write_event(Event::Text(BytesText::from_plain_str(text)))?;
            }
            XmlNode::CData(text) => {
                writer.write_event(Event::CData(BytesText::from_escaped_str(text.as_str())))?;
            }
            XmlNode::Comment(text) => {
                writer.write_event(Event::Comment(BytesText::from_escaped_str(text.as_str())))?;
            }
        }

        Ok(())
    }
}
