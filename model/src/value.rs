use std::{
    cell::{Ref, RefCell},
    fmt,
    rc::Rc,
    str::FromStr,
};

use chrono::NaiveDateTime;
use replay_util::xml::XmlElement;
use url::Url;
use uuid::Uuid;

use super::{
    error::Error,
    known,
    types::{Primitive, TypeRef},
};

const TICKS_PER_MILLISECOND: i64 = 10_000;
const TICKS_PER_SECOND: i64 = TICKS_PER_MILLISECOND * 1000;
const TICKS_PER_MINUTE: i64 = TICKS_PER_SECOND * 60;
const TICKS_PER_HOUR: i64 = TICKS_PER_MINUTE * 60;
const TICKS_PER_DAY: i64 = TICKS_PER_HOUR * 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeKind {
    Unspecified,
    Utc,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub value: NaiveDateTime,
    pub kind: DateTimeKind,
}

/// A signed interval counted in 100 nanosecond ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    ticks: i64,
}

/// Decimal number kept in its textual form so scale survives (`1.50`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Uri {
    Absolute(Url),
    Relative(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QualifiedName {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub ty: TypeRef,
    /// More than one name only for flags combinations.
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub element: TypeRef,
    pub items: Vec<Value>,
}

#[derive(Debug)]
pub struct Object {
    pub ty: TypeRef,
    pub fields: Vec<(String, Value)>,
    pub items: Vec<Value>,
    pub entries: Vec<(Value, Value)>,
}

/// Shared handle to a reference-typed instance. Handles compare by
/// identity, and graphs built from them may contain cycles.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

#[derive(Debug, Clone, PartialEq)]
pub struct DataColumn {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataTableValue {
    pub ty: TypeRef,
    pub name: String,
    pub namespace: String,
    pub locale: String,
    pub columns: Vec<DataColumn>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSetValue {
    pub ty: TypeRef,
    pub name: String,
    pub locale: String,
    pub tables: Vec<DataTableValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    DbNull,
    Boolean(bool),
    Byte(u8),
    SByte(i8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    Char(char),
    String(String),
    DateTime(DateTime),
    TimeSpan(TimeSpan),
    Guid(Uuid),
    Uri(Uri),
    QualifiedName(QualifiedName),
    Enum(EnumValue),
    Array(ArrayValue),
    Object(ObjectRef),
    Xml(XmlElement),
    /// A captured stream; its content is never recoverable.
    Stream(TypeRef),
    DataSet(DataSetValue),
    DataTable(DataTableValue),
}

impl DateTime {
    pub fn new(value: NaiveDateTime, kind: DateTimeKind) -> Self {
        Self { value, kind }
    }
}

impl TimeSpan {
    pub fn from_ticks(ticks: i64) -> Self {
        Self { ticks }
    }

    pub fn new(days: i64, hours: i64, minutes: i64, seconds: i64, milliseconds: i64) -> Self {
        Self::from_ticks(
            days * TICKS_PER_DAY
                + hours * TICKS_PER_HOUR
                + minutes * TICKS_PER_MINUTE
                + seconds * TICKS_PER_SECOND
                + milliseconds * TICKS_PER_MILLISECOND,
        )
    }

    pub fn ticks(&self) -> i64 {
        self.ticks
    }

    pub fn days(&self) -> i64 {
        self.ticks / TICKS_PER_DAY
    }

    pub fn hours(&self) -> i64 {
        (self.ticks / TICKS_PER_HOUR) % 24
    }

    pub fn minutes(&self) -> i64 {
        (self.ticks / TICKS_PER_MINUTE) % 60
    }

    pub fn seconds(&self) -> i64 {
        (self.ticks / TICKS_PER_SECOND) % 60
    }

    pub fn milliseconds(&self) -> i64 {
        (self.ticks / TICKS_PER_MILLISECOND) % 1000
    }
}

impl Decimal {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Error> {
        let trimmed = text.trim();
        let unsigned = trimmed
            .strip_prefix('-')
            .or_else(|| trimmed.strip_prefix('+'))
            .unwrap_or(trimmed);

        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let valid = !(whole.is_empty() && fraction.is_empty())
            && whole.bytes().all(|byte| byte.is_ascii_digit())
            && fraction.bytes().all(|byte| byte.is_ascii_digit());

        if !valid {
            return Err(Error::InvalidDecimal(text.to_owned()));
        }

        let negative = trimmed.starts_with('-');
        let whole = if whole.is_empty() { "0" } else { whole };
        let normalised = match (negative, fraction.is_empty()) {
            (false, true) => whole.to_owned(),
            (false, false) => format!("{}.{}", whole, fraction),
            (true, true) => format!("-{}", whole),
            (true, false) => format!("-{}.{}", whole, fraction),
        };

        Ok(Self(normalised))
    }
}

impl Uri {
    /// Absolute when the text parses as an absolute URI, relative otherwise.
    pub fn parse(text: &str) -> Self {
        match Url::parse(text) {
            Ok(url) => Uri::Absolute(url),
            Err(_) => Uri::Relative(text.to_owned()),
        }
    }

    /// Resolves `relative` against `base` into a single absolute URI.
    pub fn with_base(base: &str, relative: &str) -> Result<Self, Error> {
        Ok(Uri::Absolute(Url::parse(base)?.join(relative)?))
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self, Uri::Absolute(..))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Uri::Absolute(url) => url.as_str(),
            Uri::Relative(text) => text,
        }
    }
}

impl QualifiedName {
    pub fn new(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_owned(),
            namespace: namespace.to_owned(),
        }
    }
}

impl EnumValue {
    pub fn new(ty: TypeRef, member: &str) -> Self {
        Self {
            ty,
            members: vec![member.to_owned()],
        }
    }
}

impl ObjectRef {
    pub fn new(ty: TypeRef) -> Self {
        Self(Rc::new(RefCell::new(Object {
            ty,
            fields: Vec::new(),
            items: Vec::new(),
            entries: Vec::new(),
        })))
    }

    pub fn ty(&self) -> TypeRef {
        self.0.borrow().ty.clone()
    }

    /// Stable identity of the instance for as long as it is alive.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    pub fn set(&self, name: &str, value: Value) {
        let mut object = self.0.borrow_mut();
        match object.fields.iter_mut().find(|(field, _)| field == name) {
            Some((_, slot)) => *slot = value,
            None => object.fields.push((name.to_owned(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.0
            .borrow()
            .fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.clone())
    }

    pub fn push(&self, item: Value) {
        self.0.borrow_mut().items.push(item);
    }

    pub fn insert(&self, key: Value, value: Value) {
        self.0.borrow_mut().entries.push((key, value));
    }

    pub fn with(self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value.into());
        self
    }

    pub fn with_items(self, items: impl IntoIterator<Item = Value>) -> Self {
        self.0.borrow_mut().items.extend(items);
        self
    }

    pub fn with_entries(self, entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        self.0.borrow_mut().entries.extend(entries);
        self
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &ObjectRef) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(object) => write!(f, "ObjectRef({} @ {:#x})", object.ty, self.id()),
            Err(_) => write!(f, "ObjectRef(@ {:#x})", self.id()),
        }
    }
}

impl DataTableValue {
    pub fn new(name: &str) -> Self {
        Self {
            ty: known::data_table(),
            name: name.to_owned(),
            namespace: String::new(),
            locale: String::new(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Names handed out by the container to tables added without one.
    pub fn has_default_name(&self) -> bool {
        self.name.is_empty()
            || self
                .name
                .strip_prefix("Table")
                .map_or(false, |rest| !rest.is_empty() && rest.bytes().all(|byte| byte.is_ascii_digit()))
    }

    pub fn with_column(mut self, name: &str, ty: TypeRef) -> Self {
        self.columns.push(DataColumn {
            name: name.to_owned(),
            ty,
        });
        self
    }

    pub fn with_row(mut self, row: Vec<Value>) -> Self {
        self.rows.push(row);
        self
    }
}

impl DataSetValue {
    pub fn new(name: &str) -> Self {
        Self {
            ty: known::data_set(),
            name: name.to_owned(),
            locale: String::new(),
            tables: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: DataTableValue) -> Self {
        self.tables.push(table);
        self
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The type of the instance itself; `None` for null.
    pub fn runtime_type(&self) -> Option<TypeRef> {
        let primitive = match self {
            Value::Null => return None,
            Value::DbNull => return Some(known::db_null()),
            Value::Boolean(..) => Primitive::Boolean,
            Value::Byte(..) => Primitive::Byte,
            Value::SByte(..) => Primitive::SByte,
            Value::Int16(..) => Primitive::Int16,
            Value::UInt16(..) => Primitive::UInt16,
            Value::Int32(..) => Primitive::Int32,
            Value::UInt32(..) => Primitive::UInt32,
            Value::Int64(..) => Primitive::Int64,
            Value::UInt64(..) => Primitive::UInt64,
            Value::Single(..) => Primitive::Single,
            Value::Double(..) => Primitive::Double,
            Value::Decimal(..) => Primitive::Decimal,
            Value::Char(..) => Primitive::Char,
            Value::String(..) => Primitive::String,
            Value::DateTime(..) => Primitive::DateTime,
            Value::TimeSpan(..) => Primitive::TimeSpan,
            Value::Guid(..) => Primitive::Guid,
            Value::Uri(..) => Primitive::Uri,
            Value::QualifiedName(..) => Primitive::QualifiedName,
            Value::Enum(value) => return Some(value.ty.clone()),
            Value::Array(array) => return Some(known::array(array.element.clone())),
            Value::Object(object) => return Some(object.ty()),
            Value::Xml(..) => return Some(known::xml_element()),
            Value::Stream(ty) => return Some(ty.clone()),
            Value::DataSet(data_set) => return Some(data_set.ty.clone()),
            Value::DataTable(table) => return Some(table.ty.clone()),
        };

        Some(known::primitive(primitive))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDef;

    #[test]
    fn time_span_components_follow_sign() {
        let span = TimeSpan::new(1, 2, 3, 4, 5);
        assert_eq!(
            (span.days(), span.hours(), span.minutes(), span.seconds(), span.milliseconds()),
            (1, 2, 3, 4, 5)
        );

        let negative = TimeSpan::from_ticks(-span.ticks());
        assert_eq!(
            (
                negative.days(),
                negative.hours(),
                negative.minutes(),
                negative.seconds(),
                negative.milliseconds()
            ),
            (-1, -2, -3, -4, -5)
        );
    }

    #[test]
    fn decimals_keep_scale() {
        assert_eq!("1.50".parse::<Decimal>().unwrap().as_str(), "1.50");
        assert_eq!("+.5".parse::<Decimal>().unwrap().as_str(), "0.5");
        assert_eq!("-12".parse::<Decimal>().unwrap().as_str(), "-12");
        assert!("1e5".parse::<Decimal>().is_err());
        assert!(".".parse::<Decimal>().is_err());
    }

    #[test]
    fn uri_base_and_relative_collapse_to_one_absolute() {
        let uri = Uri::with_base("http://example.org/a/", "b/c?x=1").unwrap();
        assert_eq!(uri, Uri::Absolute(Url::parse("http://example.org/a/b/c?x=1").unwrap()));

        assert!(!Uri::parse("b/c").is_absolute());
        assert_eq!(Uri::parse("b/c").as_str(), "b/c");
    }

    #[test]
    fn objects_compare_by_identity() {
        let ty = TypeDef::class("Orders", "Order").into_ref();
        let first = ObjectRef::new(ty.clone()).with("Id", 1);
        let second = ObjectRef::new(ty).with("Id", 1);

        assert_eq!(first, first.clone());
        assert_ne!(first, second);
        assert_eq!(first.get("Id"), Some(Value::Int32(1)));
    }

    #[test]
    fn cyclic_objects_debug_print() {
        let ty = TypeDef::class("Graphs", "Node").into_ref();
        let node = ObjectRef::new(ty);
        node.set("Next", Value::Object(node.clone()));

        assert!(format!("{:?}", node).contains("Graphs.Node"));
    }

    #[test]
    fn runtime_types() {
        assert_eq!(Value::Int32(3).runtime_type(), Some(known::int32()));
        assert_eq!(Value::Null.runtime_type(), None);
        assert_eq!(
            Value::Array(ArrayValue {
                element: known::string(),
                items: Vec::new()
            })
            .runtime_type(),
            Some(known::array(known::string()))
        );
    }

    #[test]
    fn default_table_names() {
        assert!(DataTableValue::new("").has_default_name());
        assert!(DataTableValue::new("Table12").has_default_name());
        assert!(!DataTableValue::new("Table").has_default_name());
        assert!(!DataTableValue::new("Customers").has_default_name());
    }
}
