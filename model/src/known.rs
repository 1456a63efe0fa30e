//! Framework types the generator and deserializer recognise structurally.

use super::types::{Primitive, TypeDef, TypeKind, TypeRef};

const SYSTEM: &str = "System";
const GENERIC: &str = "System.Collections.Generic";
const COLLECTIONS: &str = "System.Collections";

pub fn primitive(primitive: Primitive) -> TypeRef {
    let (namespace, name) = match primitive {
        Primitive::Boolean => (SYSTEM, "Boolean"),
        Primitive::Byte => (SYSTEM, "Byte"),
        Primitive::SByte => (SYSTEM, "SByte"),
        Primitive::Int16 => (SYSTEM, "Int16"),
        Primitive::UInt16 => (SYSTEM, "UInt16"),
        Primitive::Int32 => (SYSTEM, "Int32"),
        Primitive::UInt32 => (SYSTEM, "UInt32"),
        Primitive::Int64 => (SYSTEM, "Int64"),
        Primitive::UInt64 => (SYSTEM, "UInt64"),
        Primitive::Single => (SYSTEM, "Single"),
        Primitive::Double => (SYSTEM, "Double"),
        Primitive::Decimal => (SYSTEM, "Decimal"),
        Primitive::Char => (SYSTEM, "Char"),
        Primitive::String => (SYSTEM, "String"),
        Primitive::DateTime => (SYSTEM, "DateTime"),
        Primitive::TimeSpan => (SYSTEM, "TimeSpan"),
        Primitive::Guid => (SYSTEM, "Guid"),
        Primitive::Uri => (SYSTEM, "Uri"),
        Primitive::QualifiedName => ("System.Xml", "XmlQualifiedName"),
    };

    TypeDef::new(namespace, name, TypeKind::Primitive(primitive)).into_ref()
}

pub fn object() -> TypeRef {
    TypeDef::new(SYSTEM, "Object", TypeKind::Object).into_ref()
}

pub fn boolean() -> TypeRef {
    primitive(Primitive::Boolean)
}

pub fn int32() -> TypeRef {
    primitive(Primitive::Int32)
}

pub fn int64() -> TypeRef {
    primitive(Primitive::Int64)
}

pub fn double() -> TypeRef {
    primitive(Primitive::Double)
}

pub fn decimal() -> TypeRef {
    primitive(Primitive::Decimal)
}

pub fn string() -> TypeRef {
    primitive(Primitive::String)
}

pub fn date_time() -> TypeRef {
    primitive(Primitive::DateTime)
}

pub fn guid() -> TypeRef {
    primitive(Primitive::Guid)
}

pub fn uri() -> TypeRef {
    primitive(Primitive::Uri)
}

pub fn nullable(inner: TypeRef) -> TypeRef {
    TypeDef::new(SYSTEM, "Nullable", TypeKind::Nullable(inner.clone()))
        .with_generic_args(vec![inner])
        .into_ref()
}

pub fn array(element: TypeRef) -> TypeRef {
    let namespace = element.namespace.clone();
    let name = format!("{}[]", element.name);
    TypeDef::new(&namespace, &name, TypeKind::Array(element))
        .with_base(array_base())
        .into_ref()
}

fn array_base() -> TypeRef {
    TypeDef::class(SYSTEM, "Array").into_ref()
}

pub fn ienumerable() -> TypeRef {
    TypeDef::new(COLLECTIONS, "IEnumerable", TypeKind::Collection(None))
        .as_interface()
        .into_ref()
}

pub fn ienumerable_of(element: TypeRef) -> TypeRef {
    TypeDef::new(GENERIC, "IEnumerable", TypeKind::Collection(Some(element.clone())))
        .with_generic_args(vec![element])
        .with_interfaces(vec![ienumerable()])
        .as_interface()
        .into_ref()
}

pub fn icollection(element: TypeRef) -> TypeRef {
    TypeDef::new(GENERIC, "ICollection", TypeKind::Collection(Some(element.clone())))
        .with_generic_args(vec![element.clone()])
        .with_interfaces(vec![ienumerable_of(element)])
        .as_interface()
        .into_ref()
}

pub fn ilist(element: TypeRef) -> TypeRef {
    TypeDef::new(GENERIC, "IList", TypeKind::Collection(Some(element.clone())))
        .with_generic_args(vec![element.clone()])
        .with_interfaces(vec![icollection(element)])
        .as_interface()
        .into_ref()
}

pub fn list(element: TypeRef) -> TypeRef {
    TypeDef::new(GENERIC, "List", TypeKind::Collection(Some(element.clone())))
        .with_generic_args(vec![element.clone()])
        .with_interfaces(vec![ilist(element)])
        .into_ref()
}

pub fn collection(element: TypeRef) -> TypeRef {
    TypeDef::new(
        "System.Collections.ObjectModel",
        "Collection",
        TypeKind::Collection(Some(element.clone())),
    )
    .with_generic_args(vec![element.clone()])
    .with_interfaces(vec![ilist(element)])
    .into_ref()
}

pub fn idictionary(key: TypeRef, value: TypeRef) -> TypeRef {
    TypeDef::new(
        GENERIC,
        "IDictionary",
        TypeKind::Dictionary(Some((key.clone(), value.clone()))),
    )
    .with_generic_args(vec![key, value])
    .as_interface()
    .into_ref()
}

pub fn dictionary(key: TypeRef, value: TypeRef) -> TypeRef {
    TypeDef::new(
        GENERIC,
        "Dictionary",
        TypeKind::Dictionary(Some((key.clone(), value.clone()))),
    )
    .with_generic_args(vec![key.clone(), value.clone()])
    .with_interfaces(vec![idictionary(key, value)])
    .into_ref()
}

pub fn array_list() -> TypeRef {
    TypeDef::new(COLLECTIONS, "ArrayList", TypeKind::Collection(None))
        .with_interfaces(vec![ienumerable()])
        .into_ref()
}

pub fn hashtable() -> TypeRef {
    TypeDef::new(COLLECTIONS, "Hashtable", TypeKind::Dictionary(None))
        .with_interfaces(vec![ienumerable()])
        .into_ref()
}

pub fn xml_node() -> TypeRef {
    TypeDef::new("System.Xml", "XmlNode", TypeKind::XmlNode).into_ref()
}

pub fn xml_element() -> TypeRef {
    TypeDef::new("System.Xml", "XmlElement", TypeKind::XmlElement)
        .with_base(xml_node())
        .into_ref()
}

pub fn xml_document() -> TypeRef {
    TypeDef::class("System.Xml", "XmlDocument")
        .with_base(xml_node())
        .into_ref()
}

pub fn stream() -> TypeRef {
    TypeDef::new("System.IO", "Stream", TypeKind::Stream).into_ref()
}

pub fn memory_stream() -> TypeRef {
    TypeDef::new("System.IO", "MemoryStream", TypeKind::MemoryStream)
        .with_base(stream())
        .into_ref()
}

pub fn data_set() -> TypeRef {
    TypeDef::new("System.Data", "DataSet", TypeKind::DataSet).into_ref()
}

pub fn data_table() -> TypeRef {
    TypeDef::new("System.Data", "DataTable", TypeKind::DataTable).into_ref()
}

pub fn db_null() -> TypeRef {
    TypeDef::new(SYSTEM, "DBNull", TypeKind::DbNull).into_ref()
}

pub fn culture_info() -> TypeRef {
    TypeDef::class("System.Globalization", "CultureInfo").into_ref()
}

pub fn uri_kind() -> TypeRef {
    TypeDef::enumeration(SYSTEM, "UriKind", &["RelativeOrAbsolute", "Absolute", "Relative"])
        .into_ref()
}

pub fn date_time_kind() -> TypeRef {
    TypeDef::enumeration(SYSTEM, "DateTimeKind", &["Unspecified", "Utc", "Local"]).into_ref()
}

/// Maps an XML Schema (or serialization namespace) type name to its
/// framework type, as used in `xsi:type` attributes.
pub fn from_schema_name(name: &str) -> Option<TypeRef> {
    let primitive = match name {
        "boolean" => Primitive::Boolean,
        "unsignedByte" => Primitive::Byte,
        "byte" => Primitive::SByte,
        "short" => Primitive::Int16,
        "unsignedShort" => Primitive::UInt16,
        "int" => Primitive::Int32,
        "unsignedInt" => Primitive::UInt32,
        "long" => Primitive::Int64,
        "unsignedLong" => Primitive::UInt64,
        "float" => Primitive::Single,
        "double" => Primitive::Double,
        "decimal" => Primitive::Decimal,
        "char" => Primitive::Char,
        "string" => Primitive::String,
        "dateTime" => Primitive::DateTime,
        "duration" => Primitive::TimeSpan,
        "guid" => Primitive::Guid,
        "anyURI" => Primitive::Uri,
        "QName" => Primitive::QualifiedName,
        "anyType" => return Some(object()),
        _ => return None,
    };

    Some(self::primitive(primitive))
}
