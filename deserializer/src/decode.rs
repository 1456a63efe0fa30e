use replay_model::{
    known,
    types::{CollectionShape, Family},
    value::{ArrayValue, EnumValue},
    ObjectRef, SerializationInfo, TypeKind, TypeRef, Value,
};
use replay_util::xml::{XmlElement, XSD_NAMESPACE, XSI_NAMESPACE};

use super::{data_set, error::Error, text};

const SERIALIZATION_NAMESPACE: &str = "http://schemas.microsoft.com/2003/10/Serialization/";

/// Turns serialized XML back into values of declared types.
pub struct Decoder<'a> {
    info: &'a dyn SerializationInfo,
    known_types: &'a [TypeRef],
}

impl<'a> Decoder<'a> {
    /// `known_types` are the types an `xsi:type` attribute may name besides
    /// the declared type and its bases.
    pub fn new(info: &'a dyn SerializationInfo, known_types: &'a [TypeRef]) -> Self {
        Self { info, known_types }
    }

    pub fn decode(&self, element: &XmlElement, declared: &TypeRef) -> Result<Value, Error> {
        if element.is_nil() {
            return Ok(Value::Null);
        }

        let declared = declared.nullable_inner().unwrap_or(declared);
        let ty = self.runtime_type(element, declared);

        tracing::trace!(element = %element.qualified_name(), ty = %ty, "decoding");
        self.decode_as(element, &ty)
    }

    /// The type named by `xsi:type`, else the declared type.
    fn runtime_type(&self, element: &XmlElement, declared: &TypeRef) -> TypeRef {
        let qualified = match element.attribute("type", Some(XSI_NAMESPACE)) {
            Some(qualified) => qualified,
            None => return declared.clone(),
        };

        let (namespace, local) = element.resolve_qname(qualified);

        let found = match namespace {
            Some(XSD_NAMESPACE | SERIALIZATION_NAMESPACE) => known::from_schema_name(local),
            _ => self
                .known_types
                .iter()
                .chain(declared.ancestry())
                .find(|ty| ty.name == local && declared.is_assignable_from(ty))
                .cloned(),
        };

        found.unwrap_or_else(|| {
            tracing::warn!(%qualified, declared = %declared, "unknown xsi:type, using the declared type");
            declared.clone()
        })
    }

    fn decode_as(&self, element: &XmlElement, ty: &TypeRef) -> Result<Value, Error> {
        match ty.family() {
            Some(Family::XmlNode) => {
                return Ok(element
                    .first_element()
                    .cloned()
                    .map_or(Value::Null, Value::Xml))
            }
            Some(Family::Stream | Family::MemoryStream) => return Ok(Value::Stream(ty.clone())),
            Some(Family::DataSet | Family::DataTable) => return data_set::decode(element, ty),
            None => (),
        }

        match &ty.kind {
            TypeKind::Object => Ok(self.decode_untyped(element)),

            TypeKind::DbNull => Ok(Value::DbNull),

            TypeKind::Primitive(primitive) => {
                let content = element.text();
                text::parse_primitive(*primitive, &content, element)
                    .ok_or_else(|| Error::invalid_value(ty, &content))
            }

            TypeKind::Enum { members, .. } => {
                let content = element.text();
                let names: Vec<String> = content.split_whitespace().map(ToOwned::to_owned).collect();

                if names.is_empty() || names.iter().any(|name| !members.contains(name)) {
                    return Err(Error::invalid_value(ty, &content));
                }

                Ok(Value::Enum(EnumValue {
                    ty: ty.clone(),
                    members: names,
                }))
            }

            TypeKind::Array(item) => self.decode_array(element, item),

            _ => match ty.collection_shape() {
                Some(CollectionShape::Items(item)) => self.decode_items(element, ty, item),
                Some(CollectionShape::Entries(entry)) => self.decode_entries(element, ty, entry),
                None if ty.is_interface() => {
                    tracing::warn!(ty = %ty, "cannot instantiate an interface without xsi:type");
                    Ok(Value::Null)
                }
                None => self.decode_members(element, ty),
            },
        }
    }

    /// Content of an `object` slot with no type information.
    fn decode_untyped(&self, element: &XmlElement) -> Value {
        if element.first_element().is_some() {
            Value::Xml(element.clone())
        } else {
            Value::String(element.text())
        }
    }

    fn decode_array(&self, element: &XmlElement, item: &TypeRef) -> Result<Value, Error> {
        let items = if item.family() == Some(Family::XmlNode) {
            element.elements().cloned().map(Value::Xml).collect()
        } else {
            element
                .elements()
                .map(|child| self.decode(child, item))
                .collect::<Result<_, _>>()?
        };

        Ok(Value::Array(ArrayValue {
            element: item.clone(),
            items,
        }))
    }

    fn decode_items(
        &self,
        element: &XmlElement,
        ty: &TypeRef,
        item: Option<TypeRef>,
    ) -> Result<Value, Error> {
        let item = item.unwrap_or_else(known::object);
        let concrete = if ty.is_interface() {
            known::list(item.clone())
        } else {
            ty.clone()
        };

        let object = ObjectRef::new(concrete.clone());
        let members = self.info.serializable_members(&concrete);

        for child in element.elements() {
            match members.iter().find(|member| member.element_name() == child.name) {
                Some(member) => object.set(&member.name, self.decode(child, &member.ty)?),
                None => object.push(self.decode(child, &item)?),
            }
        }

        Ok(Value::Object(object))
    }

    fn decode_entries(
        &self,
        element: &XmlElement,
        ty: &TypeRef,
        entry: Option<(TypeRef, TypeRef)>,
    ) -> Result<Value, Error> {
        let concrete = match (&entry, ty.is_interface()) {
            (Some((key, value)), true) => known::dictionary(key.clone(), value.clone()),
            (None, true) => known::hashtable(),
            (_, false) => ty.clone(),
        };
        let (key_type, value_type) = entry.unwrap_or_else(|| (known::object(), known::object()));

        let object = ObjectRef::new(concrete);

        for pair in element.elements() {
            let key = match pair.child("Key", None) {
                Some(key) => self.decode(key, &key_type)?,
                None => {
                    tracing::debug!(element = %pair.qualified_name(), "dictionary entry without a key");
                    continue;
                }
            };

            let value = match pair.child("Value", None) {
                Some(value) => self.decode(value, &value_type)?,
                None => Value::Null,
            };

            object.insert(key, value);
        }

        Ok(Value::Object(object))
    }

    fn decode_members(&self, element: &XmlElement, ty: &TypeRef) -> Result<Value, Error> {
        let object = ObjectRef::new(ty.clone());

        for member in self.info.serializable_members(ty) {
            let child = element.elements().find(|child| {
                child.name == member.element_name()
                    && member
                        .namespace
                        .as_deref()
                        .map_or(true, |namespace| child.namespace.as_deref() == Some(namespace))
            });

            match child {
                Some(child) => object.set(&member.name, self.decode(child, &member.ty)?),
                None => tracing::trace!(member = %member.name, ty = %ty, "member not present"),
            }
        }

        Ok(Value::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay_model::{Member, MetadataInfo, TypeDef};

    fn decode(xml: &str, ty: &TypeRef) -> Result<Value, Error> {
        let element = XmlElement::parse(xml).unwrap();
        Decoder::new(&MetadataInfo, &[]).decode(&element, ty)
    }

    fn point() -> TypeRef {
        TypeDef::class("Geometry", "Point")
            .with_members(vec![
                Member::new("X", known::int32()),
                Member::new("Y", known::int32()),
            ])
            .into_ref()
    }

    #[test]
    fn members_decode_by_element_name() {
        let value = decode("<p><X>1</X><Y>2</Y></p>", &point()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.ty(), point());
        assert_eq!(object.get("X"), Some(Value::Int32(1)));
        assert_eq!(object.get("Y"), Some(Value::Int32(2)));
    }

    #[test]
    fn missing_members_are_left_unset() {
        let value = decode("<p><Y>2</Y></p>", &point()).unwrap();
        assert_eq!(value.as_object().unwrap().get("X"), None);
    }

    #[test]
    fn nil_is_null() {
        let xml = r#"<p xmlns:i="http://www.w3.org/2001/XMLSchema-instance" i:nil="true" />"#;
        assert_eq!(decode(xml, &point()).unwrap(), Value::Null);
        assert_eq!(decode(xml, &known::nullable(known::int32())).unwrap(), Value::Null);
    }

    #[test]
    fn nullable_decodes_the_inner_type() {
        assert_eq!(
            decode("<n>5</n>", &known::nullable(known::int32())).unwrap(),
            Value::Int32(5)
        );
    }

    #[test]
    fn xsi_type_selects_a_known_type() {
        let shape = TypeDef::class("Geometry", "Shape")
            .with_members(vec![Member::new("Name", known::string())])
            .into_ref();
        let circle = TypeDef::class("Geometry", "Circle")
            .with_base(shape.clone())
            .with_members(vec![Member::new("Radius", known::double())])
            .into_ref();

        let element = XmlElement::parse(
            r#"<s xmlns:i="http://www.w3.org/2001/XMLSchema-instance" i:type="Circle"><Name>c</Name><Radius>1.5</Radius></s>"#,
        )
        .unwrap();
        let known_types = [circle.clone()];
        let value = Decoder::new(&MetadataInfo, &known_types)
            .decode(&element, &shape)
            .unwrap();

        let object = value.as_object().unwrap();
        assert_eq!(object.ty(), circle);
        assert_eq!(object.get("Name"), Some(Value::String("c".to_owned())));
        assert_eq!(object.get("Radius"), Some(Value::Double(1.5)));
    }

    #[test]
    fn xsi_type_skips_unrelated_types_of_the_same_name() {
        let shape = TypeDef::class("Geometry", "Shape")
            .with_members(vec![Member::new("Name", known::string())])
            .into_ref();
        let circle = TypeDef::class("Geometry", "Circle")
            .with_base(shape.clone())
            .into_ref();
        let badge = TypeDef::class("Awards", "Circle").into_ref();

        let element = XmlElement::parse(
            r#"<s xmlns:i="http://www.w3.org/2001/XMLSchema-instance" i:type="Circle"><Name>c</Name></s>"#,
        )
        .unwrap();
        let known_types = [badge, circle.clone()];
        let value = Decoder::new(&MetadataInfo, &known_types)
            .decode(&element, &shape)
            .unwrap();

        assert_eq!(value.as_object().unwrap().ty(), circle);
    }

    #[test]
    fn xsd_types_fill_object_slots() {
        let xml = r#"<o xmlns:i="http://www.w3.org/2001/XMLSchema-instance" xmlns:d="http://www.w3.org/2001/XMLSchema" i:type="d:long">42</o>"#;
        assert_eq!(decode(xml, &known::object()).unwrap(), Value::Int64(42));
        assert_eq!(
            decode("<o>text</o>", &known::object()).unwrap(),
            Value::String("text".to_owned())
        );
    }

    #[test]
    fn enums_and_flags() {
        let color = TypeDef::enumeration("Paint", "Color", &["Red", "Green"]).into_ref();
        let style = TypeDef::flags("Paint", "Style", &["Bold", "Italic"]).into_ref();

        assert_eq!(
            decode("<c>Green</c>", &color).unwrap(),
            Value::Enum(EnumValue::new(color.clone(), "Green"))
        );

        match decode("<s>Bold Italic</s>", &style).unwrap() {
            Value::Enum(value) => assert_eq!(value.members, vec!["Bold", "Italic"]),
            other => panic!("{:?}", other),
        }

        assert!(matches!(
            decode("<c>Blue</c>", &color),
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test]
    fn invalid_text_is_an_error() {
        let error = decode("<n>ten</n>", &known::int32()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "The text 'ten' is not a valid value of type System.Int32"
        );
    }

    #[test]
    fn arrays_decode_each_child() {
        let value = decode("<a><int>1</int><int>2</int></a>", &known::array(known::int32())).unwrap();
        assert_eq!(
            value,
            Value::Array(ArrayValue {
                element: known::int32(),
                items: vec![Value::Int32(1), Value::Int32(2)],
            })
        );

        match decode("<a />", &known::array(known::int32())).unwrap() {
            Value::Array(array) => assert!(array.items.is_empty()),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn interface_collections_become_lists() {
        let value = decode(
            "<l><string>a</string><string>b</string></l>",
            &known::ilist(known::string()),
        )
        .unwrap();

        let object = value.as_object().unwrap();
        assert_eq!(object.ty(), known::list(known::string()));
        assert_eq!(
            object.borrow().items,
            vec![Value::String("a".to_owned()), Value::String("b".to_owned())]
        );
    }

    #[test]
    fn dictionaries_read_key_value_pairs() {
        let xml = "<d>\
            <KeyValueOfstringint><Key>one</Key><Value>1</Value></KeyValueOfstringint>\
            <KeyValueOfstringint><Key>two</Key><Value>2</Value></KeyValueOfstringint>\
          </d>";
        let value = decode(xml, &known::idictionary(known::string(), known::int32())).unwrap();

        let object = value.as_object().unwrap();
        assert_eq!(object.ty(), known::dictionary(known::string(), known::int32()));
        assert_eq!(
            object.borrow().entries,
            vec![
                (Value::String("one".to_owned()), Value::Int32(1)),
                (Value::String("two".to_owned()), Value::Int32(2)),
            ]
        );
    }

    #[test]
    fn xml_slots_keep_the_element() {
        match decode("<x><Order Id=\"1\" /></x>", &known::xml_element()).unwrap() {
            Value::Xml(element) => {
                assert_eq!(element.name, "Order");
                assert_eq!(element.attribute("Id", None), Some("1"));
            }
            other => panic!("{:?}", other),
        }

        match decode("<x><A /><B /></x>", &known::array(known::xml_node())).unwrap() {
            Value::Array(array) => assert_eq!(array.items.len(), 2),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn streams_are_never_read() {
        assert_eq!(
            decode("<s>AAEC</s>", &known::memory_stream()).unwrap(),
            Value::Stream(known::memory_stream())
        );
    }
}
