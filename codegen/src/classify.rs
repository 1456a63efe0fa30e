use replay_model::{
    types::{CollectionShape, Family},
    SerializationInfo, TypeRef, Value,
};

use super::error::Error;

/// How a value in a slot of some declared type is reproduced.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Null,
    /// A value-typed slot for which nothing was captured.
    Absent,
    Simple,
    NullableWrapper(TypeRef),
    Array(TypeRef),
    XmlNode,
    XmlNodeArray,
    Stream,
    MemoryStream,
    Tabular(Family),
    Collection(CollectionShape),
    CollectionWithExtraMembers(CollectionShape),
    /// Non-generic element storage; every element goes by its own type.
    EnumerableOnly,
    Compound,
}

pub fn classify(
    info: &dyn SerializationInfo,
    declared: &TypeRef,
    value: &Value,
) -> Result<Classification, Error> {
    match declared.family() {
        Some(Family::Stream) => return Ok(Classification::Stream),
        Some(Family::MemoryStream) if !value.is_null() => return Ok(Classification::MemoryStream),
        _ => (),
    }

    let runtime = match value.runtime_type() {
        Some(runtime) => runtime,
        None if declared.is_value_type() && declared.nullable_inner().is_none() => {
            return Ok(Classification::Absent)
        }
        None => return Ok(Classification::Null),
    };

    if !declared.is_assignable_from(&runtime) {
        return Err(Error::InvalidOperation(format!(
            "A value of type {} cannot be assigned to a slot of type {}.",
            runtime, declared
        )));
    }

    if let Some(inner) = declared.nullable_inner() {
        return Ok(Classification::NullableWrapper(inner.clone()));
    }

    classify_runtime(info, &runtime, value)
}

fn classify_runtime(
    info: &dyn SerializationInfo,
    runtime: &TypeRef,
    value: &Value,
) -> Result<Classification, Error> {
    match runtime.family() {
        Some(Family::XmlNode) => return Ok(Classification::XmlNode),
        Some(Family::Stream) => return Ok(Classification::Stream),
        Some(Family::MemoryStream) => return Ok(Classification::MemoryStream),
        Some(family @ (Family::DataSet | Family::DataTable)) => {
            return Ok(Classification::Tabular(family))
        }
        None => (),
    }

    if matches!(value, Value::DbNull) || info.is_simple_type(runtime) {
        return Ok(Classification::Simple);
    }

    if !info.is_serializable(runtime) {
        return Err(Error::User(info.not_serializable_error(runtime)));
    }

    if let Some(element) = runtime.array_element() {
        return Ok(if element.family() == Some(Family::XmlNode) {
            Classification::XmlNodeArray
        } else {
            Classification::Array(element.clone())
        });
    }

    let extra_members = !info.serializable_members(runtime).is_empty();

    Ok(match runtime.collection_shape() {
        Some(CollectionShape::Items(None)) if !extra_members => Classification::EnumerableOnly,
        Some(shape) if extra_members => Classification::CollectionWithExtraMembers(shape),
        Some(shape) => Classification::Collection(shape),
        None => Classification::Compound,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay_model::{known, Member, MetadataInfo, ObjectRef, TypeDef};

    fn classify(declared: &TypeRef, value: &Value) -> Result<Classification, Error> {
        super::classify(&MetadataInfo, declared, value)
    }

    #[test]
    fn null_and_absent_differ() {
        assert_eq!(
            classify(&known::string(), &Value::Null).unwrap(),
            Classification::Null
        );
        assert_eq!(
            classify(&known::int32(), &Value::Null).unwrap(),
            Classification::Absent
        );
        assert_eq!(
            classify(&known::nullable(known::int32()), &Value::Null).unwrap(),
            Classification::Null
        );
    }

    #[test]
    fn streams_ignore_the_value() {
        assert_eq!(
            classify(&known::stream(), &Value::Stream(known::memory_stream())).unwrap(),
            Classification::Stream
        );
        assert_eq!(
            classify(&known::memory_stream(), &Value::Stream(known::memory_stream())).unwrap(),
            Classification::MemoryStream
        );
        assert_eq!(
            classify(&known::memory_stream(), &Value::Null).unwrap(),
            Classification::Null
        );
    }

    #[test]
    fn collections() {
        let tagged = TypeDef::class("Shop", "TaggedList")
            .with_base(known::list(known::string()))
            .with_members(vec![Member::new("Tag", known::string())])
            .into_ref();
        let plain = TypeDef::class("Shop", "Names")
            .with_base(known::list(known::string()))
            .into_ref();

        assert_eq!(
            classify(&tagged, &Value::Object(ObjectRef::new(tagged.clone()))).unwrap(),
            Classification::CollectionWithExtraMembers(CollectionShape::Items(Some(known::string())))
        );
        assert_eq!(
            classify(&plain, &Value::Object(ObjectRef::new(plain.clone()))).unwrap(),
            Classification::Collection(CollectionShape::Items(Some(known::string())))
        );
        assert_eq!(
            classify(&known::object(), &Value::Object(ObjectRef::new(known::array_list()))).unwrap(),
            Classification::EnumerableOnly
        );
    }

    #[test]
    fn mismatches_are_invalid_operations() {
        let error = classify(&known::string(), &Value::Int32(1)).unwrap_err();
        assert!(!error.is_user_error());
    }

    #[test]
    fn non_serializable_types_are_user_errors() {
        let handle = TypeDef::class("Io", "Handle").not_serializable().into_ref();
        let error = classify(&handle, &Value::Object(ObjectRef::new(handle.clone()))).unwrap_err();

        assert!(error.is_user_error());
        assert_eq!(
            error.to_string(),
            "The type Io.Handle is not serializable, so values of it cannot be reproduced."
        );
    }
}
