use super::types::{Member, TypeKind, TypeRef};

/// Answers the serialization questions the generator and deserializer ask
/// about a type.
pub trait SerializationInfo {
    /// Atomic types that are written as a single literal.
    fn is_simple_type(&self, ty: &TypeRef) -> bool;

    fn is_serializable(&self, ty: &TypeRef) -> bool;

    /// Members to reproduce, in the order they are written.
    fn serializable_members(&self, ty: &TypeRef) -> Vec<Member>;

    fn not_serializable_error(&self, ty: &TypeRef) -> String;
}

/// Reads the answers straight off the type metadata. Members come base
/// class first, each class in declaration order.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataInfo;

impl SerializationInfo for MetadataInfo {
    fn is_simple_type(&self, ty: &TypeRef) -> bool {
        matches!(ty.kind, TypeKind::Primitive(..) | TypeKind::Enum { .. })
    }

    fn is_serializable(&self, ty: &TypeRef) -> bool {
        match &ty.kind {
            TypeKind::Array(element) | TypeKind::Nullable(element) => self.is_serializable(element),
            _ => ty.ancestry().all(|ty| ty.serializable),
        }
    }

    fn serializable_members(&self, ty: &TypeRef) -> Vec<Member> {
        let mut chain: Vec<&TypeRef> = ty.ancestry().collect();
        chain.reverse();

        chain
            .into_iter()
            .flat_map(|ty| ty.declared_members().iter())
            .filter(|member| member.serializable)
            .cloned()
            .collect()
    }

    fn not_serializable_error(&self, ty: &TypeRef) -> String {
        format!(
            "The type {} is not serializable, so values of it cannot be reproduced.",
            ty
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{known, types::TypeDef};

    #[test]
    fn members_come_base_first() {
        let base = TypeDef::class("Shapes", "Shape")
            .with_members(vec![Member::new("Name", known::string())])
            .into_ref();
        let derived = TypeDef::class("Shapes", "Circle")
            .with_base(base)
            .with_members(vec![
                Member::new("Radius", known::double()),
                Member::new("Cache", known::object()).ignored(),
            ])
            .into_ref();

        let names: Vec<_> = MetadataInfo
            .serializable_members(&derived)
            .into_iter()
            .map(|member| member.name)
            .collect();

        assert_eq!(names, vec!["Name", "Radius"]);
    }

    #[test]
    fn serializability_is_inherited() {
        let base = TypeDef::class("Io", "Handle").not_serializable().into_ref();
        let derived = TypeDef::class("Io", "FileHandle").with_base(base).into_ref();

        assert!(!MetadataInfo.is_serializable(&derived));
        assert!(!MetadataInfo.is_serializable(&known::array(derived)));
        assert!(MetadataInfo.is_serializable(&known::list(known::int32())));
    }

    #[test]
    fn simple_types() {
        let color = TypeDef::enumeration("Paint", "Color", &["Red"]).into_ref();

        assert!(MetadataInfo.is_simple_type(&known::guid()));
        assert!(MetadataInfo.is_simple_type(&color));
        assert!(!MetadataInfo.is_simple_type(&known::nullable(known::int32())));
        assert!(!MetadataInfo.is_simple_type(&known::object()));
    }
}
