use std::{fmt, sync::Arc};

use once_cell::sync::OnceCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    SByte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    Char,
    String,
    DateTime,
    TimeSpan,
    Guid,
    Uri,
    QualifiedName,
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Object,
    Primitive(Primitive),
    Enum { flags: bool, members: Vec<String> },
    Nullable(TypeRef),
    Array(TypeRef),
    /// Element storage with `Add(item)`. `None` is the non-generic form.
    Collection(Option<TypeRef>),
    /// Keyed storage with `Add(key, value)`. `None` is the non-generic form.
    Dictionary(Option<(TypeRef, TypeRef)>),
    Class,
    Struct,
    Interface,
    XmlNode,
    XmlElement,
    Stream,
    MemoryStream,
    DataSet,
    DataTable,
    DbNull,
}

/// What a collection-shaped type stores, found on the type itself, its base
/// chain or its interfaces.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionShape {
    Items(Option<TypeRef>),
    Entries(Option<(TypeRef, TypeRef)>),
}

/// Structural family a type belongs to through its base chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    XmlNode,
    Stream,
    MemoryStream,
    DataSet,
    DataTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberLocation {
    Body,
    Header,
}

#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub ty: TypeRef,
    pub xml_name: Option<String>,
    pub namespace: Option<String>,
    pub location: MemberLocation,
    pub serializable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MessageContract {
    pub wrapper_name: Option<String>,
    pub wrapper_namespace: Option<String>,
    pub is_wrapped: bool,
}

#[derive(Debug)]
pub struct TypeDef {
    pub namespace: String,
    pub name: String,
    pub kind: TypeKind,
    pub generic_args: Vec<TypeRef>,
    pub declaring_type: Option<TypeRef>,
    pub base: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub serializable: bool,
    pub interface: bool,
    pub message_contract: Option<MessageContract>,
    members: OnceCell<Vec<Member>>,
}

#[derive(Clone)]
pub struct TypeRef(Arc<TypeDef>);

impl Member {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self {
            name: name.to_owned(),
            ty,
            xml_name: None,
            namespace: None,
            location: MemberLocation::Body,
            serializable: true,
        }
    }

    pub fn header(name: &str, ty: TypeRef) -> Self {
        Self {
            location: MemberLocation::Header,
            ..Self::new(name, ty)
        }
    }

    pub fn with_xml_name(mut self, xml_name: &str) -> Self {
        self.xml_name = Some(xml_name.to_owned());
        self
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_owned());
        self
    }

    pub fn ignored(mut self) -> Self {
        self.serializable = false;
        self
    }

    /// Element name the member travels under.
    pub fn element_name(&self) -> &str {
        self.xml_name.as_deref().unwrap_or(&self.name)
    }
}

impl TypeDef {
    pub fn new(namespace: &str, name: &str, kind: TypeKind) -> Self {
        Self {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
            interface: matches!(kind, TypeKind::Interface),
            kind,
            generic_args: Vec::new(),
            declaring_type: None,
            base: None,
            interfaces: Vec::new(),
            serializable: true,
            message_contract: None,
            members: OnceCell::new(),
        }
    }

    pub fn class(namespace: &str, name: &str) -> Self {
        Self::new(namespace, name, TypeKind::Class)
    }

    pub fn structure(namespace: &str, name: &str) -> Self {
        Self::new(namespace, name, TypeKind::Struct)
    }

    pub fn enumeration(namespace: &str, name: &str, members: &[&str]) -> Self {
        let members = members.iter().map(|member| member.to_string()).collect();
        Self::new(namespace, name, TypeKind::Enum { flags: false, members })
    }

    pub fn flags(namespace: &str, name: &str, members: &[&str]) -> Self {
        let members = members.iter().map(|member| member.to_string()).collect();
        Self::new(namespace, name, TypeKind::Enum { flags: true, members })
    }

    /// Marks a collection-shaped definition as an interface.
    pub fn as_interface(mut self) -> Self {
        self.interface = true;
        self
    }

    pub fn with_base(mut self, base: TypeRef) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_interfaces(mut self, interfaces: Vec<TypeRef>) -> Self {
        self.interfaces = interfaces;
        self
    }

    pub fn with_generic_args(mut self, generic_args: Vec<TypeRef>) -> Self {
        self.generic_args = generic_args;
        self
    }

    pub fn nested_in(mut self, declaring_type: TypeRef) -> Self {
        self.namespace = declaring_type.namespace.clone();
        self.declaring_type = Some(declaring_type);
        self
    }

    pub fn with_members(self, members: Vec<Member>) -> Self {
        // A fresh definition has no members yet.
        let _ = self.members.set(members);
        self
    }

    pub fn not_serializable(mut self) -> Self {
        self.serializable = false;
        self
    }

    pub fn with_message_contract(mut self, contract: MessageContract) -> Self {
        self.message_contract = Some(contract);
        self
    }

    pub fn into_ref(self) -> TypeRef {
        TypeRef(Arc::new(self))
    }
}

impl TypeRef {
    /// Attaches members after construction, for types whose members refer
    /// back to the type itself. Has no effect once members are set.
    pub fn set_members(&self, members: Vec<Member>) -> bool {
        self.0.members.set(members).is_ok()
    }

    /// Members declared on this type only, in declaration order.
    pub fn declared_members(&self) -> &[Member] {
        self.0.members.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn ptr_eq(&self, other: &TypeRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_value_type(&self) -> bool {
        match &self.kind {
            TypeKind::Primitive(primitive) => !matches!(
                primitive,
                Primitive::String | Primitive::Uri | Primitive::QualifiedName
            ),
            TypeKind::Enum { .. } | TypeKind::Nullable(..) | TypeKind::Struct => true,
            _ => false,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, TypeKind::Object)
    }

    pub fn is_interface(&self) -> bool {
        self.interface
    }

    pub fn nullable_inner(&self) -> Option<&TypeRef> {
        match &self.kind {
            TypeKind::Nullable(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn array_element(&self) -> Option<&TypeRef> {
        match &self.kind {
            TypeKind::Array(element) => Some(element),
            _ => None,
        }
    }

    pub fn primitive(&self) -> Option<Primitive> {
        match &self.kind {
            TypeKind::Primitive(primitive) => Some(*primitive),
            _ => None,
        }
    }

    /// This type followed by its base classes, most derived first.
    pub fn ancestry(&self) -> impl Iterator<Item = &TypeRef> {
        std::iter::successors(Some(self), |ty| ty.base.as_ref())
    }

    pub fn family(&self) -> Option<Family> {
        self.ancestry().find_map(|ty| match ty.kind {
            TypeKind::XmlNode | TypeKind::XmlElement => Some(Family::XmlNode),
            TypeKind::MemoryStream => Some(Family::MemoryStream),
            TypeKind::Stream => Some(Family::Stream),
            TypeKind::DataSet => Some(Family::DataSet),
            TypeKind::DataTable => Some(Family::DataTable),
            _ => None,
        })
    }

    pub fn collection_shape(&self) -> Option<CollectionShape> {
        fn shape_of(ty: &TypeRef) -> Option<CollectionShape> {
            match &ty.kind {
                TypeKind::Collection(element) => Some(CollectionShape::Items(element.clone())),
                TypeKind::Dictionary(entry) => Some(CollectionShape::Entries(entry.clone())),
                _ => None,
            }
        }

        if let Some(shape) = self.ancestry().find_map(shape_of) {
            return Some(shape);
        }

        // Prefer a generic interface over the non-generic one it extends.
        let mut fallback = None;
        for ty in self.ancestry() {
            for interface in &ty.interfaces {
                match shape_of(interface) {
                    Some(CollectionShape::Items(None) | CollectionShape::Entries(None)) => {
                        fallback = fallback.or_else(|| shape_of(interface))
                    }
                    Some(shape) => return Some(shape),
                    None => (),
                }
            }
        }

        fallback
    }

    /// Dotted chain of enclosing type names, outermost first.
    pub fn nesting_chain(&self) -> Vec<&str> {
        let mut chain: Vec<&str> =
            std::iter::successors(Some(self), |ty| ty.declaring_type.as_ref())
                .map(|ty| ty.name.as_str())
                .collect();
        chain.reverse();
        chain
    }

    pub fn full_name(&self) -> String {
        match &self.kind {
            TypeKind::Array(element) => format!("{}[]", element.full_name()),
            _ => {
                let mut name = self.nesting_chain().join(".");
                if !self.namespace.is_empty() {
                    name = format!("{}.{}", self.namespace, name);
                }

                if !self.generic_args.is_empty() {
                    let args = self
                        .generic_args
                        .iter()
                        .map(TypeRef::full_name)
                        .collect::<Vec<_>>()
                        .join(", ");
                    name = format!("{}<{}>", name, args);
                }

                name
            }
        }
    }

    /// Whether a value whose runtime type is `source` can be stored in a
    /// slot declared as `self`.
    pub fn is_assignable_from(&self, source: &TypeRef) -> bool {
        if self == source || self.is_object() {
            return true;
        }

        if let Some(inner) = self.nullable_inner() {
            if inner == source {
                return true;
            }
        }

        if let (Some(target), Some(element)) = (self.array_element(), source.array_element()) {
            return !element.is_value_type() && target.is_assignable_from(element);
        }

        source.ancestry().any(|ty| ty == self || ty.implements(self))
    }

    fn implements(&self, interface: &TypeRef) -> bool {
        self.interfaces
            .iter()
            .any(|implemented| implemented == interface || implemented.implements(interface))
    }
}

impl std::ops::Deref for TypeRef {
    type Target = TypeDef;

    fn deref(&self) -> &TypeDef {
        &self.0
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &TypeRef) -> bool {
        if self.ptr_eq(other) {
            return true;
        }

        match (&self.kind, &other.kind) {
            (TypeKind::Array(left), TypeKind::Array(right)) => left == right,
            (TypeKind::Array(..), _) | (_, TypeKind::Array(..)) => false,
            _ => {
                self.namespace == other.namespace
                    && self.name == other.name
                    && self.declaring_type == other.declaring_type
                    && self.generic_args == other.generic_args
            }
        }
    }
}

impl Eq for TypeRef {}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.full_name())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}
