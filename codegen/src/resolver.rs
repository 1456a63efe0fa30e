use std::collections::HashMap;

use replay_model::{Primitive, TypeKind, TypeRef};

/// Turns types into the text used to reference them in generated code.
pub trait TypeResolver {
    fn resolve(&mut self, ty: &TypeRef) -> String;

    /// Namespaces the references handed out so far depend on.
    fn imports(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Always emits namespace-qualified names.
#[derive(Debug, Default, Clone, Copy)]
pub struct FullyQualified;

/// Emits short names and records the namespaces to import for them. A
/// short name already claimed by another namespace stays qualified.
#[derive(Debug, Default, Clone)]
pub struct ImportTracking {
    imports: Vec<String>,
    claimed: HashMap<String, String>,
}

fn keyword(ty: &TypeRef) -> Option<&'static str> {
    let keyword = match &ty.kind {
        TypeKind::Object => "object",
        TypeKind::Primitive(primitive) => match primitive {
            Primitive::Boolean => "bool",
            Primitive::Byte => "byte",
            Primitive::SByte => "sbyte",
            Primitive::Int16 => "short",
            Primitive::UInt16 => "ushort",
            Primitive::Int32 => "int",
            Primitive::UInt32 => "uint",
            Primitive::Int64 => "long",
            Primitive::UInt64 => "ulong",
            Primitive::Single => "float",
            Primitive::Double => "double",
            Primitive::Decimal => "decimal",
            Primitive::Char => "char",
            Primitive::String => "string",
            _ => return None,
        },
        _ => return None,
    };

    Some(keyword)
}

/// Keywords, arrays and generic arguments are handled the same by every
/// strategy; `name` renders the (possibly nested) type name itself.
fn compose<R: TypeResolver + ?Sized>(
    resolver: &mut R,
    ty: &TypeRef,
    name: impl FnOnce(&mut R, &TypeRef) -> String,
) -> String {
    if let Some(keyword) = keyword(ty) {
        return keyword.to_owned();
    }

    if let Some(element) = ty.array_element() {
        return format!("{}[]", resolver.resolve(element));
    }

    let head = name(resolver, ty);
    if ty.generic_args.is_empty() {
        return head;
    }

    let arguments: Vec<String> = ty
        .generic_args
        .iter()
        .map(|argument| resolver.resolve(argument))
        .collect();

    format!("{}<{}>", head, arguments.join(", "))
}

fn qualified(ty: &TypeRef) -> String {
    let chain = ty.nesting_chain().join(".");
    if ty.namespace.is_empty() {
        chain
    } else {
        format!("{}.{}", ty.namespace, chain)
    }
}

impl TypeResolver for FullyQualified {
    fn resolve(&mut self, ty: &TypeRef) -> String {
        compose(self, ty, |_, ty| qualified(ty))
    }
}

impl ImportTracking {
    pub fn new() -> Self {
        Self::default()
    }

    fn short_name(&mut self, ty: &TypeRef) -> String {
        let chain = ty.nesting_chain();
        let outermost = chain.first().copied().unwrap_or_default();

        if ty.namespace.is_empty() {
            return chain.join(".");
        }

        match self.claimed.get(outermost) {
            Some(namespace) if *namespace != ty.namespace => {
                tracing::debug!(name = %outermost, "short name taken, qualifying");
                return qualified(ty);
            }
            Some(..) => (),
            None => {
                self.claimed
                    .insert(outermost.to_owned(), ty.namespace.clone());
            }
        }

        if !self.imports.contains(&ty.namespace) {
            self.imports.push(ty.namespace.clone());
        }

        chain.join(".")
    }
}

impl TypeResolver for ImportTracking {
    fn resolve(&mut self, ty: &TypeRef) -> String {
        compose(self, ty, Self::short_name)
    }

    fn imports(&self) -> Vec<String> {
        self.imports.clone()
    }
}
