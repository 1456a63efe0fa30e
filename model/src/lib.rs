pub mod error;
pub mod info;
pub mod known;
pub mod operation;
pub mod types;
pub mod value;

pub use info::{MetadataInfo, SerializationInfo};
pub use operation::{
    BodyStyle, Direction, OperationInfo, OperationProvider, ParameterInfo, ServiceContract,
};
pub use types::{Member, MemberLocation, MessageContract, Primitive, TypeDef, TypeKind, TypeRef};
pub use value::{ObjectRef, Value};
