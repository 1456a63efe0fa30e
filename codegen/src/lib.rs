mod classify;
mod generator;
mod literal;

pub mod codegen;
pub mod error;
pub mod resolver;
pub mod types;

pub use classify::{classify, Classification};
pub use codegen::render;
pub use generator::ObjectGenerator;
pub use resolver::{FullyQualified, ImportTracking, TypeResolver};
pub use types::{CodeUnit, Expression, Statement};
