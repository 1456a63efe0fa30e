pub mod error;
pub mod xml;
