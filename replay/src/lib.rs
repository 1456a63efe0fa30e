//! Turns captured service calls back into the code that makes them.

use replay_codegen::{CodeUnit, ObjectGenerator, Statement, TypeResolver};
use replay_model::{OperationInfo, OperationProvider, SerializationInfo};
use replay_trace::ParsedMessage;

pub mod error;

pub use replay_codegen as codegen;
pub use replay_deserializer as deserializer;
pub use replay_model as model;
pub use replay_trace as trace;

use error::Error;

/// One line describing where and when a message was captured.
pub fn summary(message: &ParsedMessage) -> String {
    format!(
        "{} [{}] {}",
        message.timestamp.to_rfc3339(),
        message.side,
        message.soap_action
    )
}

/// Rebuilds the arguments of one captured request: a comment naming the
/// capture, then one variable per formal parameter, named after it.
/// Temporaries are numbered across all parameters, since they share a scope.
pub fn generate_call(
    message: &ParsedMessage,
    operation: &OperationInfo,
    info: &dyn SerializationInfo,
    resolver: &mut dyn TypeResolver,
) -> Result<CodeUnit, Error> {
    let parameters = replay_deserializer::deserialize_input_parameters(message, operation, info)?;
    let mut statements = vec![Statement::Comment(format!(
        "{} {}",
        message.timestamp.to_rfc3339(),
        message.soap_action
    ))];

    {
        let mut generator = ObjectGenerator::new(info, &mut *resolver);
        for parameter in &parameters {
            generator.append_object(
                &mut statements,
                &parameter.name,
                &parameter.parameter_type,
                &parameter.value,
            )?;
        }
    }

    tracing::debug!(
        operation = %operation.name,
        parameters = parameters.len(),
        "generated call"
    );

    Ok(CodeUnit::new(resolver.imports(), statements))
}

/// Like [`generate_call`], looking the operation up by the captured action.
pub fn generate_message(
    message: &ParsedMessage,
    operations: &dyn OperationProvider,
    info: &dyn SerializationInfo,
    resolver: &mut dyn TypeResolver,
) -> Result<CodeUnit, Error> {
    let operation = operations
        .find_operation(&message.soap_action)
        .ok_or_else(|| Error::UnknownOperation(message.soap_action.clone()))?;

    generate_call(message, operation, info, resolver)
}
