use replay_model::{
    known, BodyStyle, Direction, MemberLocation, ObjectRef, OperationInfo, ParameterInfo,
    SerializationInfo, TypeRef, Value,
};
use replay_trace::{CaptureSide, ParsedMessage};
use replay_util::xml::XmlElement;

mod data_set;
mod decode;
mod text;

pub mod error;

pub use decode::Decoder;

/// One formal parameter of a captured call, with the value the request
/// carried for it.
#[derive(Debug, Clone)]
pub struct CallParameterInfo {
    pub name: String,
    pub parameter_type: TypeRef,
    pub direction: Direction,
    /// `Null` when the request held nothing for the parameter.
    pub value: Value,
}

/// Reads the value of every formal parameter of `operation` from the
/// request, in declaration order.
pub fn deserialize_input_parameters(
    message: &ParsedMessage,
    operation: &OperationInfo,
    info: &dyn SerializationInfo,
) -> Result<Vec<CallParameterInfo>, error::Error> {
    let decoder = Decoder::new(info, &operation.known_types);
    let request = Request {
        header: message.header(),
        body: message.body(),
        streamed: message.side == CaptureSide::Service && operation.is_streamed(),
    };

    if request.streamed {
        tracing::debug!(operation = %operation.name, "streamed service-side capture, body parts are unavailable");
    }

    let mut position = 0;
    let mut parameters = Vec::with_capacity(operation.parameters.len());

    for parameter in &operation.parameters {
        let value = match parameter.direction {
            Direction::Out => Value::Null,
            Direction::In | Direction::Ref => {
                let value = request.parameter_value(&decoder, info, operation, parameter, position)?;
                position += 1;
                value
            }
        };

        tracing::debug!(
            parameter = %parameter.name,
            direction = ?parameter.direction,
            found = !value.is_null(),
            "deserialized parameter"
        );

        parameters.push(CallParameterInfo {
            name: parameter.name.clone(),
            parameter_type: parameter.ty.clone(),
            direction: parameter.direction,
            value,
        });
    }

    Ok(parameters)
}

struct Request<'a> {
    header: Option<&'a XmlElement>,
    body: Option<&'a XmlElement>,
    streamed: bool,
}

impl<'a> Request<'a> {
    fn parameter_value(
        &self,
        decoder: &Decoder<'_>,
        info: &dyn SerializationInfo,
        operation: &OperationInfo,
        parameter: &ParameterInfo,
        position: usize,
    ) -> Result<Value, error::Error> {
        if parameter.ty.message_contract.is_some() {
            return self.message_contract_value(decoder, info, &parameter.ty);
        }

        if self.streamed {
            return Ok(Value::Null);
        }

        let element = self.locate(operation, parameter, position);

        if parameter.direction == Direction::Ref && parameter.ty.is_object() {
            return Ok(match element {
                Some(element) => Value::String(element.text()),
                None => Value::Object(ObjectRef::new(known::object())),
            });
        }

        match element {
            Some(element) => decoder.decode(element, &parameter.ty),
            None => {
                tracing::debug!(parameter = %parameter.name, "no element in the request body");
                Ok(Value::Null)
            }
        }
    }

    fn locate(
        &self,
        operation: &OperationInfo,
        parameter: &ParameterInfo,
        position: usize,
    ) -> Option<&'a XmlElement> {
        let body = self.body?;

        match &operation.body_style {
            BodyStyle::Bare => body.elements().nth(position),
            BodyStyle::Wrapped { name, namespace } => {
                let wrapper_name = name.as_deref().unwrap_or(&operation.name);
                let wrapper = body
                    .elements()
                    .find(|element| element.is(wrapper_name, namespace.as_deref()))
                    .or_else(|| body.first_element())?;

                find_part(wrapper, parameter.element_name(), parameter.namespace.as_deref())
            }
        }
    }

    /// Header members come from the SOAP header, body members from the
    /// contract's wrapper element or straight from the body.
    fn message_contract_value(
        &self,
        decoder: &Decoder<'_>,
        info: &dyn SerializationInfo,
        ty: &TypeRef,
    ) -> Result<Value, error::Error> {
        let body_root = match &ty.message_contract {
            Some(contract) if contract.is_wrapped => {
                let wrapper_name = contract.wrapper_name.as_deref().unwrap_or(&ty.name);
                self.body.and_then(|body| {
                    body.elements()
                        .find(|element| element.is(wrapper_name, contract.wrapper_namespace.as_deref()))
                })
            }
            _ => self.body,
        };

        let object = ObjectRef::new(ty.clone());

        for member in info.serializable_members(ty) {
            let container = match member.location {
                MemberLocation::Header => self.header,
                MemberLocation::Body if self.streamed => None,
                MemberLocation::Body => body_root,
            };

            let value = match container
                .and_then(|container| find_part(container, member.element_name(), member.namespace.as_deref()))
            {
                Some(element) => decoder.decode(element, &member.ty)?,
                None => Value::Null,
            };

            object.set(&member.name, value);
        }

        Ok(Value::Object(object))
    }
}

/// A namespace only narrows the match when one was configured.
fn find_part<'a>(
    container: &'a XmlElement,
    name: &str,
    namespace: Option<&str>,
) -> Option<&'a XmlElement> {
    container
        .elements()
        .find(|element| element.is(name, namespace))
}
