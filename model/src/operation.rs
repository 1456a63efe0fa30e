use super::types::{Family, MemberLocation, TypeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    Ref,
}

#[derive(Debug, Clone)]
pub struct ParameterInfo {
    pub name: String,
    pub ty: TypeRef,
    pub direction: Direction,
    pub xml_name: Option<String>,
    pub namespace: Option<String>,
}

/// How a request body lays out its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyStyle {
    /// Parts are children of one wrapper element, named after the operation
    /// unless overridden.
    Wrapped {
        name: Option<String>,
        namespace: Option<String>,
    },
    /// Each part is a direct child of the body.
    Bare,
}

#[derive(Debug, Clone)]
pub struct OperationInfo {
    pub name: String,
    pub action: Option<String>,
    pub parameters: Vec<ParameterInfo>,
    pub body_style: BodyStyle,
    /// Types that may appear in place of a declared type via `xsi:type`.
    pub known_types: Vec<TypeRef>,
}

#[derive(Debug, Clone)]
pub struct ServiceContract {
    pub name: String,
    pub namespace: String,
    pub operations: Vec<OperationInfo>,
}

/// Resolves the operation a captured message invoked.
pub trait OperationProvider {
    fn find_operation(&self, action: &str) -> Option<&OperationInfo>;
}

impl ParameterInfo {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self {
            name: name.to_owned(),
            ty,
            direction: Direction::In,
            xml_name: None,
            namespace: None,
        }
    }

    pub fn out(name: &str, ty: TypeRef) -> Self {
        Self {
            direction: Direction::Out,
            ..Self::new(name, ty)
        }
    }

    pub fn by_ref(name: &str, ty: TypeRef) -> Self {
        Self {
            direction: Direction::Ref,
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

    pub fn element_name(&self) -> &str {
        self.xml_name.as_deref().unwrap_or(&self.name)
    }
}

impl OperationInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            action: None,
            parameters: Vec::new(),
            body_style: BodyStyle::Wrapped {
                name: None,
                namespace: None,
            },
            known_types: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: &str) -> Self {
        self.action = Some(action.to_owned());
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterInfo) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_body_style(mut self, body_style: BodyStyle) -> Self {
        self.body_style = body_style;
        self
    }

    pub fn with_known_type(mut self, ty: TypeRef) -> Self {
        self.known_types.push(ty);
        self
    }

    /// Whether the request body travels as a stream.
    pub fn is_streamed(&self) -> bool {
        self.parameters
            .iter()
            .filter(|parameter| parameter.direction != Direction::Out)
            .any(|parameter| {
                is_stream(&parameter.ty)
                    || (parameter.ty.message_contract.is_some()
                        && parameter.ty.ancestry().any(|ty| {
                            ty.declared_members().iter().any(|member| {
                                member.location == MemberLocation::Body && is_stream(&member.ty)
                            })
                        }))
            })
    }
}

fn is_stream(ty: &TypeRef) -> bool {
    matches!(ty.family(), Some(Family::Stream | Family::MemoryStream))
}

impl ServiceContract {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            namespace: namespace.to_owned(),
            operations: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: OperationInfo) -> Self {
        self.operations.push(operation);
        self
    }

    /// The explicit action, else `{namespace}/{contract}/{operation}`.
    pub fn action_of(&self, operation: &OperationInfo) -> String {
        if let Some(action) = &operation.action {
            return action.clone();
        }

        let separator = if self.namespace.ends_with('/') { "" } else { "/" };
        format!(
            "{}{}{}/{}",
            self.namespace, separator, self.name, operation.name
        )
    }
}

impl OperationProvider for ServiceContract {
    fn find_operation(&self, action: &str) -> Option<&OperationInfo> {
        self.operations
            .iter()
            .find(|operation| self.action_of(operation) == action)
            .or_else(|| {
                self.operations
                    .iter()
                    .find(|operation| operation.action.as_deref() == Some("*"))
            })
    }
}

impl<T: OperationProvider> OperationProvider for [T] {
    fn find_operation(&self, action: &str) -> Option<&OperationInfo> {
        self.iter()
            .find_map(|provider| provider.find_operation(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::known;

    fn calculator() -> ServiceContract {
        ServiceContract::new("http://tempuri.org/", "ICalculator")
            .with_operation(
                OperationInfo::new("Add")
                    .with_parameter(ParameterInfo::new("a", known::int32()))
                    .with_parameter(ParameterInfo::new("b", known::int32())),
            )
            .with_operation(
                OperationInfo::new("Add")
                    .with_action("http://tempuri.org/ICalculator/AddDoubles")
                    .with_parameter(ParameterInfo::new("a", known::double())),
            )
    }

    #[test]
    fn overloads_resolve_by_action() {
        let contract = calculator();

        let ints = contract
            .find_operation("http://tempuri.org/ICalculator/Add")
            .unwrap();
        assert_eq!(ints.parameters.len(), 2);

        let doubles = contract
            .find_operation("http://tempuri.org/ICalculator/AddDoubles")
            .unwrap();
        assert_eq!(doubles.parameters[0].ty, known::double());

        assert!(contract.find_operation("http://tempuri.org/ICalculator/Sub").is_none());
    }

    #[test]
    fn default_action_inserts_separator() {
        let contract = ServiceContract::new("urn:calc", "ICalculator");
        assert_eq!(
            contract.action_of(&OperationInfo::new("Add")),
            "urn:calc/ICalculator/Add"
        );
    }

    #[test]
    fn catch_all_action_matches_anything_else() {
        let contracts = vec![
            calculator(),
            ServiceContract::new("urn:router", "IRouter")
                .with_operation(OperationInfo::new("Route").with_action("*")),
        ];

        assert_eq!(
            contracts.find_operation("urn:anything").unwrap().name,
            "Route"
        );
        assert_eq!(
            contracts
                .find_operation("http://tempuri.org/ICalculator/Add")
                .unwrap()
                .name,
            "Add"
        );
    }

    #[test]
    fn stream_parameters_make_the_operation_streamed() {
        let upload = OperationInfo::new("Upload")
            .with_parameter(ParameterInfo::new("name", known::string()))
            .with_parameter(ParameterInfo::new("data", known::stream()));

        assert!(upload.is_streamed());
        assert!(!OperationInfo::new("Ping").is_streamed());
    }

    #[test]
    fn response_streams_leave_the_request_buffered() {
        let download = OperationInfo::new("Download")
            .with_parameter(ParameterInfo::new("name", known::string()))
            .with_parameter(ParameterInfo::out("data", known::stream()));

        assert!(!download.is_streamed());
    }
}
