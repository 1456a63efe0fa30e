use replay_model::{
    known,
    types::{CollectionShape, Family},
    value::{ArrayValue, DataSetValue, DataTableValue},
    ObjectRef, SerializationInfo, TypeRef, Value,
};

use super::{
    classify::{classify, Classification},
    codegen::string_literal,
    error::Error,
    literal::literal,
    resolver::TypeResolver,
    types::{Expression, Statement},
};

const DEFAULT_DATA_SET_NAME: &str = "NewDataSet";

/// Emits statements that rebuild captured values.
///
/// Temporaries are named `temp0`, `temp1`, ... in the order they are
/// introduced. [`ObjectGenerator::generate_object`] restarts the numbering;
/// [`ObjectGenerator::append_object`] continues it, for several variables
/// sharing one scope.
pub struct ObjectGenerator<'a> {
    info: &'a dyn SerializationInfo,
    resolver: &'a mut dyn TypeResolver,
    temps: usize,
    /// Identities of the objects whose members are being generated.
    expanding: Vec<usize>,
}

impl<'a> ObjectGenerator<'a> {
    pub fn new(info: &'a dyn SerializationInfo, resolver: &'a mut dyn TypeResolver) -> Self {
        Self {
            info,
            resolver,
            temps: 0,
            expanding: Vec::new(),
        }
    }

    /// Appends statements declaring `name` as a rebuilt copy of `value` and
    /// returns the variable holding it.
    pub fn generate_object(
        &mut self,
        out: &mut Vec<Statement>,
        name: &str,
        declared: &TypeRef,
        value: &Value,
    ) -> Result<Expression, Error> {
        self.temps = 0;
        self.append_object(out, name, declared, value)
    }

    /// Like [`ObjectGenerator::generate_object`], but temporaries keep
    /// counting from those already emitted by this generator.
    pub fn append_object(
        &mut self,
        out: &mut Vec<Statement>,
        name: &str,
        declared: &TypeRef,
        value: &Value,
    ) -> Result<Expression, Error> {
        self.expanding.clear();

        self.declare(out, name, declared, value)?;
        Ok(Expression::variable(name))
    }

    fn resolve(&mut self, ty: &TypeRef) -> String {
        self.resolver.resolve(ty)
    }

    fn next_temp(&mut self) -> String {
        let name = format!("temp{}", self.temps);
        self.temps += 1;
        name
    }

    fn literal(&mut self, value: &Value) -> Result<Expression, Error> {
        literal(&mut *self.resolver, value)
    }

    /// The declared type, unless it says nothing about the value.
    fn slot_type(&mut self, declared: &TypeRef, value: &Value) -> String {
        match value.runtime_type() {
            Some(runtime) if declared.is_object() || declared.is_interface() => {
                self.resolve(&runtime)
            }
            _ => self.resolve(declared),
        }
    }

    fn runtime_type(&mut self, declared: &TypeRef, value: &Value) -> String {
        let runtime = value.runtime_type().unwrap_or_else(|| declared.clone());
        self.resolve(&runtime)
    }

    fn is_simple(&self, value: &Value) -> bool {
        value
            .runtime_type()
            .map_or(false, |runtime| self.info.is_simple_type(&runtime))
    }

    fn declare(
        &mut self,
        out: &mut Vec<Statement>,
        name: &str,
        declared: &TypeRef,
        value: &Value,
    ) -> Result<(), Error> {
        let classification = classify(self.info, declared, value)?;
        tracing::debug!(%name, %declared, ?classification, "declaring");

        self.declare_classified(out, name, declared, value, classification)
    }

    fn declare_classified(
        &mut self,
        out: &mut Vec<Statement>,
        name: &str,
        declared: &TypeRef,
        value: &Value,
        classification: Classification,
    ) -> Result<(), Error> {
        match classification {
            Classification::Null | Classification::Stream => {
                let ty = self.resolve(declared);
                out.push(Statement::declare(ty, name, Expression::Null));
            }

            Classification::Absent => {
                let ty = self.resolve(declared);
                out.push(Statement::Declare {
                    ty,
                    name: name.to_owned(),
                    init: None,
                });
            }

            Classification::Simple => {
                let ty = self.slot_type(declared, value);
                let init = self.literal(value)?;
                out.push(Statement::declare(ty, name, init));
            }

            Classification::NullableWrapper(inner) => {
                let ty = self.resolve(declared);

                let init = if self.is_simple(value) {
                    Expression::cast(ty.clone(), self.literal(value)?)
                } else {
                    let temp = self.next_temp();
                    self.declare(out, &temp, &inner, value)?;
                    Expression::variable(&temp)
                };

                out.push(Statement::declare(ty, name, init));
            }

            Classification::MemoryStream => {
                let ty = self.slot_type(declared, value);
                let stream = self.runtime_type(declared, value);
                out.push(Statement::declare(
                    ty,
                    name,
                    Expression::New {
                        ty: stream,
                        arguments: vec![],
                    },
                ));
            }

            Classification::XmlNode => {
                let init = self.xml_document(out, value)?;
                let ty = self.slot_type(declared, value);
                out.push(Statement::declare(ty, name, init));
            }

            Classification::Array(..) | Classification::XmlNodeArray => match value {
                Value::Array(array) => self.array(out, name, array)?,
                other => return Err(unexpected("an array", other)),
            },

            Classification::Tabular(family) => self.tabular(out, name, family, value)?,

            Classification::Collection(..)
            | Classification::CollectionWithExtraMembers(..)
            | Classification::EnumerableOnly
            | Classification::Compound => match value {
                Value::Object(object) => self.object(out, name, &classification, object)?,
                other => return Err(unexpected("an object", other)),
            },
        }

        Ok(())
    }

    /// An expression for `value` in a slot of type `declared`, introducing a
    /// temporary when the value cannot be written inline. `None` means the
    /// slot has no value to assign.
    fn inline(
        &mut self,
        out: &mut Vec<Statement>,
        declared: &TypeRef,
        value: &Value,
    ) -> Result<Option<Expression>, Error> {
        let classification = classify(self.info, declared, value)?;

        let expression = match classification {
            Classification::Absent => return Ok(None),
            Classification::Null | Classification::Stream => Expression::Null,
            Classification::Simple => self.literal(value)?,

            Classification::NullableWrapper(..) if self.is_simple(value) => {
                let ty = self.resolve(declared);
                Expression::cast(ty, self.literal(value)?)
            }

            Classification::MemoryStream => Expression::New {
                ty: self.runtime_type(declared, value),
                arguments: vec![],
            },

            Classification::XmlNode => self.xml_document(out, value)?,

            classification => {
                let temp = self.next_temp();
                self.declare_classified(out, &temp, declared, value, classification)?;
                Expression::variable(&temp)
            }
        };

        Ok(Some(expression))
    }

    /// Loads the node into a fresh document and refers to its root.
    fn xml_document(&mut self, out: &mut Vec<Statement>, value: &Value) -> Result<Expression, Error> {
        let element = match value {
            Value::Xml(element) => element,
            other => return Err(unexpected("an XML node", other)),
        };

        let document = self.next_temp();
        let ty = self.resolve(&known::xml_document());

        out.push(Statement::declare(
            ty.clone(),
            &document,
            Expression::New {
                ty,
                arguments: vec![],
            },
        ));
        out.push(Statement::Expression(Expression::variable(&document).call(
            "LoadXml",
            vec![Expression::Literal(string_literal(&element.to_xml_string()?))],
        )));

        Ok(Expression::variable(&document).field("DocumentElement"))
    }

    fn array(&mut self, out: &mut Vec<Statement>, name: &str, array: &ArrayValue) -> Result<(), Error> {
        let ty = self.resolve(&known::array(array.element.clone()));
        let element = self.resolve(&array.element);

        out.push(Statement::declare(
            ty,
            name,
            Expression::NewArray {
                element,
                size: array.items.len(),
            },
        ));

        for (index, item) in array.items.iter().enumerate() {
            if let Some(expression) = self.inline(out, &array.element, item)? {
                out.push(Statement::assign(
                    Expression::variable(name).index(Expression::int(index)),
                    expression,
                ));
            }
        }

        Ok(())
    }

    fn object(
        &mut self,
        out: &mut Vec<Statement>,
        name: &str,
        classification: &Classification,
        object: &ObjectRef,
    ) -> Result<(), Error> {
        let runtime = object.ty();

        if self.expanding.contains(&object.id()) {
            return Err(Error::User(format!(
                "The value of type {} refers back to itself; cyclic structure is not supported.",
                runtime
            )));
        }

        let ty = self.resolve(&runtime);
        out.push(Statement::declare(
            ty.clone(),
            name,
            Expression::New {
                ty,
                arguments: vec![],
            },
        ));

        self.expanding.push(object.id());
        let result = self.populate(out, name, classification, object, &runtime);
        self.expanding.pop();

        result
    }

    fn populate(
        &mut self,
        out: &mut Vec<Statement>,
        name: &str,
        classification: &Classification,
        object: &ObjectRef,
        runtime: &TypeRef,
    ) -> Result<(), Error> {
        let target = Expression::variable(name);
        let (items, entries) = {
            let object = object.borrow();
            (object.items.clone(), object.entries.clone())
        };

        let shape = match classification {
            Classification::Collection(shape) | Classification::CollectionWithExtraMembers(shape) => {
                Some(shape.clone())
            }
            Classification::EnumerableOnly => Some(CollectionShape::Items(None)),
            _ => None,
        };

        match shape {
            Some(CollectionShape::Items(item)) => {
                let item = item.unwrap_or_else(known::object);

                for value in &items {
                    let value = self.element(out, &item, value)?;
                    out.push(Statement::Expression(target.clone().call("Add", vec![value])));
                }
            }

            Some(CollectionShape::Entries(entry)) => {
                let (key_type, value_type) =
                    entry.unwrap_or_else(|| (known::object(), known::object()));

                for (key, value) in &entries {
                    let key = self.element(out, &key_type, key)?;
                    let value = self.element(out, &value_type, value)?;
                    out.push(Statement::Expression(target.clone().call("Add", vec![key, value])));
                }
            }

            None => (),
        }

        if matches!(
            classification,
            Classification::Compound | Classification::CollectionWithExtraMembers(..)
        ) {
            for member in self.info.serializable_members(runtime) {
                // Members the capture did not carry keep their constructed value.
                let value = match object.get(&member.name) {
                    Some(value) => value,
                    None => continue,
                };

                if let Some(expression) = self.inline(out, &member.ty, &value)? {
                    out.push(Statement::assign(target.clone().field(&member.name), expression));
                }
            }
        }

        Ok(())
    }

    fn element(
        &mut self,
        out: &mut Vec<Statement>,
        declared: &TypeRef,
        value: &Value,
    ) -> Result<Expression, Error> {
        self.inline(out, declared, value)?.ok_or_else(|| {
            Error::InvalidOperation(format!(
                "A collection element of type {} has no value.",
                declared
            ))
        })
    }

    /// Data containers are disposable, so they are filled through a
    /// temporary that is disposed unless ownership reached `name`.
    fn tabular(
        &mut self,
        out: &mut Vec<Statement>,
        name: &str,
        family: Family,
        value: &Value,
    ) -> Result<(), Error> {
        let runtime = value
            .runtime_type()
            .ok_or_else(|| unexpected("a data container", value))?;
        let ty = self.resolve(&runtime);
        let temp = self.next_temp();

        out.push(Statement::declare(ty.clone(), name, Expression::Null));
        out.push(Statement::declare(ty, &temp, Expression::Null));

        let mut body = Vec::new();
        match (family, value) {
            (Family::DataSet, Value::DataSet(data_set)) => {
                self.data_set(&mut body, &temp, data_set)?
            }
            (Family::DataTable, Value::DataTable(table)) => {
                self.data_table(&mut body, &temp, table)?
            }
            (_, other) => return Err(unexpected("a data container", other)),
        }

        body.push(Statement::assign(
            Expression::variable(name),
            Expression::variable(&temp),
        ));
        body.push(Statement::assign(Expression::variable(&temp), Expression::Null));

        let finally = vec![Statement::If {
            condition: Expression::binary(Expression::variable(&temp), "!=", Expression::Null),
            then: vec![Statement::Expression(
                Expression::variable(&temp).call("Dispose", vec![]),
            )],
        }];

        out.push(Statement::TryFinally { body, finally });
        Ok(())
    }

    fn data_set(
        &mut self,
        body: &mut Vec<Statement>,
        temp: &str,
        data_set: &DataSetValue,
    ) -> Result<(), Error> {
        // Typed data sets create their own tables and columns.
        let typed = data_set.ty != known::data_set();
        let target = Expression::variable(temp);

        let arguments = if typed || data_set.name.is_empty() || data_set.name == DEFAULT_DATA_SET_NAME {
            vec![]
        } else {
            vec![Expression::Literal(string_literal(&data_set.name))]
        };

        body.push(Statement::assign(
            target.clone(),
            Expression::New {
                ty: self.resolve(&data_set.ty),
                arguments,
            },
        ));
        let locale = self.culture(&data_set.locale);
        body.push(Statement::assign(target.clone().field("Locale"), locale));

        for (index, table) in data_set.tables.iter().enumerate() {
            let tables = target.clone().field("Tables");

            if !typed {
                body.push(Statement::Expression(
                    tables.clone().call("Add", table_name_arguments(table)),
                ));
            }

            let table_target = tables.index(Expression::int(index));
            let locale = self.culture(&table.locale);
            body.push(Statement::assign(table_target.clone().field("Locale"), locale));

            self.table_contents(body, &table_target, table, !typed)?;
        }

        Ok(())
    }

    fn data_table(
        &mut self,
        body: &mut Vec<Statement>,
        temp: &str,
        table: &DataTableValue,
    ) -> Result<(), Error> {
        let typed = table.ty != known::data_table();
        let target = Expression::variable(temp);

        let arguments = if typed {
            vec![]
        } else {
            table_name_arguments(table)
        };

        body.push(Statement::assign(
            target.clone(),
            Expression::New {
                ty: self.resolve(&table.ty),
                arguments,
            },
        ));
        let locale = self.culture(&table.locale);
        body.push(Statement::assign(target.clone().field("Locale"), locale));

        self.table_contents(body, &target, table, !typed)
    }

    fn table_contents(
        &mut self,
        body: &mut Vec<Statement>,
        target: &Expression,
        table: &DataTableValue,
        with_columns: bool,
    ) -> Result<(), Error> {
        if with_columns {
            for column in &table.columns {
                let ty = self.resolve(&column.ty);
                body.push(Statement::Expression(target.clone().field("Columns").call(
                    "Add",
                    vec![
                        Expression::Literal(string_literal(&column.name)),
                        Expression::TypeOf(ty),
                    ],
                )));
            }
        }

        let object = self.resolve(&known::object());

        for row in &table.rows {
            let mut cells = Vec::with_capacity(row.len());
            for cell in row {
                cells.push(self.cell(body, cell)?);
            }

            body.push(Statement::Expression(target.clone().field("Rows").call(
                "Add",
                vec![Expression::ArrayInit {
                    element: object.clone(),
                    items: cells,
                }],
            )));
        }

        Ok(())
    }

    /// Null and DB-null cells both become `DBNull.Value`.
    fn cell(&mut self, body: &mut Vec<Statement>, value: &Value) -> Result<Expression, Error> {
        match value {
            Value::Null | Value::DbNull => self.literal(&Value::DbNull),
            value => Ok(self
                .inline(body, &known::object(), value)?
                .unwrap_or(Expression::Null)),
        }
    }

    fn culture(&mut self, locale: &str) -> Expression {
        let ty = self.resolve(&known::culture_info());

        if locale.is_empty() {
            Expression::TypeReference(ty).field("InvariantCulture")
        } else {
            Expression::New {
                ty,
                arguments: vec![Expression::Literal(string_literal(locale))],
            }
        }
    }
}

fn table_name_arguments(table: &DataTableValue) -> Vec<Expression> {
    if table.has_default_name() {
        vec![]
    } else if table.namespace.is_empty() {
        vec![Expression::Literal(string_literal(&table.name))]
    } else {
        vec![
            Expression::Literal(string_literal(&table.name)),
            Expression::Literal(string_literal(&table.namespace)),
        ]
    }
}

fn unexpected(expected: &str, value: &Value) -> Error {
    Error::InvalidOperation(format!("Expected {} but found {:?}.", expected, value))
}
