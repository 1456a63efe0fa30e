/// Source-level expressions. Type names are already resolved to the text
/// that appears in the output.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Null,
    /// Literal source text, already escaped and suffixed.
    Literal(String),
    Variable(String),
    TypeReference(String),
    New {
        ty: String,
        arguments: Vec<Expression>,
    },
    /// `new T[size]`; for jagged element types the size goes in the first
    /// rank.
    NewArray {
        element: String,
        size: usize,
    },
    ArrayInit {
        element: String,
        items: Vec<Expression>,
    },
    Field {
        target: Box<Expression>,
        name: String,
    },
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
    },
    Call {
        target: Box<Expression>,
        method: String,
        arguments: Vec<Expression>,
    },
    Cast {
        ty: String,
        expression: Box<Expression>,
    },
    TypeOf(String),
    Binary {
        left: Box<Expression>,
        operator: &'static str,
        right: Box<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// A declaration without an initializer leaves the variable unassigned.
    Declare {
        ty: String,
        name: String,
        init: Option<Expression>,
    },
    Assign {
        target: Expression,
        value: Expression,
    },
    Expression(Expression),
    TryFinally {
        body: Vec<Statement>,
        finally: Vec<Statement>,
    },
    If {
        condition: Expression,
        then: Vec<Statement>,
    },
    Comment(String),
}

/// Statements plus the namespace imports they rely on.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CodeUnit {
    pub imports: Vec<String>,
    pub statements: Vec<Statement>,
}

impl Expression {
    pub fn variable(name: &str) -> Self {
        Expression::Variable(name.to_owned())
    }

    pub fn int(value: usize) -> Self {
        Expression::Literal(value.to_string())
    }

    pub fn field(self, name: &str) -> Self {
        Expression::Field {
            target: Box::new(self),
            name: name.to_owned(),
        }
    }

    pub fn index(self, index: Expression) -> Self {
        Expression::Index {
            target: Box::new(self),
            index: Box::new(index),
        }
    }

    pub fn call(self, method: &str, arguments: Vec<Expression>) -> Self {
        Expression::Call {
            target: Box::new(self),
            method: method.to_owned(),
            arguments,
        }
    }

    pub fn cast(ty: String, expression: Expression) -> Self {
        Expression::Cast {
            ty,
            expression: Box::new(expression),
        }
    }

    pub fn binary(left: Expression, operator: &'static str, right: Expression) -> Self {
        Expression::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }
}

impl Statement {
    pub fn declare(ty: String, name: &str, init: Expression) -> Self {
        Statement::Declare {
            ty,
            name: name.to_owned(),
            init: Some(init),
        }
    }

    pub fn assign(target: Expression, value: Expression) -> Self {
        Statement::Assign { target, value }
    }
}

impl CodeUnit {
    pub fn new(imports: Vec<String>, statements: Vec<Statement>) -> Self {
        Self {
            imports,
            statements,
        }
    }
}
