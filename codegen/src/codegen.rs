//! C# rendering of the statement model.

use std::fmt::Write;

use super::types::{CodeUnit, Expression, Statement};

const INDENT: &str = "    ";

pub trait Codegen {
    fn codegen(&self, out: &mut CodeWriter);
}

#[derive(Debug, Default)]
pub struct CodeWriter {
    out: String,
    depth: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }

        self.out.push_str(text);
        self.out.push('\n');
    }

    fn block(&mut self, statements: &[Statement]) {
        self.depth += 1;
        codegen_all(statements, self);
        self.depth -= 1;
    }
}

fn codegen_all(all: &[impl Codegen], out: &mut CodeWriter) {
    for item in all {
        item.codegen(out);
    }
}

/// Renders anything with a C# form into a string.
pub fn render(item: &impl Codegen) -> String {
    let mut out = CodeWriter::new();
    item.codegen(&mut out);
    out.into_string()
}

impl Codegen for CodeUnit {
    fn codegen(&self, out: &mut CodeWriter) {
        for import in &self.imports {
            out.line(&format!("using {};", import));
        }

        if !self.imports.is_empty() && !self.statements.is_empty() {
            out.line("");
        }

        codegen_all(&self.statements, out);
    }
}

impl Codegen for Statement {
    fn codegen(&self, out: &mut CodeWriter) {
        match self {
            Statement::Declare { ty, name, init } => match init {
                Some(init) => out.line(&format!("{} {} = {};", ty, name, expression(init))),
                None => out.line(&format!("{} {};", ty, name)),
            },

            Statement::Assign { target, value } => {
                out.line(&format!("{} = {};", expression(target), expression(value)))
            }

            Statement::Expression(value) => out.line(&format!("{};", expression(value))),

            Statement::TryFinally { body, finally } => {
                out.line("try {");
                out.block(body);
                out.line("}");
                out.line("finally {");
                out.block(finally);
                out.line("}");
            }

            Statement::If { condition, then } => {
                out.line(&format!("if ({}) {{", expression(condition)));
                out.block(then);
                out.line("}");
            }

            Statement::Comment(text) => {
                for line in text.lines() {
                    out.line(&format!("// {}", line));
                }
            }
        }
    }
}

pub fn expression(value: &Expression) -> String {
    let mut out = String::new();
    write_expression(&mut out, value);
    out
}

fn write_arguments(out: &mut String, arguments: &[Expression]) {
    for (index, argument) in arguments.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }

        write_expression(out, argument);
    }
}

fn write_expression(out: &mut String, value: &Expression) {
    match value {
        Expression::Null => out.push_str("null"),

        Expression::Literal(text) | Expression::Variable(text) | Expression::TypeReference(text) => {
            out.push_str(text)
        }

        Expression::New { ty, arguments } => {
            let _ = write!(out, "new {}(", ty);
            write_arguments(out, arguments);
            out.push(')');
        }

        Expression::NewArray { element, size } => match rank_start(element) {
            Some(rank) => {
                let _ = write!(out, "new {}[{}]{}", &element[..rank], size, &element[rank..]);
            }
            None => {
                let _ = write!(out, "new {}[{}]", element, size);
            }
        },

        Expression::ArrayInit { element, items } => {
            let _ = write!(out, "new {}[] {{", element);
            write_arguments(out, items);
            out.push('}');
        }

        Expression::Field { target, name } => {
            write_expression(out, target);
            let _ = write!(out, ".{}", name);
        }

        Expression::Index { target, index } => {
            write_expression(out, target);
            out.push('[');
            write_expression(out, index);
            out.push(']');
        }

        Expression::Call {
            target,
            method,
            arguments,
        } => {
            write_expression(out, target);
            let _ = write!(out, ".{}(", method);
            write_arguments(out, arguments);
            out.push(')');
        }

        Expression::Cast { ty, expression } => {
            let _ = write!(out, "(({})(", ty);
            write_expression(out, expression);
            out.push_str("))");
        }

        Expression::TypeOf(ty) => {
            let _ = write!(out, "typeof({})", ty);
        }

        Expression::Binary {
            left,
            operator,
            right,
        } => {
            out.push('(');
            write_expression(out, left);
            let _ = write!(out, " {} ", operator);
            write_expression(out, right);
            out.push(')');
        }
    }
}

/// Where the array ranks of a jagged element type begin, skipping any
/// generic argument list.
fn rank_start(element: &str) -> Option<usize> {
    let from = element.rfind('>').map_or(0, |end| end + 1);
    element[from..].find('[').map(|rank| from + rank)
}

/// A C# string literal.
pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');

    for character in text.chars() {
        match character {
            '"' => out.push_str("\\\""),
            _ => escape_common(&mut out, character),
        }
    }

    out.push('"');
    out
}

pub fn char_literal(character: char) -> String {
    let mut out = String::from("'");

    match character {
        '\'' => out.push_str("\\'"),
        _ => escape_common(&mut out, character),
    }

    out.push('\'');
    out
}

fn escape_common(out: &mut String, character: char) {
    match character {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\0' => out.push_str("\\0"),
        '\u{2028}' | '\u{2029}' => {
            let _ = write!(out, "\\u{:04x}", character as u32);
        }
        control if control.is_control() => {
            let _ = write!(out, "\\u{:04x}", control as u32);
        }
        other => out.push(other),
    }
}
