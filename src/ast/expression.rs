use super::{Builtin, Value};
use std::fmt;

/// The Abstract Syntax Tree of a single expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    // Arithmetic
    Sum(Box<Expression>, Box<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
    Multiply(Box<Expression>, Box<Expression>),
    Divide(Box<Expression>, Box<Expression>),
    Remainder(Box<Expression>, Box<Expression>),
    Power(Box<Expression>, Box<Expression>),
    Negate(Box<Expression>),
    Plus(Box<Expression>),

    // Logical
    Not(Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Conditional(Box<Expression>, Box<Expression>, Box<Expression>),

    // Comparison
    Equal(Box<Expression>, Box<Expression>),
    NotEqual(Box<Expression>, Box<Expression>),
    GreaterThan(Box<Expression>, Box<Expression>),
    GreaterThanOrEqual(Box<Expression>, Box<Expression>),
    SmallerThan(Box<Expression>, Box<Expression>),
    SmallerThanOrEqual(Box<Expression>, Box<Expression>),

    // Access and calls
    Member(Box<Expression>, String),
    Index(Box<Expression>, Box<Expression>),
    Call(Builtin, Vec<Expression>),
    /// A call whose callee is not an allow-listed builtin. Always a type error at runtime.
    Apply(Box<Expression>, Vec<Expression>),

    // Constructors
    List(Vec<Expression>),
    Record(Vec<(String, Expression)>),

    // Leaf nodes
    Literal(Value),
    Variable(String),
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_with_precedence(f, 0)
    }
}

impl Expression {
    /// Gets the precedence level for an expression type. Higher numbers bind more tightly.
    fn precedence(&self) -> u8 {
        match self {
            Expression::Conditional(_, _, _) => 1,
            Expression::Or(_, _) => 2,
            Expression::And(_, _) => 3,
            Expression::Equal(_, _) | Expression::NotEqual(_, _) => 4,
            Expression::GreaterThan(_, _)
            | Expression::GreaterThanOrEqual(_, _)
            | Expression::SmallerThan(_, _)
            | Expression::SmallerThanOrEqual(_, _) => 5,
            Expression::Sum(_, _) | Expression::Subtract(_, _) => 6,
            Expression::Multiply(_, _) | Expression::Divide(_, _) | Expression::Remainder(_, _) => {
                7
            }
            Expression::Not(_) | Expression::Negate(_) | Expression::Plus(_) => 8,
            Expression::Power(_, _) => 9,
            Expression::Member(_, _)
            | Expression::Index(_, _)
            | Expression::Call(_, _)
            | Expression::Apply(_, _) => 10,
            Expression::List(_)
            | Expression::Record(_)
            | Expression::Literal(_)
            | Expression::Variable(_) => 11,
        }
    }

    /// Recursively formats the expression, adding parentheses only when necessary.
    fn fmt_with_precedence(&self, f: &mut fmt::Formatter<'_>, parent_precedence: u8) -> fmt::Result {
        let current_precedence = self.precedence();
        let needs_parens = current_precedence < parent_precedence;

        if needs_parens {
            write!(f, "(")?;
        }

        match self {
            Expression::Sum(l, r) => self.fmt_binary(f, "+", l, r)?,
            Expression::Subtract(l, r) => self.fmt_binary(f, "-", l, r)?,
            Expression::Multiply(l, r) => self.fmt_binary(f, "*", l, r)?,
            Expression::Divide(l, r) => self.fmt_binary(f, "/", l, r)?,
            Expression::Remainder(l, r) => self.fmt_binary(f, "%", l, r)?,
            Expression::Power(l, r) => {
                // Right associative: the left operand needs parens at equal precedence.
                l.fmt_with_precedence(f, current_precedence + 1)?;
                write!(f, " ** ")?;
                r.fmt_with_precedence(f, current_precedence)?;
            }
            Expression::And(l, r) => self.fmt_binary(f, "&&", l, r)?,
            Expression::Or(l, r) => self.fmt_binary(f, "||", l, r)?,
            Expression::Equal(l, r) => self.fmt_binary(f, "==", l, r)?,
            Expression::NotEqual(l, r) => self.fmt_binary(f, "!=", l, r)?,
            Expression::GreaterThan(l, r) => self.fmt_binary(f, ">", l, r)?,
            Expression::GreaterThanOrEqual(l, r) => self.fmt_binary(f, ">=", l, r)?,
            Expression::SmallerThan(l, r) => self.fmt_binary(f, "<", l, r)?,
            Expression::SmallerThanOrEqual(l, r) => self.fmt_binary(f, "<=", l, r)?,
            Expression::Conditional(c, t, e) => {
                c.fmt_with_precedence(f, current_precedence + 1)?;
                write!(f, " ? ")?;
                t.fmt_with_precedence(f, current_precedence)?;
                write!(f, " : ")?;
                e.fmt_with_precedence(f, current_precedence)?;
            }

            // Unary operators
            Expression::Not(v) => {
                write!(f, "!")?;
                v.fmt_with_precedence(f, current_precedence)?;
            }
            // `- -x` must not print as `--x`, which lexes as a decrement.
            Expression::Negate(v) => {
                write!(f, "-")?;
                let floor = if matches!(**v, Expression::Negate(_)) { u8::MAX } else { current_precedence };
                v.fmt_with_precedence(f, floor)?;
            }
            Expression::Plus(v) => {
                write!(f, "+")?;
                let floor = if matches!(**v, Expression::Plus(_)) { u8::MAX } else { current_precedence };
                v.fmt_with_precedence(f, floor)?;
            }

            Expression::Member(target, name) => {
                target.fmt_with_precedence(f, current_precedence)?;
                write!(f, ".{}", name)?;
            }
            Expression::Index(target, index) => {
                target.fmt_with_precedence(f, current_precedence)?;
                write!(f, "[{}]", index)?;
            }
            Expression::Call(builtin, args) => {
                write!(f, "{}", builtin)?;
                Self::fmt_list(f, "(", args, ")")?;
            }
            Expression::Apply(callee, args) => {
                callee.fmt_with_precedence(f, current_precedence)?;
                Self::fmt_list(f, "(", args, ")")?;
            }
            Expression::List(items) => Self::fmt_list(f, "[", items, "]")?,
            Expression::Record(fields) => {
                write!(f, "{{ ")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, " }}")?;
            }

            // Leaf nodes
            Expression::Literal(Value::Str(s)) => write!(f, "{:?}", s)?,
            Expression::Literal(v) => write!(f, "{}", v)?,
            Expression::Variable(name) => write!(f, "{}", name)?,
        }

        if needs_parens {
            write!(f, ")")?;
        }
        Ok(())
    }

    /// Helper function to format a left-associative binary expression.
    fn fmt_binary(
        &self,
        f: &mut fmt::Formatter<'_>,
        op: &str,
        l: &Expression,
        r: &Expression,
    ) -> fmt::Result {
        let precedence = self.precedence();
        l.fmt_with_precedence(f, precedence)?;
        write!(f, " {} ", op)?;
        r.fmt_with_precedence(f, precedence + 1)
    }

    fn fmt_list(
        f: &mut fmt::Formatter<'_>,
        open: &str,
        items: &[Expression],
        close: &str,
    ) -> fmt::Result {
        write!(f, "{}", open)?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", item)?;
        }
        write!(f, "{}", close)
    }
}
