use super::Expression;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Let,
    Const,
    Var,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// A single statement of a code body.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Declare {
        kind: DeclarationKind,
        name: String,
        init: Option<Expression>,
    },
    Assign {
        target: String,
        op: AssignOp,
        value: Expression,
    },
    Expression(Expression),
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    For {
        init: Option<Box<Statement>>,
        condition: Option<Expression>,
        update: Option<Box<Statement>>,
        body: Box<Statement>,
    },
    Block(Vec<Statement>),
    Return(Option<Expression>),
    Break,
    Continue,
}

/// A parsed formula, condition or code body.
///
/// Formulas and conditions are a single implicit `Return`.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Statement>,
}

impl Program {
    pub fn implicit_return(expression: Expression) -> Self {
        Self {
            body: vec![Statement::Return(Some(expression))],
        }
    }

    /// The single expression of a formula program, if that is what this is.
    pub fn as_expression(&self) -> Option<&Expression> {
        match self.body.as_slice() {
            [Statement::Return(Some(expression))] => Some(expression),
            _ => None,
        }
    }

    /// Every name declared with `let`, `const` or `var` anywhere in the body.
    pub fn declared_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for statement in &self.body {
            statement.collect_declared(&mut names);
        }
        names
    }
}

impl Statement {
    fn collect_declared(&self, names: &mut BTreeSet<String>) {
        match self {
            Statement::Declare { name, .. } => {
                names.insert(name.clone());
            }
            Statement::If {
                then_branch,
                else_branch,
                ..
            } => {
                then_branch.collect_declared(names);
                if let Some(else_branch) = else_branch {
                    else_branch.collect_declared(names);
                }
            }
            Statement::While { body, .. } => body.collect_declared(names),
            Statement::For {
                init, update, body, ..
            } => {
                for part in [init, update].into_iter().flatten() {
                    part.collect_declared(names);
                }
                body.collect_declared(names);
            }
            Statement::Block(statements) => {
                for statement in statements {
                    statement.collect_declared(names);
                }
            }
            Statement::Assign { .. }
            | Statement::Expression(_)
            | Statement::Return(_)
            | Statement::Break
            | Statement::Continue => {}
        }
    }
}
