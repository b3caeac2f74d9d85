use super::Parser;
use crate::ast::{AssignOp, DeclarationKind, Expression, Statement, Value};
use crate::error::ParseError;
use crate::lexer::Tok;

impl Parser<'_> {
    pub(super) fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        self.enter()?;
        let statement = self.parse_statement_inner();
        self.leave();
        statement
    }

    fn parse_statement_inner(&mut self) -> Result<Statement, ParseError> {
        match self.peek() {
            Some(Tok::LBrace) => {
                self.advance();
                self.parse_block()
            }
            Some(Tok::Semicolon) => {
                self.advance();
                Ok(Statement::Block(Vec::new()))
            }
            Some(Tok::Ident(word)) => match word.as_str() {
                "let" | "const" | "var" => {
                    let declaration = self.parse_declaration()?;
                    self.end_statement()?;
                    Ok(declaration)
                }
                "if" => self.parse_if(),
                "while" => self.parse_while(),
                "for" => self.parse_for(),
                "return" => self.parse_return(),
                "break" | "continue" => self.parse_jump(),
                _ => self.parse_simple_terminated(),
            },
            _ => self.parse_simple_terminated(),
        }
    }

    /// Parses statements up to the closing brace (the opening one is already consumed).
    fn parse_block(&mut self) -> Result<Statement, ParseError> {
        let mut statements = Vec::new();
        while !self.eat(&Tok::RBrace) {
            if self.at_end() {
                return Err(self.unexpected_expecting(&Tok::RBrace));
            }
            statements.push(self.parse_statement()?);
        }
        Ok(Statement::Block(statements))
    }

    fn parse_declaration(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.current().map(|t| t.span);
        let kind = match self.peek_ident() {
            Some("const") => DeclarationKind::Const,
            Some("var") => DeclarationKind::Var,
            _ => DeclarationKind::Let,
        };
        self.advance();
        let name = self.expect_ident("a variable name")?;
        let init = if self.eat(&Tok::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        if kind == DeclarationKind::Const && init.is_none() {
            return Err(ParseError::new(
                format!("Missing initializer in const declaration '{}'", name),
                keyword.unwrap_or_default(),
            ));
        }
        Ok(Statement::Declare { kind, name, init })
    }

    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let condition = self.parse_parenthesized()?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.eat_keyword("else") {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let condition = self.parse_parenthesized()?;
        let body = Box::new(self.parse_loop_body()?);
        Ok(Statement::While { condition, body })
    }

    fn parse_for(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        self.expect(&Tok::LParen)?;

        let init = if self.check(&Tok::Semicolon) {
            None
        } else if matches!(self.peek_ident(), Some("let" | "const" | "var")) {
            Some(Box::new(self.parse_declaration()?))
        } else {
            Some(Box::new(self.parse_simple()?))
        };
        self.expect(&Tok::Semicolon)?;

        let condition = if self.check(&Tok::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&Tok::Semicolon)?;

        let update = if self.check(&Tok::RParen) {
            None
        } else {
            Some(Box::new(self.parse_simple()?))
        };
        self.expect(&Tok::RParen)?;

        let body = Box::new(self.parse_loop_body()?);
        Ok(Statement::For {
            init,
            condition,
            update,
            body,
        })
    }

    fn parse_loop_body(&mut self) -> Result<Statement, ParseError> {
        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        body
    }

    fn parse_return(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        let bare = match self.current() {
            None => true,
            Some(token) => {
                token.line_break_before || matches!(token.tok, Tok::Semicolon | Tok::RBrace)
            }
        };
        let value = if bare {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.end_statement()?;
        Ok(Statement::Return(value))
    }

    fn parse_jump(&mut self) -> Result<Statement, ParseError> {
        let Some(token) = self.advance() else {
            return Err(self.unexpected());
        };
        let is_break = token.ident() == Some("break");
        if self.loop_depth == 0 {
            let word = if is_break { "break" } else { "continue" };
            return Err(ParseError::new(
                format!("Illegal {} statement outside of a loop", word),
                token.span,
            ));
        }
        self.end_statement()?;
        Ok(if is_break {
            Statement::Break
        } else {
            Statement::Continue
        })
    }

    fn parse_parenthesized(&mut self) -> Result<Expression, ParseError> {
        self.expect(&Tok::LParen)?;
        let expression = self.parse_expression()?;
        self.expect(&Tok::RParen)?;
        Ok(expression)
    }

    fn parse_simple_terminated(&mut self) -> Result<Statement, ParseError> {
        let statement = self.parse_simple()?;
        self.end_statement()?;
        Ok(statement)
    }

    /// Assignment, `x++`/`x--`, or a bare expression.
    fn parse_simple(&mut self) -> Result<Statement, ParseError> {
        let target = self.peek_ident().filter(|name| {
            !crate::keywords::is_syntax_keyword(name) && !crate::keywords::is_literal_keyword(name)
        });
        if let Some(target) = target {
            let op = match self.peek_at(1) {
                Some(Tok::Assign) => Some(AssignOp::Set),
                Some(Tok::PlusAssign) => Some(AssignOp::Add),
                Some(Tok::MinusAssign) => Some(AssignOp::Subtract),
                Some(Tok::StarAssign) => Some(AssignOp::Multiply),
                Some(Tok::SlashAssign) => Some(AssignOp::Divide),
                _ => None,
            };
            if let Some(op) = op {
                self.pos += 2;
                let value = self.parse_expression()?;
                return Ok(Statement::Assign {
                    target: target.to_string(),
                    op,
                    value,
                });
            }

            let step = match self.peek_at(1) {
                Some(Tok::PlusPlus) => Some(AssignOp::Add),
                Some(Tok::MinusMinus) => Some(AssignOp::Subtract),
                _ => None,
            };
            if let Some(op) = step {
                self.pos += 2;
                return Ok(Statement::Assign {
                    target: target.to_string(),
                    op,
                    value: Expression::Literal(Value::Number(1.0)),
                });
            }
        }
        Ok(Statement::Expression(self.parse_expression()?))
    }

    /// Accepts `;`, or an implied terminator before `}`, a line break, or end of input.
    fn end_statement(&mut self) -> Result<(), ParseError> {
        if self.eat(&Tok::Semicolon) {
            return Ok(());
        }
        match self.current() {
            None => Ok(()),
            Some(token) if token.line_break_before || token.tok == Tok::RBrace => Ok(()),
            Some(_) => Err(self.unexpected()),
        }
    }
}
