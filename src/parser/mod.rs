//! Recursive-descent parser: token stream → `Program`.
//!
//! Formulas and conditions parse as a single expression wrapped in an implicit
//! return. Code bodies parse as a statement list.

use crate::ast::{Expression, Program};
use crate::error::ParseError;
use crate::lexer::{Span, Tok, Token, tokenize};
use serde::{Deserialize, Serialize};

mod expression;
mod statement;

/// Which grammar an input is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Formula,
    Condition,
    Code,
}

/// Parses `source` in the given dialect.
pub fn parse(source: &str, dialect: Dialect, max_depth: usize) -> Result<Program, ParseError> {
    let tokens = tokenize(source);
    parse_tokens(&tokens, source.len(), dialect, max_depth)
}

/// Parses an already tokenized input. `source_len` positions end-of-input errors.
pub(crate) fn parse_tokens(
    tokens: &[Token],
    source_len: usize,
    dialect: Dialect,
    max_depth: usize,
) -> Result<Program, ParseError> {
    let mut parser = Parser::new(tokens, source_len, max_depth);
    parser.parse_program(dialect)
}

/// Depth levels taken by one operator loop, released when the loop returns.
struct Links(usize);

pub(crate) struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    source_len: usize,
    depth: usize,
    max_depth: usize,
    loop_depth: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token], source_len: usize, max_depth: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            source_len,
            depth: 0,
            max_depth,
            loop_depth: 0,
        }
    }

    fn parse_program(&mut self, dialect: Dialect) -> Result<Program, ParseError> {
        let program = match dialect {
            Dialect::Formula | Dialect::Condition => {
                let expression = self.parse_expression()?;
                self.eat(&Tok::Semicolon);
                Program::implicit_return(expression)
            }
            Dialect::Code => {
                let mut body = Vec::new();
                while !self.at_end() {
                    body.push(self.parse_statement()?);
                }
                Program { body }
            }
        };
        if !self.at_end() {
            return Err(self.unexpected());
        }
        Ok(program)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn peek(&self) -> Option<&'t Tok> {
        self.tokens.get(self.pos).map(|t| &t.tok)
    }

    fn peek_at(&self, offset: usize) -> Option<&'t Tok> {
        self.tokens.get(self.pos + offset).map(|t| &t.tok)
    }

    fn peek_ident(&self) -> Option<&'t str> {
        self.current().and_then(Token::ident)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, tok: &Tok) -> bool {
        self.peek() == Some(tok)
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.check(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if self.peek_ident() == Some(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: &Tok) -> Result<&'t Token, ParseError> {
        match self.current() {
            Some(token) if &token.tok == tok => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.unexpected_expecting(tok)),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        match self.current() {
            Some(Token {
                tok: Tok::Ident(name),
                span,
                ..
            }) => {
                if crate::keywords::is_syntax_keyword(name)
                    || crate::keywords::is_literal_keyword(name)
                {
                    return Err(ParseError::new(
                        format!("Unexpected keyword '{}', expected {}", name, what),
                        *span,
                    ));
                }
                self.pos += 1;
                Ok(name.clone())
            }
            _ => Err(self.unexpected()),
        }
    }

    fn eof_span(&self) -> Span {
        Span::new(self.source_len, self.source_len)
    }

    /// Builds the error for whatever token sits at the cursor.
    fn unexpected(&self) -> ParseError {
        match self.current() {
            None => ParseError::new("Unexpected end of input", self.eof_span()),
            Some(Token {
                tok: Tok::Error(e),
                span,
                ..
            }) => ParseError::new(e.to_string(), *span),
            Some(token) => {
                ParseError::new(format!("Unexpected token '{}'", token.tok), token.span)
            }
        }
    }

    fn unexpected_expecting(&self, expected: &Tok) -> ParseError {
        let mut error = self.unexpected();
        error.message = format!("{}, expected '{}'", error.message, expected);
        error
    }

    /// Guards recursion so hostile nesting fails as a syntax error instead of overflowing the stack.
    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            let span = self.current().map_or(self.eof_span(), |t| t.span);
            return Err(ParseError::new(
                format!("Expression nests deeper than {} levels", self.max_depth),
                span,
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Runs a left-associative operator loop. Every link the loop adds deepens
    /// the tree by one level, so each one counts against the nesting limit
    /// until the loop returns.
    fn chain(
        &mut self,
        body: impl FnOnce(&mut Self, &mut Links) -> Result<Expression, ParseError>,
    ) -> Result<Expression, ParseError> {
        let mut links = Links(0);
        let result = body(self, &mut links);
        self.depth -= links.0;
        result
    }

    fn link(&mut self, links: &mut Links) -> Result<(), ParseError> {
        links.0 += 1;
        self.enter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AssignOp, Builtin, DeclarationKind, Expression, Statement, Value};

    fn formula(source: &str) -> Expression {
        parse(source, Dialect::Formula, 64)
            .unwrap()
            .as_expression()
            .cloned()
            .unwrap()
    }

    fn var(name: &str) -> Box<Expression> {
        Box::new(Expression::Variable(name.to_string()))
    }

    fn num(n: f64) -> Box<Expression> {
        Box::new(Expression::Literal(Value::Number(n)))
    }

    #[test]
    fn respects_precedence() {
        assert_eq!(
            formula("salary * (1 - taxRate) + bonus"),
            Expression::Sum(
                Box::new(Expression::Multiply(
                    var("salary"),
                    Box::new(Expression::Subtract(num(1.0), var("taxRate")))
                )),
                var("bonus")
            )
        );
    }

    #[test]
    fn exponent_is_right_associative_and_binds_tighter_than_negation() {
        assert_eq!(
            formula("-2 ** 3 ** 2"),
            Expression::Negate(Box::new(Expression::Power(
                num(2.0),
                Box::new(Expression::Power(num(3.0), num(2.0)))
            )))
        );
    }

    #[test]
    fn resolves_builtins_at_parse_time() {
        assert_eq!(
            formula("Math.max(a, 0)"),
            Expression::Call(Builtin::Max, vec![*var("a"), *num(0.0)])
        );
        assert_eq!(
            formula("round(a)"),
            Expression::Call(Builtin::Round, vec![*var("a")])
        );
        assert_eq!(
            formula("Math.PI"),
            Expression::Literal(Value::Number(std::f64::consts::PI))
        );
        assert_eq!(
            formula("payout(1)"),
            Expression::Apply(var("payout"), vec![*num(1.0)])
        );
    }

    #[test]
    fn display_round_trips_through_the_parser() {
        for source in [
            "salary * (1 - taxRate) + bonus",
            "a > 1 && b <= 2 || !c",
            "x ? y : z ? 1 : 2",
            "(-2) ** 2",
            "employee.allowances[0] - Math.abs(delta)",
        ] {
            let parsed = formula(source);
            assert_eq!(formula(&parsed.to_string()), parsed, "{}", source);
        }
    }

    #[test]
    fn rejects_dangling_operator() {
        let err = parse("salary +* 5", Dialect::Formula, 64).unwrap_err();
        assert_eq!(err.message, "Unexpected token '*'");
        assert_eq!(err.span.start, 8);
    }

    #[test]
    fn rejects_trailing_tokens() {
        let err = parse("a b", Dialect::Formula, 64).unwrap_err();
        assert_eq!(err.message, "Unexpected token 'b'");
    }

    #[test]
    fn rejects_statement_keywords_in_expressions() {
        let err = parse("if + 1", Dialect::Formula, 64).unwrap_err();
        assert!(err.message.contains("keyword 'if'"));
    }

    #[test]
    fn limits_nesting_depth() {
        let source = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        assert!(parse(&source, Dialect::Formula, 64).is_ok());
        let err = parse(&source, Dialect::Formula, 16).unwrap_err();
        assert!(err.message.contains("deeper than 16"));
    }

    #[test]
    fn operator_and_postfix_chains_count_towards_depth() {
        assert!(parse("a + b - c", Dialect::Formula, 3).is_ok());
        assert!(parse("a + b - c + d", Dialect::Formula, 3).is_err());
        assert!(parse("a.b[0]()", Dialect::Formula, 4).is_ok());
        assert!(parse("a.b[0]().c", Dialect::Formula, 4).is_err());

        // Levels are released once a chain ends.
        assert!(parse("(a + b + c) * (d + e + f) * g", Dialect::Formula, 5).is_ok());
    }

    #[test]
    fn parses_code_bodies_with_optional_semicolons() {
        let program = parse(
            "let tax = salary * 0.2\nif (tax > 100) {\n  tax -= 10\n} else tax++\nreturn tax",
            Dialect::Code,
            64,
        )
        .unwrap();
        assert_eq!(program.body.len(), 3);
        assert!(matches!(
            &program.body[0],
            Statement::Declare { kind: DeclarationKind::Let, name, .. } if name == "tax"
        ));
        let Statement::If { else_branch: Some(else_branch), .. } = &program.body[1] else {
            panic!("expected an if statement with an else branch");
        };
        assert!(matches!(
            **else_branch,
            Statement::Assign { op: AssignOp::Add, .. }
        ));
    }

    #[test]
    fn break_outside_loop_is_a_syntax_error() {
        let err = parse("break", Dialect::Code, 64).unwrap_err();
        assert!(err.message.contains("Illegal break"));
        assert!(parse("while (true) { break }", Dialect::Code, 64).is_ok());
    }

    #[test]
    fn const_needs_an_initializer() {
        let err = parse("const rate;", Dialect::Code, 64).unwrap_err();
        assert!(err.message.contains("Missing initializer"));
    }
}
