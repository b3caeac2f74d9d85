use super::{Links, Parser};
use crate::ast::{Builtin, Expression, Value, math_constant};
use crate::error::ParseError;
use crate::keywords;
use crate::lexer::Tok;

// Builds a left-associative binary node.
macro_rules! binary {
    ($variant:path, $l:expr, $r:expr) => {
        $variant(Box::new($l), Box::new($r))
    };
}

impl Parser<'_> {
    pub(super) fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.enter()?;
        let expression = self.parse_conditional();
        self.leave();
        expression
    }

    fn parse_conditional(&mut self) -> Result<Expression, ParseError> {
        let condition = self.parse_or()?;
        if !self.eat(&Tok::Question) {
            return Ok(condition);
        }
        let then_branch = self.parse_expression()?;
        self.expect(&Tok::Colon)?;
        let else_branch = self.parse_expression()?;
        Ok(Expression::Conditional(
            Box::new(condition),
            Box::new(then_branch),
            Box::new(else_branch),
        ))
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        self.chain(|parser, links| {
            let mut left = parser.parse_and()?;
            while parser.eat(&Tok::OrOr) {
                parser.link(links)?;
                let right = parser.parse_and()?;
                left = binary!(Expression::Or, left, right);
            }
            Ok(left)
        })
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        self.chain(|parser, links| {
            let mut left = parser.parse_equality()?;
            while parser.eat(&Tok::AndAnd) {
                parser.link(links)?;
                let right = parser.parse_equality()?;
                left = binary!(Expression::And, left, right);
            }
            Ok(left)
        })
    }

    fn parse_equality(&mut self) -> Result<Expression, ParseError> {
        self.chain(|parser, links| {
            let mut left = parser.parse_comparison()?;
            loop {
                let variant = match parser.peek() {
                    Some(Tok::EqEq | Tok::EqEqEq) => Expression::Equal,
                    Some(Tok::NotEq | Tok::NotEqEq) => Expression::NotEqual,
                    _ => return Ok(left),
                };
                parser.advance();
                parser.link(links)?;
                let right = parser.parse_comparison()?;
                left = binary!(variant, left, right);
            }
        })
    }

    fn parse_comparison(&mut self) -> Result<Expression, ParseError> {
        self.chain(|parser, links| {
            let mut left = parser.parse_additive()?;
            loop {
                let variant = match parser.peek() {
                    Some(Tok::Gt) => Expression::GreaterThan,
                    Some(Tok::Ge) => Expression::GreaterThanOrEqual,
                    Some(Tok::Lt) => Expression::SmallerThan,
                    Some(Tok::Le) => Expression::SmallerThanOrEqual,
                    _ => return Ok(left),
                };
                parser.advance();
                parser.link(links)?;
                let right = parser.parse_additive()?;
                left = binary!(variant, left, right);
            }
        })
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        self.chain(|parser, links| {
            let mut left = parser.parse_multiplicative()?;
            loop {
                let variant = match parser.peek() {
                    Some(Tok::Plus) => Expression::Sum,
                    Some(Tok::Minus) => Expression::Subtract,
                    _ => return Ok(left),
                };
                parser.advance();
                parser.link(links)?;
                let right = parser.parse_multiplicative()?;
                left = binary!(variant, left, right);
            }
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        self.chain(|parser, links| {
            let mut left = parser.parse_unary()?;
            loop {
                let variant = match parser.peek() {
                    Some(Tok::Star) => Expression::Multiply,
                    Some(Tok::Slash) => Expression::Divide,
                    Some(Tok::Percent) => Expression::Remainder,
                    _ => return Ok(left),
                };
                parser.advance();
                parser.link(links)?;
                let right = parser.parse_unary()?;
                left = binary!(variant, left, right);
            }
        })
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        let variant = match self.peek() {
            Some(Tok::Bang) => Expression::Not,
            Some(Tok::Minus) => Expression::Negate,
            Some(Tok::Plus) => Expression::Plus,
            _ => return self.parse_exponent(),
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();
        Ok(variant(Box::new(operand?)))
    }

    fn parse_exponent(&mut self) -> Result<Expression, ParseError> {
        let base = self.parse_postfix()?;
        if !self.eat(&Tok::StarStar) {
            return Ok(base);
        }
        self.enter()?;
        let exponent = self.parse_unary();
        self.leave();
        Ok(binary!(Expression::Power, base, exponent?))
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        self.chain(|parser, links| parser.parse_postfix_links(links))
    }

    fn parse_postfix_links(&mut self, links: &mut Links) -> Result<Expression, ParseError> {
        let mut expression = self.parse_primary()?;
        loop {
            if matches!(self.peek(), Some(Tok::Dot | Tok::LBracket | Tok::LParen)) {
                self.link(links)?;
            }
            expression = match self.peek() {
                Some(Tok::Dot) => {
                    self.advance();
                    let Some(name) = self.peek_ident() else {
                        return Err(self.unexpected());
                    };
                    self.advance();
                    let name = name.to_string();
                    let constant = match &expression {
                        Expression::Variable(namespace) => math_constant(namespace, &name),
                        _ => None,
                    };
                    match constant {
                        Some(constant) => Expression::Literal(Value::Number(constant)),
                        None => Expression::Member(Box::new(expression), name),
                    }
                }
                Some(Tok::LBracket) => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&Tok::RBracket)?;
                    binary!(Expression::Index, expression, index)
                }
                Some(Tok::LParen) => {
                    self.advance();
                    let args = self.parse_list(&Tok::RParen)?;
                    match Self::resolve_builtin(&expression) {
                        Some(builtin) => Expression::Call(builtin, args),
                        None => Expression::Apply(Box::new(expression), args),
                    }
                }
                _ => return Ok(expression),
            };
        }
    }

    /// Maps `name(...)` and `namespace.name(...)` callees onto the allow-list.
    fn resolve_builtin(callee: &Expression) -> Option<Builtin> {
        match callee {
            Expression::Variable(name) => Builtin::bare(name),
            Expression::Member(target, name) => match target.as_ref() {
                Expression::Variable(namespace) => Builtin::namespaced(namespace, name),
                _ => None,
            },
            _ => None,
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let Some(token) = self.current() else {
            return Err(self.unexpected());
        };
        let expression = match &token.tok {
            Tok::Number(n) => Expression::Literal(Value::Number(*n)),
            Tok::Str(s) => Expression::Literal(Value::Str(s.clone())),
            Tok::Ident(name) => match name.as_str() {
                "true" => Expression::Literal(Value::Bool(true)),
                "false" => Expression::Literal(Value::Bool(false)),
                "null" | "undefined" => Expression::Literal(Value::Null),
                word if keywords::is_syntax_keyword(word) => {
                    return Err(ParseError::new(
                        format!("Unexpected keyword '{}'", word),
                        token.span,
                    ));
                }
                _ => Expression::Variable(name.clone()),
            },
            Tok::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&Tok::RParen)?;
                return Ok(inner);
            }
            Tok::LBracket => {
                self.advance();
                return Ok(Expression::List(self.parse_list(&Tok::RBracket)?));
            }
            Tok::LBrace => {
                self.advance();
                return self.parse_record();
            }
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(expression)
    }

    /// Parses comma separated expressions up to `close`, allowing a trailing comma.
    fn parse_list(&mut self, close: &Tok) -> Result<Vec<Expression>, ParseError> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.parse_expression()?);
            if !self.eat(&Tok::Comma) {
                self.expect(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn parse_record(&mut self) -> Result<Expression, ParseError> {
        let mut fields = Vec::new();
        while !self.eat(&Tok::RBrace) {
            let (key, shorthand_allowed) = match self.peek() {
                Some(Tok::Ident(name)) => (name.clone(), true),
                Some(Tok::Str(s)) => (s.clone(), false),
                _ => return Err(self.unexpected()),
            };
            self.advance();
            let value = if self.eat(&Tok::Colon) {
                self.parse_expression()?
            } else if shorthand_allowed {
                // Shorthand `{ salary }`
                Expression::Variable(key.clone())
            } else {
                return Err(self.unexpected_expecting(&Tok::Colon));
            };
            fields.push((key, value));
            if !self.eat(&Tok::Comma) {
                self.expect(&Tok::RBrace)?;
                break;
            }
        }
        Ok(Expression::Record(fields))
    }
}
