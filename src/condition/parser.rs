// Condition parser - converts tokens to an expression AST

use super::error::{ParseError, ParseResult};
use super::lexer::Lexer;
use super::token::Token;
use crate::query::expr::Expression;
use crate::query::operator::{BinaryOperator, UnaryOperator};
use crate::query::value::QueryValue;

/// Deepest nesting of parentheses, calls and prefix operators accepted
pub const MAX_NESTING_DEPTH: usize = 128;

pub struct Parser {
    input: String,
    tokens: Vec<(Token, usize)>,
    position: usize,
    depth: usize,
}

impl Parser {
    pub fn new(condition: &str) -> Self {
        Parser {
            input: condition.to_string(),
            tokens: Vec::new(),
            position: 0,
            depth: 0,
        }
    }

    /// Parse the whole condition into a single expression
    pub fn parse(&mut self) -> ParseResult<Expression> {
        self.tokens = Lexer::new(&self.input).tokenize()?;
        self.position = 0;
        self.depth = 0;

        if self.match_token(&Token::Eof) {
            return Err(ParseError::new("Empty condition", self.current_position()));
        }

        let expr = self.parse_expression()?;

        if !self.match_token(&Token::Eof) {
            return Err(self.unexpected("end of input"));
        }

        Ok(expr)
    }

    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.nested(Self::parse_or)
    }

    /// Run a recursive step one nesting level deeper
    fn nested<T>(&mut self, step: fn(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::new(
                "Condition nested too deeply",
                self.current_position(),
            ));
        }
        self.depth += 1;
        let result = step(self);
        self.depth -= 1;
        result
    }

    /// Parse OR expression
    fn parse_or(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_and()?;

        while self.match_token(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Expression::or(left, right);
        }

        Ok(left)
    }

    /// Parse AND expression
    fn parse_and(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_not()?;

        while self.match_token(&Token::And) {
            self.advance();
            let right = self.parse_not()?;
            left = Expression::and(left, right);
        }

        Ok(left)
    }

    /// Parse NOT expression; NOT binds looser than comparisons
    fn parse_not(&mut self) -> ParseResult<Expression> {
        if self.match_token(&Token::Not) {
            self.advance();
            let operand = self.nested(Self::parse_not)?;
            Ok(Expression::not_expr(operand))
        } else {
            self.parse_comparison()
        }
    }

    /// Parse comparison expression
    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        let left = self.parse_addition()?;

        let op = match self.current_token() {
            Token::Equal => BinaryOperator::Eq,
            Token::NotEqual => BinaryOperator::Ne,
            Token::Less => BinaryOperator::Lt,
            Token::Greater => BinaryOperator::Gt,
            Token::LessEqual => BinaryOperator::Le,
            Token::GreaterEqual => BinaryOperator::Ge,
            _ => return Ok(left),
        };
        self.advance();

        let right = self.parse_addition()?;
        Ok(Expression::binary_op(op, left, right))
    }

    /// Parse addition/subtraction expression
    fn parse_addition(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_multiplication()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Sub,
                _ => break,
            };
            self.advance();

            let right = self.parse_multiplication()?;
            left = Expression::binary_op(op, left, right);
        }

        Ok(left)
    }

    /// Parse multiplication/division expression
    fn parse_multiplication(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Mul,
                Token::Slash => BinaryOperator::Div,
                Token::Percent => BinaryOperator::Mod,
                _ => break,
            };
            self.advance();

            let right = self.parse_unary()?;
            left = Expression::binary_op(op, left, right);
        }

        Ok(left)
    }

    /// Parse unary expression
    fn parse_unary(&mut self) -> ParseResult<Expression> {
        let op = match self.current_token() {
            Token::Plus => UnaryOperator::Plus,
            Token::Minus => UnaryOperator::Minus,
            _ => return self.parse_primary(),
        };
        self.advance();

        let operand = self.nested(Self::parse_unary)?;
        Ok(Expression::unary_op(op, operand))
    }

    /// Parse primary expression
    fn parse_primary(&mut self) -> ParseResult<Expression> {
        match self.current_token() {
            Token::Number(n) => {
                let position = self.current_position();
                self.advance();
                let number = n
                    .parse::<f64>()
                    .map_err(|_| ParseError::new(format!("Invalid number: {}", n), position))?;
                if !number.is_finite() {
                    return Err(ParseError::new(
                        format!("Number out of range: {}", n),
                        position,
                    ));
                }
                Ok(Expression::literal(number))
            }
            Token::String(s) => {
                self.advance();
                Ok(Expression::literal(s))
            }
            Token::True => {
                self.advance();
                Ok(Expression::literal(true))
            }
            Token::False => {
                self.advance();
                Ok(Expression::literal(false))
            }
            Token::Null => {
                self.advance();
                Ok(Expression::Literal(QueryValue::Null))
            }
            Token::Identifier(name) => {
                self.advance();

                if self.match_token(&Token::LeftParen) {
                    self.advance();
                    let args = if self.match_token(&Token::RightParen) {
                        vec![]
                    } else {
                        self.parse_expression_list()?
                    };
                    self.expect_token(Token::RightParen)?;
                    return Ok(Expression::call(name, args));
                }

                // Dotted field path
                let mut path = name;
                while self.match_token(&Token::Dot) {
                    self.advance();
                    path.push('.');
                    path.push_str(&self.expect_path_segment()?);
                }

                Ok(Expression::field(path))
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_token(Token::RightParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// Parse list of expressions
    fn parse_expression_list(&mut self) -> ParseResult<Vec<Expression>> {
        let mut expressions = vec![];

        loop {
            expressions.push(self.parse_expression()?);
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(expressions)
    }

    // Helper methods

    /// Get current token
    fn current_token(&self) -> Token {
        self.tokens
            .get(self.position)
            .map(|(token, _)| token.clone())
            .unwrap_or(Token::Eof)
    }

    /// Char offset of the current token
    fn current_position(&self) -> usize {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map_or(0, |(_, position)| *position)
    }

    /// Advance to next token
    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Check if current token matches
    fn match_token(&self, token: &Token) -> bool {
        self.current_token() == *token
    }

    /// Expect a specific token
    fn expect_token(&mut self, token: Token) -> ParseResult<()> {
        if self.current_token() == token {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&token.to_string()))
        }
    }

    /// Expect a field path segment; keywords count as plain names here
    fn expect_path_segment(&mut self) -> ParseResult<String> {
        match self.current_token() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            token if token.is_keyword() => {
                let word: String = self
                    .input
                    .chars()
                    .skip(self.current_position())
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                self.advance();
                Ok(word)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::new(
            format!("Expected {}, found {}", expected, self.current_token()),
            self.current_position(),
        )
    }
}
