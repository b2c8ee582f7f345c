// Condition lexer - tokenizes routing condition text

use super::error::{ParseError, ParseResult};
use super::token::Token;

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let input: Vec<char> = input.chars().collect();
        let current_char = input.first().copied();
        Lexer {
            input,
            position: 0,
            current_char,
        }
    }

    /// Char offset of the next unread character
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_whitespace();

        let ch = match self.current_char {
            Some(ch) => ch,
            None => return Ok(Token::Eof),
        };

        let token = match ch {
            '+' => {
                self.advance();
                Token::Plus
            }
            '-' => {
                self.advance();
                Token::Minus
            }
            '*' => {
                self.advance();
                Token::Star
            }
            '/' => {
                self.advance();
                Token::Slash
            }
            '%' => {
                self.advance();
                Token::Percent
            }
            '=' => {
                self.advance();
                // Accept C-style equality as well
                if self.current_char == Some('=') {
                    self.advance();
                }
                Token::Equal
            }
            '<' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::LessEqual
                } else if self.current_char == Some('>') {
                    self.advance();
                    Token::NotEqual
                } else {
                    Token::Less
                }
            }
            '>' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::GreaterEqual
                } else {
                    Token::Greater
                }
            }
            '!' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::NotEqual
                } else {
                    Token::Not
                }
            }
            '&' => {
                let start = self.position;
                self.advance();
                if self.current_char != Some('&') {
                    return Err(ParseError::new("Expected '&&'", start));
                }
                self.advance();
                Token::And
            }
            '|' => {
                let start = self.position;
                self.advance();
                if self.current_char != Some('|') {
                    return Err(ParseError::new("Expected '||'", start));
                }
                self.advance();
                Token::Or
            }
            '(' => {
                self.advance();
                Token::LeftParen
            }
            ')' => {
                self.advance();
                Token::RightParen
            }
            ',' => {
                self.advance();
                Token::Comma
            }
            '.' => {
                self.advance();
                Token::Dot
            }
            '\'' | '"' => self.read_string(ch)?,
            c if c.is_alphabetic() || c == '_' || c == '$' => self.read_identifier(),
            c if c.is_ascii_digit() => self.read_number()?,
            c => {
                return Err(ParseError::new(
                    format!("Unexpected character '{}'", c),
                    self.position,
                ))
            }
        };

        Ok(token)
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let mut identifier = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' || (ch == '$' && identifier.is_empty()) {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::keyword_from_str(&identifier).unwrap_or(Token::Identifier(identifier))
    }

    /// Read a string literal in single or double quotes
    fn read_string(&mut self, quote: char) -> ParseResult<Token> {
        let start = self.position;
        self.advance(); // Skip opening quote
        let mut string = String::new();

        loop {
            match self.current_char {
                None => return Err(ParseError::new("Unterminated string literal", start)),
                Some(ch) if ch == quote => {
                    if self.peek() == Some(quote) {
                        // Doubled quote is an escaped quote
                        string.push(quote);
                        self.advance();
                        self.advance();
                    } else {
                        self.advance(); // Skip closing quote
                        break;
                    }
                }
                Some('\\') => {
                    let escaped = match self.peek() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some(c @ ('\\' | '\'' | '"')) => c,
                        _ => {
                            return Err(ParseError::new("Invalid escape sequence", self.position))
                        }
                    };
                    string.push(escaped);
                    self.advance();
                    self.advance();
                }
                Some(ch) => {
                    string.push(ch);
                    self.advance();
                }
            }
        }

        Ok(Token::String(string))
    }

    /// Read a number with optional fraction and exponent
    fn read_number(&mut self) -> ParseResult<Token> {
        let start = self.position;
        let mut number = String::new();
        let mut has_dot = false;

        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot && self.peek().map_or(false, |c| c.is_ascii_digit()) {
                has_dot = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if matches!(self.current_char, Some('e' | 'E')) {
            number.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.current_char {
                number.push(sign);
                self.advance();
            }
            if !self.current_char.map_or(false, |c| c.is_ascii_digit()) {
                return Err(ParseError::new("Invalid number exponent", start));
            }
            while let Some(ch) = self.current_char.filter(|c| c.is_ascii_digit()) {
                number.push(ch);
                self.advance();
            }
        }

        if self
            .current_char
            .map_or(false, |c| c.is_alphabetic() || c == '_')
        {
            return Err(ParseError::new("Invalid number", start));
        }

        Ok(Token::Number(number))
    }

    /// Tokenize the entire input, pairing each token with its start offset
    pub fn tokenize(&mut self) -> ParseResult<Vec<(Token, usize)>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let start = self.position;
            let token = self.next_token()?;
            if token == Token::Eof {
                tokens.push((token, start));
                break;
            }
            tokens.push((token, start));
        }

        Ok(tokens)
    }
}
