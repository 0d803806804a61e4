//! Tokenization for expression text.
//!
//! Converts the inside of a `${ ... }` template into a token stream: literals
//! (single-quoted strings, numbers, `true`/`false`/`null`), identifiers,
//! operators, and punctuation.

use crate::edgepipe::error::{ElError, ElResult};

/// Token types recognized by the expression lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Identifier,
    String,
    Number,
    True,
    False,
    Null,

    LeftParen,
    RightParen,
    Comma,
    Colon,
    Question,

    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Bang,
    Tilde,

    Equal,              // ==
    NotEqual,           // !=
    LessThan,           // <
    GreaterThan,        // >
    LessThanOrEqual,    // <=
    GreaterThanOrEqual, // >=
    And,                // &&
    Or,                 // ||

    Eof,
}

/// A token with its type, value, and position in the expression text.
#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub position: usize,
}

impl Token {
    fn new(token_type: TokenType, value: impl Into<String>, position: usize) -> Self {
        Token {
            token_type,
            value: value.into(),
            position,
        }
    }
}

/// Tokenize expression text into a vector of tokens ending with `Eof`.
pub fn tokenize(text: &str) -> ElResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut position = 0;

    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
                position += 1;
            }
            '(' => {
                tokens.push(Token::new(TokenType::LeftParen, "(", position));
                chars.next();
                position += 1;
            }
            ')' => {
                tokens.push(Token::new(TokenType::RightParen, ")", position));
                chars.next();
                position += 1;
            }
            ',' => {
                tokens.push(Token::new(TokenType::Comma, ",", position));
                chars.next();
                position += 1;
            }
            ':' => {
                tokens.push(Token::new(TokenType::Colon, ":", position));
                chars.next();
                position += 1;
            }
            '?' => {
                tokens.push(Token::new(TokenType::Question, "?", position));
                chars.next();
                position += 1;
            }
            '+' => {
                tokens.push(Token::new(TokenType::Plus, "+", position));
                chars.next();
                position += 1;
            }
            '-' => {
                tokens.push(Token::new(TokenType::Minus, "-", position));
                chars.next();
                position += 1;
            }
            '*' => {
                tokens.push(Token::new(TokenType::Asterisk, "*", position));
                chars.next();
                position += 1;
            }
            '/' => {
                tokens.push(Token::new(TokenType::Slash, "/", position));
                chars.next();
                position += 1;
            }
            '%' => {
                tokens.push(Token::new(TokenType::Percent, "%", position));
                chars.next();
                position += 1;
            }
            '~' => {
                tokens.push(Token::new(TokenType::Tilde, "~", position));
                chars.next();
                position += 1;
            }
            '!' => {
                chars.next();
                position += 1;
                if let Some(&'=') = chars.peek() {
                    chars.next();
                    position += 1;
                    tokens.push(Token::new(TokenType::NotEqual, "!=", position - 2));
                } else {
                    tokens.push(Token::new(TokenType::Bang, "!", position - 1));
                }
            }
            '=' => {
                chars.next();
                position += 1;
                if let Some(&'=') = chars.peek() {
                    chars.next();
                    position += 1;
                    tokens.push(Token::new(TokenType::Equal, "==", position - 2));
                } else {
                    return Err(ElError::parse(format!(
                        "Unexpected character '=' at position {}",
                        position - 1
                    )));
                }
            }
            '<' => {
                chars.next();
                position += 1;
                if let Some(&'=') = chars.peek() {
                    chars.next();
                    position += 1;
                    tokens.push(Token::new(TokenType::LessThanOrEqual, "<=", position - 2));
                } else {
                    tokens.push(Token::new(TokenType::LessThan, "<", position - 1));
                }
            }
            '>' => {
                chars.next();
                position += 1;
                if let Some(&'=') = chars.peek() {
                    chars.next();
                    position += 1;
                    tokens.push(Token::new(
                        TokenType::GreaterThanOrEqual,
                        ">=",
                        position - 2,
                    ));
                } else {
                    tokens.push(Token::new(TokenType::GreaterThan, ">", position - 1));
                }
            }
            '&' => {
                chars.next();
                position += 1;
                if let Some(&'&') = chars.peek() {
                    chars.next();
                    position += 1;
                    tokens.push(Token::new(TokenType::And, "&&", position - 2));
                } else {
                    return Err(ElError::parse(format!(
                        "Unexpected character '&' at position {}",
                        position - 1
                    )));
                }
            }
            '|' => {
                chars.next();
                position += 1;
                if let Some(&'|') = chars.peek() {
                    chars.next();
                    position += 1;
                    tokens.push(Token::new(TokenType::Or, "||", position - 2));
                } else {
                    return Err(ElError::parse(format!(
                        "Unexpected character '|' at position {}",
                        position - 1
                    )));
                }
            }
            '\'' => {
                let start = position;
                chars.next();
                position += 1;
                let mut value = String::new();
                let mut terminated = false;
                while let Some(&c) = chars.peek() {
                    chars.next();
                    position += 1;
                    if c == '\'' {
                        terminated = true;
                        break;
                    }
                    value.push(c);
                }
                if !terminated {
                    return Err(ElError::parse(format!(
                        "Unterminated string literal at position {}",
                        start
                    )));
                }
                tokens.push(Token::new(TokenType::String, value, start));
            }
            '0'..='9' => {
                let start = position;
                let mut value = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        value.push(c);
                        chars.next();
                        position += 1;
                    } else {
                        break;
                    }
                }
                // Validated here so the parser can unwrap the float
                if value.parse::<f64>().is_err() {
                    return Err(ElError::parse(format!(
                        "Invalid number literal '{}' at position {}",
                        value, start
                    )));
                }
                tokens.push(Token::new(TokenType::Number, value, start));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = position;
                let mut value = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        value.push(c);
                        chars.next();
                        position += 1;
                    } else {
                        break;
                    }
                }
                let token_type = match value.as_str() {
                    "true" => TokenType::True,
                    "false" => TokenType::False,
                    "null" => TokenType::Null,
                    _ => TokenType::Identifier,
                };
                tokens.push(Token::new(token_type, value, start));
            }
            other => {
                return Err(ElError::parse(format!(
                    "Unexpected character '{}' at position {}",
                    other, position
                )));
            }
        }
    }

    tokens.push(Token::new(TokenType::Eof, "", position));
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_operators_and_literals() {
        let tokens = tokenize("PARAM1 > 10 && str:trim(' x ') == 'x'").unwrap();
        let types: Vec<TokenType> = tokens.iter().map(|t| t.token_type).collect();
        assert_eq!(
            types,
            vec![
                TokenType::Identifier,
                TokenType::GreaterThan,
                TokenType::Number,
                TokenType::And,
                TokenType::Identifier,
                TokenType::Colon,
                TokenType::Identifier,
                TokenType::LeftParen,
                TokenType::String,
                TokenType::RightParen,
                TokenType::Equal,
                TokenType::String,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(tokenize("'abc").is_err());
    }

    #[test]
    fn keywords_are_case_sensitive() {
        let tokens = tokenize("true TRUE null").unwrap();
        assert_eq!(tokens[0].token_type, TokenType::True);
        assert_eq!(tokens[1].token_type, TokenType::Identifier);
        assert_eq!(tokens[2].token_type, TokenType::Null);
    }
}
