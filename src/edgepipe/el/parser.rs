//! Recursive-descent parser for expression text.
//!
//! Operator precedence follows C-family conventions, lowest binding first:
//! ternary `?:`, `||`, `&&`, `== !=`, comparisons, `+ -`, `* / %`, then the
//! unary operators `! ~ -`.

use super::ast::{BinaryOp, Expr, Literal, UnaryOp};
use super::lexer::{tokenize, Token, TokenType};
use crate::edgepipe::error::{ElError, ElResult};

/// Parse expression text into an AST.
pub fn parse(text: &str) -> ElResult<Expr> {
    let tokens = tokenize(text)?;
    let mut parser = Parser { tokens, index: 0 };
    let expr = parser.parse_ternary()?;
    match parser.peek().token_type {
        TokenType::Eof => Ok(expr),
        TokenType::RightParen => Err(ElError::parse("Unbalanced parenthesis")),
        _ => Err(ElError::parse(format!(
            "Unexpected token '{}' at position {}",
            parser.peek().value,
            parser.peek().position
        ))),
    }
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.index + offset)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.index].clone();
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        token
    }

    fn matches(&mut self, token_type: TokenType) -> bool {
        if self.peek().token_type == token_type {
            self.advance();
            true
        } else {
            false
        }
    }

    fn parse_ternary(&mut self) -> ElResult<Expr> {
        let condition = self.parse_or()?;
        if self.matches(TokenType::Question) {
            let then_expr = self.parse_ternary()?;
            if !self.matches(TokenType::Colon) {
                return Err(ElError::parse(format!(
                    "Expected ':' in ternary expression at position {}",
                    self.peek().position
                )));
            }
            let else_expr = self.parse_ternary()?;
            return Ok(Expr::Ternary {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            });
        }
        Ok(condition)
    }

    fn parse_or(&mut self) -> ElResult<Expr> {
        let mut left = self.parse_and()?;
        while self.matches(TokenType::Or) {
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ElResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.matches(TokenType::And) {
            let right = self.parse_equality()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ElResult<Expr> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek().token_type {
                TokenType::Equal => BinaryOp::Equal,
                TokenType::NotEqual => BinaryOp::NotEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> ElResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().token_type {
                TokenType::LessThan => BinaryOp::LessThan,
                TokenType::LessThanOrEqual => BinaryOp::LessThanOrEqual,
                TokenType::GreaterThan => BinaryOp::GreaterThan,
                TokenType::GreaterThanOrEqual => BinaryOp::GreaterThanOrEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ElResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().token_type {
                TokenType::Plus => BinaryOp::Add,
                TokenType::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ElResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().token_type {
                TokenType::Asterisk => BinaryOp::Multiply,
                TokenType::Slash => BinaryOp::Divide,
                TokenType::Percent => BinaryOp::Modulo,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ElResult<Expr> {
        let op = match self.peek().token_type {
            TokenType::Bang => Some(UnaryOp::Not),
            TokenType::Tilde => Some(UnaryOp::BitNot),
            TokenType::Minus => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                expr: Box::new(expr),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ElResult<Expr> {
        match self.peek().token_type {
            TokenType::Number => {
                let token = self.advance();
                // The lexer validated the literal
                let value = token.value.parse::<f64>().map_err(|_| {
                    ElError::parse(format!("Invalid number literal '{}'", token.value))
                })?;
                Ok(Expr::Literal(Literal::Number(value)))
            }
            TokenType::String => {
                let token = self.advance();
                Ok(Expr::Literal(Literal::Str(token.value)))
            }
            TokenType::True => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(true)))
            }
            TokenType::False => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(false)))
            }
            TokenType::Null => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.parse_ternary()?;
                if !self.matches(TokenType::RightParen) {
                    return Err(ElError::parse("Unbalanced parenthesis"));
                }
                Ok(expr)
            }
            TokenType::Identifier => self.parse_identifier_or_call(),
            _ => Err(ElError::parse(format!(
                "Unexpected token '{}' at position {}",
                self.peek().value,
                self.peek().position
            ))),
        }
    }

    /// Distinguish a bare identifier, an un-namespaced call `name(...)`, and a
    /// namespaced call `ns:name(...)`. The colon form needs three tokens of
    /// lookahead so a ternary colon is never swallowed.
    fn parse_identifier_or_call(&mut self) -> ElResult<Expr> {
        let token = self.advance();
        let mut name = token.value;

        let namespaced_call = self.peek().token_type == TokenType::Colon
            && self.peek_at(1).map(|t| t.token_type) == Some(TokenType::Identifier)
            && self.peek_at(2).map(|t| t.token_type) == Some(TokenType::LeftParen);
        if namespaced_call {
            self.advance(); // ':'
            let func = self.advance();
            name = format!("{}:{}", name, func.value);
        }

        if self.matches(TokenType::LeftParen) {
            let mut args = Vec::new();
            if self.peek().token_type != TokenType::RightParen {
                loop {
                    args.push(self.parse_ternary()?);
                    if !self.matches(TokenType::Comma) {
                        break;
                    }
                }
            }
            if !self.matches(TokenType::RightParen) {
                return Err(ElError::parse("Unbalanced parenthesis"));
            }
            return Ok(Expr::Call { name, args });
        }

        Ok(Expr::Identifier(name))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_multiplication_over_addition() {
        let expr = parse("1 + 2 * 3").unwrap();
        match expr {
            Expr::Binary { op, right, .. } => {
                assert_eq!(op, BinaryOp::Add);
                assert!(matches!(
                    *right,
                    Expr::Binary {
                        op: BinaryOp::Multiply,
                        ..
                    }
                ));
            }
            other => panic!("unexpected AST: {:?}", other),
        }
    }

    #[test]
    fn unbalanced_parenthesis_message() {
        let err = parse("(1 + 2").unwrap_err();
        assert_eq!(err.to_string(), "Unbalanced parenthesis");
        let err = parse("1 + 2)").unwrap_err();
        assert_eq!(err.to_string(), "Unbalanced parenthesis");
    }

    #[test]
    fn namespaced_call_vs_ternary_colon() {
        let expr = parse("str:trim(' x ')").unwrap();
        assert!(matches!(expr, Expr::Call { ref name, .. } if name == "str:trim"));

        let expr = parse("true ? a : b").unwrap();
        assert!(matches!(expr, Expr::Ternary { .. }));
    }

    #[test]
    fn parses_nested_calls() {
        let expr = parse("str:toUpper(str:trim(NAME))").unwrap();
        match expr {
            Expr::Call { name, args } => {
                assert_eq!(name, "str:toUpper");
                assert_eq!(args.len(), 1);
            }
            other => panic!("unexpected AST: {:?}", other),
        }
    }
}
