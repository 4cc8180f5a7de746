/// Recursive-descent parser for component schema files.
///
/// Grammar:
///
/// ```text
/// file      := component*
/// component := 'component' ident '{' fields? '}'
/// fields    := field (',' field)* ','?
/// field     := ident ':' type
/// type      := ident | '[' ident ';' integer ']'
/// ```
use thiserror::Error;

use crate::ast::{ComponentDef, FieldDef, SchemaFile, TypeExpr};
use crate::lexer::{LexError, Lexer, SpannedToken, Token};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("expected {expected}, found `{found}` at {line}:{col}")]
    Unexpected {
        expected: &'static str,
        found: String,
        line: usize,
        col: usize,
    },
}

pub struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    /// Parse a schema source string into its AST.
    pub fn parse(source: &str) -> Result<SchemaFile, ParseError> {
        let tokens = Lexer::new(source).tokenize()?;
        let mut parser = Self { tokens, pos: 0 };
        parser.file()
    }

    fn peek(&self) -> &SpannedToken {
        // The token stream always ends with Eof, so pos is clamped to it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> SpannedToken {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        let tok = self.peek();
        ParseError::Unexpected {
            expected,
            found: tok.token.to_string(),
            line: tok.line,
            col: tok.col,
        }
    }

    fn expect(&mut self, token: &Token, expected: &'static str) -> Result<(), ParseError> {
        if &self.peek().token == token {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn ident(&mut self, expected: &'static str) -> Result<String, ParseError> {
        match &self.peek().token {
            Token::Ident(name) => {
                let name = name.clone();
                self.bump();
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn file(&mut self) -> Result<SchemaFile, ParseError> {
        let mut components = Vec::new();
        while self.peek().token != Token::Eof {
            components.push(self.component()?);
        }
        Ok(SchemaFile { components })
    }

    fn component(&mut self) -> Result<ComponentDef, ParseError> {
        self.expect(&Token::Component, "`component`")?;
        let name = self.ident("a component name")?;
        self.expect(&Token::LBrace, "`{`")?;

        let mut fields = Vec::new();
        while self.peek().token != Token::RBrace {
            fields.push(self.field()?);
            // Fields are comma-separated; the trailing comma is optional.
            if self.peek().token == Token::Comma {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(&Token::RBrace, "`}`")?;
        Ok(ComponentDef { name, fields })
    }

    fn field(&mut self) -> Result<FieldDef, ParseError> {
        let name = self.ident("a field name")?;
        self.expect(&Token::Colon, "`:`")?;
        let ty = self.type_expr()?;
        Ok(FieldDef { name, ty })
    }

    fn type_expr(&mut self) -> Result<TypeExpr, ParseError> {
        match &self.peek().token {
            Token::Ident(_) => Ok(TypeExpr::Scalar(self.ident("a type name")?)),
            Token::LBracket => {
                self.bump();
                let ty = self.ident("an element type name")?;
                self.expect(&Token::Semi, "`;`")?;
                let len = match self.peek().token {
                    Token::Integer(n) => {
                        self.bump();
                        n as usize
                    }
                    _ => return Err(self.unexpected("an array length")),
                };
                self.expect(&Token::RBracket, "`]`")?;
                Ok(TypeExpr::Array(ty, len))
            }
            _ => Err(self.unexpected("a type")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_components_in_order() {
        let file = Parser::parse(
            r"
            component position {
                x: f64,
                y: f64,
            }

            component tile {
                kind: u16,
                variants: [u8; 4],
            }

            component dead {}
        ",
        )
        .unwrap();

        assert_eq!(file.components.len(), 3);
        assert_eq!(file.components[0].name, "position");
        assert_eq!(file.components[1].name, "tile");
        assert_eq!(
            file.components[1].fields[1].ty,
            TypeExpr::Array("u8".to_string(), 4)
        );
        assert!(file.components[2].is_tag());
    }

    #[test]
    fn test_trailing_comma_is_optional() {
        let file = Parser::parse("component a { x: f32, y: f32 }").unwrap();
        assert_eq!(file.components[0].fields.len(), 2);
    }

    #[test]
    fn test_missing_colon_is_reported() {
        let err = Parser::parse("component a { x f32 }").unwrap_err();
        match err {
            ParseError::Unexpected { expected, .. } => assert_eq!(expected, "`:`"),
            ParseError::Lex(_) => panic!("expected a parse error"),
        }
    }

    #[test]
    fn test_stray_token_at_top_level() {
        assert!(Parser::parse("position {}").is_err());
    }
}
