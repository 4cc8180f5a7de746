/// Lexer for component schema files.
use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Component,

    // Literals
    Ident(String),
    Integer(u64),

    // Punctuation
    Colon,
    Comma,
    Semi,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Special
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Component => write!(f, "component"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Integer(n) => write!(f, "{n}"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Semi => write!(f, ";"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Eof => write!(f, "EOF"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Error)]
pub enum LexError {
    #[error("unexpected character `{ch}` at {line}:{col}")]
    UnexpectedChar { ch: char, line: usize, col: usize },
}

pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.token == Token::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.input.get(self.pos).copied()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_byte() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.advance();
                }
                // Line comments: `//` to end of line.
                Some(b'/') if self.input.get(self.pos + 1) == Some(&b'/') => {
                    while let Some(b) = self.peek_byte() {
                        if b == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<SpannedToken, LexError> {
        self.skip_trivia();
        let line = self.line;
        let col = self.col;

        let spanned = |token| SpannedToken { token, line, col };

        let Some(b) = self.peek_byte() else {
            return Ok(spanned(Token::Eof));
        };

        let token = match b {
            b':' => {
                self.advance();
                Token::Colon
            }
            b',' => {
                self.advance();
                Token::Comma
            }
            b';' => {
                self.advance();
                Token::Semi
            }
            b'{' => {
                self.advance();
                Token::LBrace
            }
            b'}' => {
                self.advance();
                Token::RBrace
            }
            b'[' => {
                self.advance();
                Token::LBracket
            }
            b']' => {
                self.advance();
                Token::RBracket
            }
            b'0'..=b'9' => {
                let mut value: u64 = 0;
                while let Some(d @ b'0'..=b'9') = self.peek_byte() {
                    value = value * 10 + u64::from(d - b'0');
                    self.advance();
                }
                Token::Integer(value)
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                let start = self.pos;
                while let Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') = self.peek_byte() {
                    self.advance();
                }
                let ident = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
                match ident.as_str() {
                    "component" => Token::Component,
                    _ => Token::Ident(ident),
                }
            }
            other => {
                return Err(LexError::UnexpectedChar {
                    ch: other as char,
                    line,
                    col,
                });
            }
        };

        Ok(spanned(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_tokenize_component_block() {
        assert_eq!(
            kinds("component position { x: f64 }"),
            vec![
                Token::Component,
                Token::Ident("position".to_string()),
                Token::LBrace,
                Token::Ident("x".to_string()),
                Token::Colon,
                Token::Ident("f64".to_string()),
                Token::RBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_array_type() {
        assert_eq!(
            kinds("[u8; 4]"),
            vec![
                Token::LBracket,
                Token::Ident("u8".to_string()),
                Token::Semi,
                Token::Integer(4),
                Token::RBracket,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("// a header\ncomponent x {} // trailing"),
            vec![
                Token::Component,
                Token::Ident("x".to_string()),
                Token::LBrace,
                Token::RBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_unexpected_char_reports_position() {
        let err = Lexer::new("component $").tokenize().unwrap_err();
        match err {
            LexError::UnexpectedChar { ch, line, col } => {
                assert_eq!(ch, '$');
                assert_eq!(line, 1);
                assert_eq!(col, 11);
            }
        }
    }
}
