// Query lexer - splits a filter expression into tokens

use super::token::Token;
use std::iter::Peekable;
use std::str::Chars;

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    pending: String,
    in_literal: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            chars: input.chars().peekable(),
            pending: String::new(),
            in_literal: false,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire input.
    ///
    /// Malformed input is never rejected: an unterminated literal or a
    /// dangling operator simply becomes the last token.
    pub fn tokenize(mut self) -> Vec<Token> {
        while let Some(ch) = self.chars.next() {
            if self.in_literal {
                self.pending.push(ch);
                if ch == '\'' {
                    self.in_literal = false;
                    self.flush();
                }
                continue;
            }

            match ch {
                '(' | ')' => {
                    self.flush();
                    self.tokens.push(Token::new(ch.to_string()));
                }
                '<' | '>' | '!' | '=' => {
                    self.flush();
                    self.read_operator(ch);
                }
                '\'' => {
                    self.flush();
                    self.in_literal = true;
                    self.pending.push(ch);
                }
                ' ' => self.flush(),
                _ => self.pending.push(ch),
            }
        }

        self.flush();
        self.tokens
    }

    /// Read a one or two character comparison operator
    fn read_operator(&mut self, first: char) {
        let mut op = String::with_capacity(2);
        op.push(first);
        match (first, self.chars.peek()) {
            (_, Some('=')) | ('<', Some('>')) => {
                if let Some(second) = self.chars.next() {
                    op.push(second);
                }
            }
            _ => {}
        }
        self.tokens.push(Token::new(op));
    }

    /// Emit the pending token, if any
    fn flush(&mut self) {
        if !self.pending.is_empty() {
            self.tokens.push(Token::new(std::mem::take(&mut self.pending)));
        }
    }
}

/// Split a query string into tokens, preserving case.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}
