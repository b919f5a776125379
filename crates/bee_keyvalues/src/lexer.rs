use std::iter::Peekable;
use std::str::Chars;

use crate::error::ParseErrorKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Text(String),
    Open,
    Close,
    /// A `[$PLATFORM]` style conditional. These are dropped by the parser.
    Flag,
}

pub(crate) struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: text.trim_start_matches('\u{feff}').chars().peekable(),
            line: 1,
        }
    }

    /// Returns the next token with the line it started on.
    pub fn next_token(&mut self) -> Result<Option<(Token, usize)>, (ParseErrorKind, usize)> {
        loop {
            let Some(c) = self.chars.next() else {
                return Ok(None);
            };

            match c {
                '\n' => self.line += 1,
                c if c.is_whitespace() => {}
                '/' if self.chars.peek() == Some(&'/') => self.skip_line(),
                '{' => return Ok(Some((Token::Open, self.line))),
                '}' => return Ok(Some((Token::Close, self.line))),
                '[' => {
                    let line = self.line;
                    for c in self.chars.by_ref() {
                        if c == ']' {
                            break;
                        }
                    }
                    return Ok(Some((Token::Flag, line)));
                }
                '"' => {
                    let line = self.line;
                    let mut text = String::new();
                    loop {
                        match self.chars.next() {
                            Some('"') => break,
                            Some('\n') | None => {
                                return Err((ParseErrorKind::UnterminatedString, line));
                            }
                            Some(c) => text.push(c),
                        }
                    }
                    return Ok(Some((Token::Text(text), line)));
                }
                c => {
                    let mut text = String::from(c);
                    while let Some(&next) = self.chars.peek() {
                        if next.is_whitespace() || matches!(next, '"' | '{' | '}') {
                            break;
                        }
                        text.push(next);
                        self.chars.next();
                    }
                    return Ok(Some((Token::Text(text), self.line)));
                }
            }
        }
    }

    fn skip_line(&mut self) {
        for c in self.chars.by_ref() {
            if c == '\n' {
                self.line += 1;
                break;
            }
        }
    }
}
