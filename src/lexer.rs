use std::{iter::Peekable, str::Chars};

use crate::token::{Literal, Position, Span, Spanned, Token, TokenKind, DIRECTIVES, KEYWORDS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 8_192;

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Lexes the provided string, producing the tokens into the provided buffer.
///
/// Stops at the first lexical error.
pub fn lex(src: &str, tokens: &mut Vec<Token>) -> Result<()> {
    Lexer::new(src, tokens).lex()
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY.min(src.len() / 2 + 8));
    lex(src, &mut tokens)?;
    Ok(tokens)
}

enum Step {
    Produce(TokenKind),
    ProduceLiteral(TokenKind, Literal),
    Skip,
    Done,
}

struct Lexer<'src, 'tok> {
    src: &'src str,
    iter: Peekable<Chars<'src>>,
    cursor: usize,
    current_lo: usize,
    pos: Position,
    current_pos: Position,
    tokens: &'tok mut Vec<Token>,
}

impl Lexer<'_, '_> {
    /// Scans the source string until the input is exhausted.
    fn lex(mut self) -> Result<()> {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");
        loop {
            match self.scan()? {
                Step::Produce(kind) => self.tokens.push(Token::new(kind, self.span())),
                Step::ProduceLiteral(kind, literal) => {
                    let token = Token::with_literal(kind, self.span(), literal);
                    self.tokens.push(token);
                }
                Step::Skip => (),
                Step::Done => break,
            }
        }
        log::trace!("lexed {} tokens", self.tokens.len());
        Ok(())
    }

    /// Tries to scan the current character.
    fn scan(&mut self) -> Result<Step> {
        use TokenKind::*;
        if self.at_end() {
            return Ok(Step::Done);
        }
        let kind = match self.mark_advance() {
            '{' => LBrace,
            '}' => RBrace,
            '[' => LBracket,
            ']' => RBracket,
            '(' => LParen,
            ')' => RParen,
            ',' => Comma,
            ';' => Semicolon,
            '?' => Question,
            '*' => Star,
            '%' => Percent,
            '^' => Caret,
            '~' => Tilde,
            '+' => Plus,
            '@' => At,
            '.' => match self.peek() {
                '.' => {
                    self.advance();
                    match self.peek() {
                        '.' => self.advance_with(Variadic),
                        _ => Range,
                    }
                }
                _ => Dot,
            },
            ':' => match self.peek() {
                '=' => self.advance_with(QuickAssign),
                _ => Colon,
            },
            '!' => match self.peek() {
                '=' => self.advance_with(BangEq),
                _ => Bang,
            },
            '&' => match self.peek() {
                '&' => self.advance_with(AmpAmp),
                _ => Amp,
            },
            '|' => match self.peek() {
                '|' => self.advance_with(PipePipe),
                _ => Pipe,
            },
            '-' => match self.peek() {
                '>' => self.advance_with(Arrow),
                _ => Minus,
            },
            '=' => match self.peek() {
                '=' => self.advance_with(EqEq),
                _ => Assign,
            },
            '<' => match self.peek() {
                '=' => self.advance_with(LessEq),
                '<' => self.advance_with(Shl),
                _ => Less,
            },
            '>' => match self.peek() {
                '=' => self.advance_with(GreaterEq),
                '>' => self.advance_with(Shr),
                _ => Greater,
            },
            '/' => match self.peek() {
                '/' => return Ok(self.line_comment()),
                '*' => return Ok(self.block_comment()),
                _ => Slash,
            },
            delim @ ('"' | '\'') => return self.string(delim),
            '#' => return self.directive(),
            c if c.is_ascii_digit() => return self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => return Ok(self.identifier_or_keyword()),
            c if c.is_whitespace() => return Ok(self.whitespace()),
            c => return Err(self.span().wrap(Error::UnexpectedChar(c))),
        };
        Ok(Step::Produce(kind))
    }

    /// Scans a string delimited by `delim`. A backslash escapes the next
    /// character, so an escaped delimiter does not close the string. The
    /// escapes themselves are only resolved by [`extract::escaped_string`].
    fn string(&mut self, delim: char) -> Result<Step> {
        loop {
            if self.at_end() {
                return Err(self.span().wrap(Error::UnterminatedString));
            }
            match self.advance() {
                '\\' => {
                    if self.at_end() {
                        return Err(self.span().wrap(Error::UnterminatedString));
                    }
                    self.advance();
                }
                c if c == delim => break,
                _ => (),
            }
        }
        let raw = &self.substr()[1..self.substr().len() - 1];
        Ok(Step::ProduceLiteral(TokenKind::String, Literal::Str(raw.into())))
    }

    fn number(&mut self) -> Result<Step> {
        let mut dots = 0;
        loop {
            match self.peek() {
                c if c.is_ascii_digit() => {
                    self.advance();
                }
                '.' => {
                    dots += 1;
                    self.advance();
                    if dots > 1 {
                        return Err(self.span().wrap(Error::MalformedNumber));
                    }
                }
                _ => break,
            }
        }
        let text = self.substr().into();
        Ok(Step::ProduceLiteral(TokenKind::Number, Literal::Number(text)))
    }

    fn identifier_or_keyword(&mut self) -> Step {
        while matches!(self.peek(), c if c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }
        let substr = self.substr();
        match KEYWORDS.get(substr).copied() {
            Some(keyword) => Step::Produce(keyword),
            None => Step::ProduceLiteral(TokenKind::Identifier, Literal::Ident(substr.into())),
        }
    }

    fn directive(&mut self) -> Result<Step> {
        while self.peek().is_ascii_alphabetic() {
            self.advance();
        }
        let name = &self.substr()[1..];
        match DIRECTIVES.get(name).copied() {
            Some(directive) => Ok(Step::Produce(directive)),
            None => Err(self.span().wrap(Error::UnknownDirective(name.into()))),
        }
    }

    fn whitespace(&mut self) -> Step {
        while !self.at_end() && self.peek().is_whitespace() {
            self.advance();
        }
        Step::Skip
    }

    fn line_comment(&mut self) -> Step {
        assert_eq!(self.advance(), '/');
        while !self.at_end() && self.peek() != '\n' {
            self.advance();
        }
        Step::Skip
    }

    /// Block comments nest. An unclosed comment silently runs to the end of
    /// the input.
    fn block_comment(&mut self) -> Step {
        assert_eq!(self.advance(), '*');
        let mut depth = 1_u32;
        while depth > 0 && !self.at_end() {
            match (self.advance(), self.peek()) {
                ('/', '*') => {
                    self.advance();
                    depth += 1;
                }
                ('*', '/') => {
                    self.advance();
                    depth -= 1;
                }
                _ => (),
            }
        }
        Step::Skip
    }
}

impl Lexer<'_, '_> {
    /// Constructs a new lexer with the default state.
    fn new<'src, 'tok>(src: &'src str, tokens: &'tok mut Vec<Token>) -> Lexer<'src, 'tok> {
        Lexer {
            src,
            iter: src.chars().peekable(),
            cursor: 0,
            current_lo: 0,
            pos: Position::START,
            current_pos: Position::START,
            tokens,
        }
    }

    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> char {
        self.current_lo = self.cursor;
        self.current_pos = self.pos;
        self.advance()
    }

    /// Returns the next character and advances the iterator, keeping track of
    /// the line and column.
    fn advance(&mut self) -> char {
        let Some(c) = self.iter.next() else {
            return '\0';
        };
        self.cursor += c.len_utf8();
        if c == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        c
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    /// Returns the next character without advancing the iterator.
    fn peek(&mut self) -> char {
        self.iter.peek().copied().unwrap_or('\0')
    }

    fn at_end(&mut self) -> bool {
        self.iter.peek().is_none()
    }

    /// Returns the current span.
    fn span(&self) -> Span {
        Span::new_of_bounds(self.current_lo..self.cursor, self.current_pos)
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        self.span().substr(self.src)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnexpectedChar(char),
    UnterminatedString,
    MalformedNumber,
    UnknownDirective(Box<str>),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnexpectedChar(_) => "ERR_UNEXPECTED_CHAR",
            Error::UnterminatedString => "ERR_UNTERMINATED_STRING",
            Error::MalformedNumber => "ERR_MALFORMED_NUMBER",
            Error::UnknownDirective(_) => "ERR_UNKNOWN_DIRECTIVE",
        }
    }
}

pub mod extract {
    /// Resolves the backslash escapes of a raw string payload.
    pub fn escaped_string(raw: &str) -> Box<str> {
        if !raw.contains('\\') {
            return raw.into();
        }
        perform_escape(raw).into_boxed_str()
    }

    fn perform_escape(raw: &str) -> String {
        let mut buf = String::with_capacity(raw.len());
        let mut escaped = false;
        for char in raw.chars() {
            let char = match (escaped, char) {
                (true, 'n') => '\n',
                (true, 't') => '\t',
                (true, 'r') => '\r',
                (true, '0') => '\0',
                (false, '\\') => {
                    escaped = true;
                    continue;
                }
                (_, char) => char,
            };
            escaped = false;
            buf.push(char);
        }
        buf.shrink_to_fit();
        buf
    }
}
