use std::{fmt, ops::Range};

#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: Option<Literal>,
    span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Token {
        Token {
            kind,
            literal: None,
            span,
        }
    }

    pub fn with_literal(kind: TokenKind, span: Span, literal: Literal) -> Token {
        Token {
            kind,
            literal: Some(literal),
            span,
        }
    }

    /// Synthesizes the end-of-input token for the given source.
    pub fn eof_for(src: &str) -> Token {
        let pos = src.lines().fold(Position::new(0, 1), |pos, line| {
            let column = u32::try_from(line.chars().count() + 1).unwrap_or(u32::MAX);
            Position::new(pos.line + 1, column)
        });
        let pos = if pos.line == 0 { Position::START } else { pos };
        Token::new(TokenKind::Eof, Span::new_of_length(src.len(), 0, pos))
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn pos(&self) -> Position {
        self.span.pos
    }

    /// Returns the raw payload text, if any.
    pub fn text(&self) -> Option<&str> {
        self.literal.as_ref().map(Literal::text)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Some(literal) => write!(f, "{:?}({:?})", self.kind, literal.text()),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

/// Raw literal text carried by identifier, number and string tokens.
///
/// Strings are stored without their delimiters and before escape
/// processing, so the payload always matches the source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    Ident(Box<str>),
    Number(Box<str>),
    Str(Box<str>),
}

impl Literal {
    pub fn text(&self) -> &str {
        match self {
            Literal::Ident(s) | Literal::Number(s) | Literal::Str(s) => s,
        }
    }
}

/// A 1-based line and column pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const START: Position = Position { line: 1, column: 1 };

    pub const fn new(line: u32, column: u32) -> Position {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Span {
    pub len: u32,
    pub lo: usize,
    /// Position of the first character.
    pub pos: Position,
}

impl Span {
    pub fn new_of_bounds(Range { start: lo, end: hi }: Range<usize>, pos: Position) -> Span {
        debug_assert!(hi >= lo);
        Self::new_of_length(lo, u32::try_from(hi - lo).unwrap(), pos)
    }

    pub fn new_of_length(lo: usize, len: u32, pos: Position) -> Span {
        Span { len, lo, pos }
    }

    pub fn hi(&self) -> usize {
        self.lo + self.len as usize
    }

    /// Returns a span that covers both `self` and `other`. The position is
    /// always taken from `self`.
    pub fn to(self, other: Span) -> Span {
        let hi = self.hi().max(other.hi());
        Span::new_of_bounds(self.lo..hi, self.pos)
    }

    pub fn substr(self, src: &str) -> &str {
        &src[self.lo..self.hi()]
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { span: self, inner }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self}, len: {}, at {})", self.len, self.pos)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = self.lo;
        let hi = self.hi();
        write!(f, "{lo}..{hi}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub inner: T,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Dot,
    /// `..`
    Range,
    /// `...`
    Variadic,
    Semicolon,
    Colon,
    /// `:=`
    QuickAssign,
    Question,
    Star,
    Bang,
    BangEq,
    Percent,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,
    Tilde,
    Plus,
    Minus,
    /// `->`, member access through a pointer.
    Arrow,
    Slash,
    Assign,
    EqEq,
    Less,
    LessEq,
    Shl,
    Greater,
    GreaterEq,
    Shr,
    /// `@`, address-of.
    At,

    Identifier,
    Number,
    String,

    Void,
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Str,
    Struct,
    Fn,
    Any,

    True,
    False,

    If,
    Elif,
    Else,
    For,
    Switch,
    Case,
    Break,
    Continue,
    Return,
    As,

    Def,
    Run,
    Ifdef,
    Endif,
    Hide,
    Pack,
    Expose,
    Import,
    Native,

    Eof,
}

impl TokenKind {
    /// Keywords naming a type. `struct` only introduces a definition.
    pub fn is_type_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Void | Bool | I8 | I16 | I32 | I64 | F32 | F64 | Str | Fn | Any
        )
    }

    pub fn is_directive(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Def | Run | Ifdef | Endif | Hide | Pack | Expose | Import | Native
        )
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "void" => TokenKind::Void,
    "bool" => TokenKind::Bool,
    "i8" => TokenKind::I8,
    "i16" => TokenKind::I16,
    "i32" => TokenKind::I32,
    "i64" => TokenKind::I64,
    "f32" => TokenKind::F32,
    "f64" => TokenKind::F64,
    "string" => TokenKind::Str,
    "struct" => TokenKind::Struct,
    "fn" => TokenKind::Fn,
    "any" => TokenKind::Any,
    "true" => TokenKind::True,
    "false" => TokenKind::False,
    "if" => TokenKind::If,
    "elif" => TokenKind::Elif,
    "else" => TokenKind::Else,
    "for" => TokenKind::For,
    "switch" => TokenKind::Switch,
    "case" => TokenKind::Case,
    "break" => TokenKind::Break,
    "continue" => TokenKind::Continue,
    "return" => TokenKind::Return,
    "as" => TokenKind::As,
};

/// Keywords that may follow a `#`.
pub static DIRECTIVES: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "def" => TokenKind::Def,
    "run" => TokenKind::Run,
    "ifdef" => TokenKind::Ifdef,
    "endif" => TokenKind::Endif,
    "hide" => TokenKind::Hide,
    "pack" => TokenKind::Pack,
    "expose" => TokenKind::Expose,
    "import" => TokenKind::Import,
    "native" => TokenKind::Native,
};
