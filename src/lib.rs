/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// Directive handling between the lexer and the parser.
pub mod directives;

/// The parser takes a sequence of tokens, mapping it into an AST. Types of
/// quick assignments are inferred while parsing.
pub mod parser;

/// The checker walks the parsed AST again with fresh scopes, rejecting
/// redeclarations, unknown names and mismatched types.
pub mod checker;

/// The generator lowers a checked AST into the [`ir`] module.
pub mod codegen;

/// Runs every pass over a single source file.
pub mod session;

pub mod ast;
pub mod ir;
pub mod symbol;
pub mod token;
pub mod types;

pub mod util {
    pub mod fmt;
    pub mod intern;
    #[cfg(test)]
    pub(crate) mod test_utils;
}
