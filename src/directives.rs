use crate::token::Token;

/// Runs between lexing and parsing. Directives (`#def`, `#run`, ...) are not
/// expanded yet, so every token passes through in order and any directive
/// left in the stream is rejected by the parser.
pub fn process_directives(tokens: Vec<Token>) -> Vec<Token> {
    let directives = tokens.iter().filter(|t| t.kind.is_directive()).count();
    if directives > 0 {
        log::debug!("leaving {directives} directives unexpanded");
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer, token::TokenKind};

    #[test]
    fn tokens_pass_through() {
        let tokens = lexer::tokenize("#def x := 1;").unwrap();
        let kinds: Vec<_> = process_directives(tokens).iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                TokenKind::Def,
                TokenKind::Identifier,
                TokenKind::QuickAssign,
                TokenKind::Number,
                TokenKind::Semicolon
            ]
        );
    }
}
