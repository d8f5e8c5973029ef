use std::{fmt::Write, path::Path, time::Instant};

use crate::{
    ast::Program,
    checker::{self, Checker},
    codegen, directives, lexer, parser,
    token::{Spanned, Token},
    types::InternalError,
    util::{
        fmt::{
            report::{Diagnostic, Reporter},
            tree, Context, Show,
        },
        intern::Interner,
    },
};

/// What [`compile`] produces.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Emit {
    Tokens,
    /// The checked tree.
    Ast,
    #[default]
    Ir,
}

#[derive(Clone, Debug)]
pub struct Options {
    /// Used in diagnostics and to name the module.
    pub file_name: String,
    pub emit: Emit,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            file_name: "main.tv".into(),
            emit: Emit::default(),
        }
    }
}

#[derive(Debug)]
pub struct Output {
    pub warnings: Vec<Diagnostic>,
    pub artifact: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A problem with the compiled source.
    #[error("{}", .0.message)]
    Diagnostic(Diagnostic),
    #[error("internal compiler error: {0}")]
    Internal(#[from] InternalError),
}

impl CompileError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Diagnostic(_) => 2,
            CompileError::Internal(_) => 101,
        }
    }

    /// Renders the error the way the driver prints it.
    pub fn render(&self, reporter: &Reporter<'_>) -> String {
        match self {
            CompileError::Diagnostic(diagnostic) => reporter.render(diagnostic),
            CompileError::Internal(_) => self.to_string(),
        }
    }
}

/// Runs the whole pipeline over one source file, stopping at the first fatal
/// error.
pub fn compile(src: &str, options: &Options) -> Result<Output, CompileError> {
    let start = Instant::now();
    let mut interner = Interner::with_capacity(256);

    let src = preprocess(src);

    let tokens = timed("lexer", || lexer::tokenize(&src))
        .map_err(|e| fatal(&interner, e.inner.code(), &e))?;
    let tokens = directives::process_directives(tokens);
    log::debug!("lexed {} tokens", tokens.len());
    if options.emit == Emit::Tokens {
        return Ok(Output {
            warnings: Vec::new(),
            artifact: print_tokens(&tokens),
        });
    }

    let program = match timed("parser", || parser::parse_program(&src, &tokens, &mut interner)) {
        Ok(program) => program,
        Err(Spanned {
            inner: parser::Error::Internal(error),
            ..
        }) => return Err(error.into()),
        Err(e) => return Err(fatal(&interner, e.inner.code(), &e)),
    };

    let checked = timed("checker", || Checker::with_capacity(&mut interner, 128).check(program));
    let (program, warnings) = match checked {
        Ok(checked) => checked,
        Err(Spanned {
            inner: checker::Error::Internal(error),
            ..
        }) => return Err(error.into()),
        Err(e) => return Err(fatal(&interner, e.inner.code(), &e)),
    };
    let warnings: Vec<_> = warnings.iter().map(|w| warning(&interner, w)).collect();

    let program = optimize(program);

    let artifact = if options.emit == Emit::Ast {
        tree::print_program_string(&interner, &program)
    } else {
        let module_name = module_name(&options.file_name);
        let generated = timed("generator", || {
            codegen::generate(&program, &mut interner, module_name)
        });
        match generated {
            Ok(module) => module.to_string(),
            Err(Spanned {
                inner: codegen::Error::Internal(error),
                ..
            }) => return Err(error.into()),
            Err(e) => return Err(fatal(&interner, e.inner.code(), &e)),
        }
    };

    log::debug!(
        "front end took {:?} ({} identifiers)",
        start.elapsed(),
        interner.len()
    );
    Ok(Output { warnings, artifact })
}

/// Source-level rewriting ahead of the lexer. Nothing is rewritten yet.
pub fn preprocess(src: &str) -> std::borrow::Cow<'_, str> {
    std::borrow::Cow::Borrowed(src)
}

/// Tree-level rewriting between checking and generation. No passes exist yet.
pub fn optimize(program: Program) -> Program {
    program
}

fn timed<T>(stage: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = f();
    log::trace!("{stage} took {:?}", start.elapsed());
    result
}

fn fatal<E>(interner: &Interner<str>, code: &'static str, error: &Spanned<E>) -> CompileError
where
    Spanned<E>: Show,
{
    let ctx = Context {
        ident_interner: interner,
    };
    let message = error.display(&ctx).to_string();
    CompileError::Diagnostic(Diagnostic::critical(code, error.span.pos, message))
}

fn warning(interner: &Interner<str>, warning: &Spanned<checker::Warning>) -> Diagnostic {
    let ctx = Context {
        ident_interner: interner,
    };
    let message = warning.display(&ctx).to_string();
    Diagnostic::warning(warning.span.pos, message)
}

fn print_tokens(tokens: &[Token]) -> String {
    let mut out = String::with_capacity(tokens.len() * 16);
    for token in tokens {
        _ = writeln!(out, "{} {token:?}", token.pos());
    }
    out
}

fn module_name(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_is_named_after_the_file() {
        assert_eq!(module_name("dir/hello.tv"), "hello");
        assert_eq!(module_name("plain"), "plain");
    }

    #[test]
    fn token_artifact() {
        let options = Options {
            emit: Emit::Tokens,
            ..Options::default()
        };
        let output = compile("x := 1;", &options).unwrap();
        assert_eq!(
            output.artifact,
            "1:1 Identifier(\"x\")\n1:3 QuickAssign\n1:6 Number(\"1\")\n1:7 Semicolon\n"
        );
    }

    #[test]
    fn exit_codes() {
        let internal = CompileError::Internal(InternalError::NegativeIndirection);
        assert_eq!(internal.exit_code(), 101);

        let error = compile("x := ;", &Options::default()).unwrap_err();
        assert_eq!(error.exit_code(), 2);
    }
}
