use indoc::indoc;
use pretty_assertions::assert_eq;
use tav::{
    session::{compile, CompileError, Emit, Options},
    token::Position,
    types::InternalError,
    util::fmt::report::{Reporter, Severity},
};

fn emit(src: &str, emit: Emit) -> String {
    let options = Options {
        emit,
        ..Options::default()
    };
    compile(src, &options).unwrap().artifact
}

/// Returns the code, position and message of a fatal diagnostic.
fn fatal(src: &str) -> (&'static str, Position, String) {
    match compile(src, &Options::default()) {
        Err(CompileError::Diagnostic(d)) => {
            assert_eq!(d.severity, Severity::Critical);
            (d.code.unwrap(), d.pos, d.message)
        }
        other => panic!("expected a diagnostic, got {other:?}"),
    }
}

#[test]
fn quick_assign_end_to_end() {
    let src = "x := 5;";
    assert_eq!(
        emit(src, Emit::Tokens),
        "1:1 Identifier(\"x\")\n1:3 QuickAssign\n1:6 Number(\"5\")\n1:7 Semicolon\n"
    );
    assert_eq!(
        emit(src, Emit::Ast),
        indoc! {"
            var x: i32 (0..7)
              int 5 (5..6 %: i32)
        "}
    );
    assert_eq!(
        emit(src, Emit::Ir),
        indoc! {"
            ; module main

            declare i32 @printf(*i8, ...)

            define void @tav.init() {
            bb0: ; entry
              %0 = alloca i32
              %1 = const i32 5
              store %0, %1
              ret void
            }
        "}
    );
}

#[test]
fn function_with_params_has_no_diagnostics() {
    let output = compile(
        "add : fn i32 (a: i32, b: i32) { return a + b; }",
        &Options {
            emit: Emit::Ast,
            ..Options::default()
        },
    )
    .unwrap();
    assert!(output.warnings.is_empty());
    assert_eq!(
        output.artifact,
        indoc! {"
            fn add: i32 (0..47)
              param a: i32
              param b: i32
              return (32..45)
                binary Add (39..44)
                  ident a (39..40)
                  ident b (43..44)
        "}
    );
}

#[test]
fn string_cannot_initialize_int() {
    let (code, pos, message) = fatal(r#"x : i32 = "hi";"#);
    assert_eq!(code, "ERR_INVALID_TYPE");
    assert_eq!(pos, Position::new(1, 11));
    assert_eq!(message, "expected type i32, but got string");
}

#[test]
fn undeclared_identifier_in_quick_assign() {
    let (code, pos, message) = fatal("y := z;");
    assert_eq!(code, "ERR_INVALID_IDENTIFIER");
    assert_eq!(pos, Position::new(1, 6));
    assert_eq!(message, "z is not defined");
}

#[test]
fn struct_member_resolves_to_member_type() {
    let src = "Point : struct { x: i32; y: i32; } p : Point; v := p.x;";
    assert_eq!(
        emit(src, Emit::Ast),
        indoc! {"
            struct Point (0..34)
              member x: i32
              member y: i32
            var p: Point (35..45)
            var v: i32 (46..55)
              member x (51..54)
                ident p (51..52)
        "}
    );
}

#[test]
fn redeclared_function() {
    let src = "twice : fn i32 (n: i32) { return n * 2; }\ntwice : fn i32 (n: i32) { return n + n; }";
    let (code, pos, _) = fatal(src);
    assert_eq!(code, "ERR_REDECLARED");
    assert_eq!(pos, Position::new(2, 1));
}

#[test]
fn lexical_errors_are_fatal() {
    let (code, pos, message) = fatal("x := 1;\ny := $;");
    assert_eq!(code, "ERR_UNEXPECTED_CHAR");
    assert_eq!(pos, Position::new(2, 6));
    assert_eq!(message, "unexpected character '$'");
}

#[test]
fn unsupported_lowering_is_fatal() {
    let (code, _, message) = fatal("f : fn i32 (a: i32) { return a % 2; }");
    assert_eq!(code, "ERR_UNSUPPORTED");
    assert_eq!(message, "unsupported: remainder");
}

#[test]
fn pointer_arithmetic_is_a_user_error() {
    let (code, _, message) = fatal("f : fn (a: i32) { p := @a; q := p + 1; }");
    assert_eq!(code, "ERR_UNSUPPORTED");
    assert_eq!(message, "unsupported: conversion between these types");
}

#[test]
fn any_typed_variable_is_a_user_error() {
    let error = compile("f : fn { x : any; }", &Options::default()).unwrap_err();
    assert_eq!(error.exit_code(), 2);
    assert!(matches!(error, CompileError::Diagnostic(d) if d.code == Some("ERR_UNSUPPORTED")));
}

#[test]
fn incompatible_join_is_internal() {
    let src = "P : struct { a: i32; } p : P; x := p + 1;";
    let error = compile(src, &Options::default()).unwrap_err();
    assert!(matches!(
        error,
        CompileError::Internal(InternalError::IncompatibleJoin { .. })
    ));
    assert_eq!(error.exit_code(), 101);
}

#[test]
fn truncation_warning_is_rendered() {
    let src = "x : i32 = 2.9;";
    let output = compile(src, &Options::default()).unwrap();
    assert_eq!(output.warnings.len(), 1);

    let reporter = Reporter::new("main.tv", src);
    assert_eq!(
        reporter.render(&output.warnings[0]),
        indoc! {"
            WARNING line 1, column 11, main.tv
            x : i32 = 2.9;
                      ^
            _________/
            implicit cast truncates float literal to i32"}
    );
}

#[test]
fn fatal_diagnostic_is_rendered() {
    let src = "f : fn i32 {\n  return;\n}";
    let error = compile(src, &Options::default()).unwrap_err();
    assert_eq!(error.exit_code(), 2);
    assert_eq!(
        error.render(&Reporter::new("f.tv", src)),
        indoc! {"
            CRITICAL ERROR line 2, column 3, f.tv
              return;
              ^
            _/
            function returns i32, but got void"}
    );
}
