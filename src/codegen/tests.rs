use indoc::indoc;
use pretty_assertions::assert_eq;

use crate::{
    checker::Checker,
    codegen::{generate, Error, INIT_FN},
    ir::{InstrKind, Module},
    lexer, parser,
    token::Spanned,
    util::intern::Interner,
};

fn lower(src: &str) -> Result<Module, Spanned<Error>> {
    let mut i = Interner::with_capacity(16);
    let tokens = lexer::tokenize(src).unwrap();
    let program = parser::parse_program(src, &tokens, &mut i).unwrap();
    let (program, _) = Checker::with_capacity(&mut i, 16).check(program).unwrap();
    generate(&program, &mut i, "test")
}

fn function_ir(src: &str, name: &str) -> String {
    let module = lower(src).unwrap();
    module.function(name).unwrap().to_string()
}

fn unsupported(src: &str) -> (&'static str, String) {
    let error = lower(src).unwrap_err();
    let Error::Unsupported(what) = error.inner else {
        panic!("expected an unsupported error, got {error:?}");
    };
    (what, error.span.to_string())
}

#[test]
fn top_level_quick_assign() {
    let ir = function_ir("x := 5;", INIT_FN);
    assert_eq!(
        ir,
        indoc! {"
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
fn init_function_only_when_needed() {
    let module = lower("f : fn { }").unwrap();
    assert!(module.function(INIT_FN).is_none());
}

#[test]
fn parameters_are_used_directly() {
    let ir = function_ir("add : fn i32 (a: i32, b: i32) { return a + b; }", "add");
    assert_eq!(
        ir,
        indoc! {"
            define i32 @add(i32 %0, i32 %1) {
            bb0: ; entry
              %2 = add %0, %1
              ret %2
            }
        "}
    );
}

#[test]
fn mixed_arithmetic_converts_to_float() {
    let ir = function_ir("f : fn f32 (a: i32, b: f32) { return a * b; }", "f");
    assert_eq!(
        ir,
        indoc! {"
            define f32 @f(i32 %0, f32 %1) {
            bb0: ; entry
              %2 = sitofp %0 to f32
              %3 = fmul %2, %1
              ret %3
            }
        "}
    );
}

#[test]
fn explicit_cast() {
    let ir = function_ir("f : fn f64 (a: i32) { return a as f64; }", "f");
    assert_eq!(
        ir,
        indoc! {"
            define f64 @f(i32 %0) {
            bb0: ; entry
              %1 = sitofp %0 to f64
              ret %1
            }
        "}
    );
}

#[test]
fn if_elif_else_chain() {
    let src = "sign : fn i32 (n: i32) { if n > 0 { return 1; } elif n < 0 { return -1; } else { return 0; } }";
    assert_eq!(
        function_ir(src, "sign"),
        indoc! {"
            define i32 @sign(i32 %0) {
            bb0: ; entry
              br bb2
            bb2: ; if.cond
              %1 = const i32 0
              %2 = icmp sgt %0, %1
              br %2, bb3, bb4
            bb3: ; if.then
              %3 = const i32 1
              ret %3
            bb4: ; elif.cond
              %4 = const i32 0
              %5 = icmp slt %0, %4
              br %5, bb5, bb6
            bb5: ; elif.then
              %6 = const i32 1
              %7 = neg %6
              ret %7
            bb6: ; if.else
              %8 = const i32 0
              ret %8
            bb1: ; if.end
              unreachable
            }
        "}
    );
}

#[test]
fn integer_condition_compares_against_zero() {
    let src = "f : fn (n: i64) { if n { return; } }";
    assert_eq!(
        function_ir(src, "f"),
        indoc! {"
            define void @f(i64 %0) {
            bb0: ; entry
              br bb2
            bb2: ; if.cond
              %1 = const i64 0
              %2 = icmp ne %0, %1
              br %2, bb3, bb1
            bb3: ; if.then
              ret void
            bb1: ; if.end
              ret void
            }
        "}
    );
}

#[test]
fn struct_members_are_addressed_at_field_zero() {
    let src = "P : struct { x: i32; y: i32; } main : fn i32 { p : P; p.y = 4; return p.y; }";
    assert_eq!(
        lower(src).unwrap().to_string(),
        indoc! {"
            ; module test
            struct P = {i32, i32}

            declare i32 @printf(*i8, ...)

            define i32 @main() {
            bb0: ; entry
              %0 = alloca {i32, i32}
              %1 = getfieldptr %0, 0, 0
              %2 = const i32 4
              store %1, %2
              %3 = getfieldptr %0, 0, 0
              %4 = load i32, %3
              ret %4
            }
        "}
    );
}

#[test]
fn struct_parameters_are_passed_by_address() {
    let src = "P : struct { x: i32; } getx : fn i32 (p: P) { return p.x; } \
               main : fn i32 { q : P; return getx(q); }";
    let module = lower(src).unwrap();
    assert_eq!(
        module.function("getx").unwrap().to_string(),
        indoc! {"
            define i32 @getx(*{i32} %0) {
            bb0: ; entry
              %1 = getfieldptr %0, 0, 0
              %2 = load i32, %1
              ret %2
            }
        "}
    );
    assert_eq!(
        module.function("main").unwrap().to_string(),
        indoc! {"
            define i32 @main() {
            bb0: ; entry
              %0 = alloca {i32}
              %1 = call @getx(%0)
              ret %1
            }
        "}
    );
}

#[test]
fn arrow_loads_the_struct_pointer() {
    let src = "N : struct { v: i64; } f : fn i64 { n : *N; return n->v; }";
    assert_eq!(
        function_ir(src, "f"),
        indoc! {"
            define i64 @f() {
            bb0: ; entry
              %0 = alloca *{i64}
              %1 = load *{i64}, %0
              %2 = getfieldptr %1, 0, 0
              %3 = load i64, %2
              ret %3
            }
        "}
    );
}

#[test]
fn variadic_float_arguments_are_promoted() {
    let src = r#"main : fn { x := 1.5; printf("%f", x); }"#;
    assert_eq!(
        function_ir(src, "main"),
        indoc! {r#"
            define void @main() {
            bb0: ; entry
              %0 = alloca f32
              %1 = const f32 1.5
              store %0, %1
              %2 = const *i8 "%f"
              %3 = load f32, %0
              %4 = fpext %3 to f64
              %5 = call @printf(%2, %4)
              ret void
            }
        "#}
    );
}

#[test]
fn address_of_and_deref_reinterpret_bits() {
    let src = "f : fn i32 (a: i32) { p := @a; return *p; }";
    assert_eq!(
        function_ir(src, "f"),
        indoc! {"
            define i32 @f(i32 %0) {
            bb0: ; entry
              %1 = alloca *i32
              %2 = inttoptr %0 to *i32
              store %1, %2
              %3 = load *i32, %1
              %4 = ptrtoint %3 to i32
              ret %4
            }
        "}
    );
}

#[test]
fn recursive_call_by_name() {
    let src = "fact : fn i64 (n: i64) { if n < 2 { return 1; } return n * fact(n - 1); }";
    let module = lower(src).unwrap();
    let fact = module.function("fact").unwrap();
    let calls = fact
        .instructions()
        .filter(|i| matches!(&i.kind, InstrKind::Call { func, .. } if func == "fact"))
        .count();
    assert_eq!(calls, 1);
}

#[test]
fn shadowed_functions_get_unique_names() {
    let module = lower("f : fn { } g : fn { f : fn { } }").unwrap();
    let names: Vec<_> = module.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["printf", "f", "f.1", "g"]);
}

#[test]
fn external_declarations() {
    let module = lower("puts : fn i32 (s: string); abs : fn i64 (v: i64, ...);").unwrap();
    let puts = module.function("puts").unwrap();
    assert!(puts.is_external && !puts.is_vararg);
    assert_eq!(module.function("abs").unwrap().to_string(), "declare i64 @abs(i64, ...)\n");
}

#[test]
fn unsupported_constructs() {
    assert_eq!(
        unsupported("f : fn i32 (a: i32) { return a / 2; }"),
        ("integer division", "29..34".to_owned())
    );
    assert_eq!(
        unsupported("f : fn i32 (a: i32) { return a % 2; }"),
        ("remainder", "29..34".to_owned())
    );
    assert_eq!(
        unsupported("f : fn (a: i32) { for a { break; } }"),
        ("loops", "18..34".to_owned())
    );
    assert_eq!(
        unsupported("f : fn (a: i32) { a = 2; }"),
        ("assignment to a parameter", "18..19".to_owned())
    );
    assert_eq!(
        unsupported("f : fn { x : any; }"),
        ("values of type any", "9..10".to_owned())
    );
    assert_eq!(
        unsupported("x := 1; f : fn i32 { return x; }"),
        ("reference to another function's local", "28..29".to_owned())
    );
}

#[test]
fn error_codes() {
    let error = lower("f : fn i32 (a: i32) { return a / 2; }").unwrap_err();
    assert_eq!(error.inner.code(), "ERR_UNSUPPORTED");
}
