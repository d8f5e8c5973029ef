use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use tav::{lexer, parser::parse_program, util::intern::Interner};

static INPUT: &str = include_str!("../../fixtures/sample.tv");

fn criterion_benchmark(c: &mut Criterion) {
    let tokens = lexer::tokenize(INPUT).unwrap();

    c.bench_function("parser", |b| {
        b.iter(|| {
            let mut interner = Interner::with_capacity(128);
            let program = parse_program(black_box(INPUT), &tokens, &mut interner).unwrap();
            black_box(program);
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
