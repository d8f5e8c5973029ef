use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use tav::{lexer, token::Token};

static INPUT: &str = include_str!("../../fixtures/sample.tv");

fn lexer(input: &str, tokens: &mut Vec<Token>) {
    lexer::lex(input, tokens).unwrap();
    black_box(tokens.len());
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut tokens = Vec::with_capacity(lexer::SUGGESTED_TOKENS_CAPACITY);

    c.bench_function("lexer", |b| {
        b.iter(|| {
            tokens.clear();
            lexer(black_box(INPUT), &mut tokens);
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
