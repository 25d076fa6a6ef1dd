use criterion::{black_box, criterion_group, criterion_main, Criterion};
use minifn::compiler::{lower, Interpreter};
use minifn::{parse, CompileOptions, Compiler, Scanner};

fn sample_source(functions: usize) -> String {
    (0..functions)
        .map(|i| format!("fn f{}(a, b, c) {{ a * (b / 3) + c - {} * a / (b * 2) + 7 }}\n", i, i))
        .collect()
}

fn lexer_benchmark(c: &mut Criterion) {
    let source = sample_source(50);

    c.bench_function("tokenize 50 functions", |b| {
        b.iter(|| Scanner::new(black_box(&source)).scan_tokens())
    });
}

fn parser_benchmark(c: &mut Criterion) {
    let source = sample_source(50);

    c.bench_function("parse 50 functions", |b| {
        b.iter(|| parse(black_box(&source)).unwrap())
    });
}

fn lowering_benchmark(c: &mut Criterion) {
    let program = parse(&sample_source(500)).unwrap();

    c.bench_function("lower 500 functions", |b| {
        b.iter(|| lower(black_box(&program)).unwrap())
    });

    let sequential = Compiler::new(CompileOptions::default());
    let parallel = Compiler::new(CompileOptions {
        parallel: true,
        ..Default::default()
    });
    c.bench_function("compile 500 functions (sequential)", |b| {
        b.iter(|| sequential.compile_ast(black_box(&program)).unwrap())
    });
    c.bench_function("compile 500 functions (parallel)", |b| {
        b.iter(|| parallel.compile_ast(black_box(&program)).unwrap())
    });
}

fn interpreter_benchmark(c: &mut Criterion) {
    let result = Compiler::new(CompileOptions {
        opt_level: 2,
        ..Default::default()
    })
    .compile(&sample_source(1))
    .unwrap();
    let interp = Interpreter::new(&result.module);

    c.bench_function("call compiled function", |b| {
        b.iter(|| interp.call("f0", black_box(&[10, 20, 30])).unwrap())
    });
}

criterion_group!(
    benches,
    lexer_benchmark,
    parser_benchmark,
    lowering_benchmark,
    interpreter_benchmark
);
criterion_main!(benches);
