use criterion::{black_box, criterion_group, criterion_main, Criterion};

use jackc::{lex, prelude::*};

fn criterion_benchmark(c: &mut Criterion) {
    let source = strip_comments(include_str!("../tests/Counter.jack"));

    c.bench_function("tokenize counter", |b| {
        b.iter(|| black_box(lex::tokenize(black_box(&source)).map(|tokens| tokens.len())))
    });

    for (name, operator_order) in [
        ("compile counter", OperatorOrder::LeftToRight),
        ("compile counter deferred", OperatorOrder::Deferred),
    ] {
        let conf = CompilerConf { operator_order };
        c.bench_function(name, |b| {
            b.iter(|| black_box(compile_str(black_box(&source), conf.clone())))
        });
    }

    c.bench_function("strip comments", |b| {
        b.iter(|| black_box(strip_comments(black_box(include_str!("../tests/Counter.jack")))))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
