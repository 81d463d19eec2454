//! Grammar throughput benchmarks
//!
//! Measures tokenizing, parsing, rendering and rewriting over:
//! - Expressions of growing length (comma lists of 10, 100, 1000 paths)
//! - Nesting depth (parenthesized levels of 4, 16, 31)
//!
//! Run benchmarks: `cargo bench --bench parse_throughput`
//!
//! Compare specific stages:
//! ```
//! cargo bench --bench parse_throughput -- "parse_length"
//! cargo bench --bench parse_throughput -- "rewrite"
//! ```

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use xpgram::{Grammar, Node, Render, RewriteMode, join, parse_all, rewrite, tokenize};

/// A comma list of `count` realistic path expressions
fn path_list(count: usize) -> String {
    (0..count)
        .map(|i| format!("//book[@id = '{i}']/title[position() lt {i}] ! string(.)"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn nested(depth: usize) -> String {
    format!("{}$x + 1{}", "(".repeat(depth), ")".repeat(depth))
}

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");

    for count in [10, 100, 1000] {
        let source = path_list(count);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("paths", count), &source, |b, source| {
            b.iter(|| tokenize(black_box(source)))
        });
    }

    group.finish();
}

fn bench_parse_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_length");

    for count in [10, 100, 1000] {
        let source = path_list(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("paths", count), &source, |b, source| {
            b.iter(|| parse_all(black_box(source)))
        });
    }

    group.finish();
}

fn bench_parse_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_depth");
    let grammar = Grammar::default();

    for depth in [4, 16, 31] {
        let source = nested(depth);
        group.bench_with_input(BenchmarkId::new("levels", depth), &source, |b, source| {
            b.iter(|| grammar.parse_all(black_box(source)))
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for count in [10, 100] {
        let Ok(tree) = parse_all(&path_list(count)) else {
            continue;
        };
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("paths", count), &tree, |b, tree| {
            b.iter(|| join(&black_box(tree).render()))
        });
    }

    group.finish();
}

fn bench_rewrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("rewrite");
    let Ok(tree) = parse_all(&path_list(100)) else {
        return;
    };

    group.bench_function("identity", |b| {
        b.iter(|| rewrite(black_box(&tree), |node, _| node))
    });
    group.bench_function("replace_strings", |b| {
        b.iter(|| {
            rewrite(black_box(&tree), |node, _| match &*node {
                Node::String(_) => Node::string("x"),
                _ => node,
            })
        })
    });
    for mode in [RewriteMode::Eager, RewriteMode::Lazy] {
        let source = "let $a := 1 return ".repeat(30) + "$a";
        let Ok(lets) = parse_all(&source) else {
            continue;
        };
        group.bench_with_input(
            BenchmarkId::new("nested_lets", format!("{mode:?}")),
            &lets,
            |b, lets| b.iter(|| xpgram::xpath31::rewrite_with(lets, |node, _| node, mode)),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_tokenize,
    bench_parse_length,
    bench_parse_depth,
    bench_render,
    bench_rewrite
);
criterion_main!(benches);
