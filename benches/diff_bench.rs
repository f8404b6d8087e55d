//! Benchmarks for hunkwatch core operations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hunkwatch::core::{
    compute_hunks, fingerprint_files, split_lines, ChangeKind, FileDiff, RelPath, TextBuffer,
    DEFAULT_CONTEXT, UNLIMITED_CONTEXT,
};
use hunkwatch::ui::app::{diff_rows, hunk_starts};

/// Generate a file with N lines.
fn generate_lines(n: usize, prefix: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(n * 20);
    for i in 0..n {
        buf.extend_from_slice(format!("{prefix} line number {i}\n").as_bytes());
    }
    buf
}

/// Generate a file with changes at specific positions.
fn generate_with_changes(n: usize, change_positions: &[usize]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(n * 20);
    for i in 0..n {
        if change_positions.contains(&i) {
            buf.extend_from_slice(format!("MODIFIED line number {i}\n").as_bytes());
        } else {
            buf.extend_from_slice(format!("original line number {i}\n").as_bytes());
        }
    }
    buf
}

fn bench_split_lines(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_lines");

    for size in [100, 1_000, 10_000, 100_000] {
        let data = generate_lines(size, "test");
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| split_lines(black_box(data)));
        });
    }

    group.finish();
}

fn bench_binary_check(c: &mut Criterion) {
    let data = generate_lines(100_000, "test");
    c.bench_function("TextBuffer::is_binary/100000", |b| {
        b.iter(|| TextBuffer::new(black_box(&data)).is_binary());
    });
}

fn bench_hunks(c: &mut Criterion, name: &str, sizes: &[usize], new_for: impl Fn(usize) -> Vec<u8>) {
    let mut group = c.benchmark_group(name);

    for &size in sizes {
        let old = split_lines(&generate_lines(size, "original"));
        let new = split_lines(&new_for(size));

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &(old, new),
            |b, (old, new)| {
                b.iter(|| compute_hunks(black_box(old), black_box(new), DEFAULT_CONTEXT));
            },
        );
    }

    group.finish();
}

fn bench_diff_identical(c: &mut Criterion) {
    bench_hunks(c, "compute_hunks/identical", &[100, 1_000, 10_000], |n| {
        generate_lines(n, "original")
    });
}

fn bench_diff_single_change(c: &mut Criterion) {
    bench_hunks(c, "compute_hunks/single_change", &[100, 1_000, 10_000], |n| {
        generate_with_changes(n, &[n / 2])
    });
}

fn bench_diff_many_changes(c: &mut Criterion) {
    bench_hunks(c, "compute_hunks/many_changes", &[100, 1_000, 10_000], |n| {
        let changes: Vec<usize> = (0..n).filter(|i| i % 10 == 0).collect();
        generate_with_changes(n, &changes)
    });
}

fn bench_diff_worst_case(c: &mut Criterion) {
    // Every line differs.
    bench_hunks(c, "compute_hunks/worst_case", &[100, 500, 1_000], |n| {
        generate_lines(n, "new")
    });
}

fn bench_whole_file(c: &mut Criterion) {
    let size = 10_000;
    let old = split_lines(&generate_lines(size, "original"));
    let new = split_lines(&generate_with_changes(size, &[size / 2]));
    c.bench_function("compute_hunks/whole_file/10000", |b| {
        b.iter(|| compute_hunks(black_box(&old), black_box(&new), UNLIMITED_CONTEXT));
    });
}

fn bench_layout_and_fingerprint(c: &mut Criterion) {
    let size = 10_000;
    let changes: Vec<usize> = (0..size).filter(|i| i % 50 == 0).collect();
    let old = split_lines(&generate_lines(size, "original"));
    let new = split_lines(&generate_with_changes(size, &changes));
    let hunks = compute_hunks(&old, &new, DEFAULT_CONTEXT).unwrap_or_default();
    let file = FileDiff::new(RelPath::new("big.txt"), ChangeKind::Modified, hunks);

    let mut group = c.benchmark_group("display");
    group.bench_function("hunk_starts", |b| {
        b.iter(|| {
            let rows = diff_rows(&[black_box(&file)], false);
            black_box(hunk_starts(&rows).len())
        });
    });
    group.bench_function("fingerprint", |b| {
        b.iter(|| fingerprint_files(black_box(std::slice::from_ref(&file)), &[]));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_split_lines,
    bench_binary_check,
    bench_diff_identical,
    bench_diff_single_change,
    bench_diff_many_changes,
    bench_diff_worst_case,
    bench_whole_file,
    bench_layout_and_fingerprint,
);

criterion_main!(benches);
