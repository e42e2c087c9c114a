//! Index build and tagging benchmarks.
//!
//! Measures how build time scales with dictionary size and how query and
//! tagging time stay flat as the dictionary grows.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use keyword_tagger::{CategoryTagger, DataTable, KeywordDictionary, KeywordIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SYLLABLES: &[&str] = &[
    "은", "행", "송", "금", "부", "산", "주", "택", "대", "출", "경", "남", "중", "랑", "구", "시",
];

fn random_word(rng: &mut StdRng, len: usize) -> String {
    (0..len)
        .map(|_| SYLLABLES[rng.gen_range(0..SYLLABLES.len())])
        .collect()
}

/// `categories` categories with `per_category` random keywords each.
fn generate_dictionary(categories: usize, per_category: usize) -> KeywordDictionary {
    let mut rng = StdRng::seed_from_u64(1);
    let mut dictionary = KeywordDictionary::new();
    for c in 0..categories {
        for _ in 0..per_category {
            let len = rng.gen_range(2..5);
            dictionary
                .insert(format!("category_{}", c), random_word(&mut rng, len))
                .unwrap();
        }
    }
    dictionary
}

/// Article-like rows of space-separated random words.
fn generate_table(rows: usize) -> DataTable {
    let mut rng = StdRng::seed_from_u64(2);
    let rows: Vec<[String; 2]> = (0..rows)
        .map(|i| {
            let words: Vec<String> = (0..40)
                .map(|_| {
                    let len = rng.gen_range(1..4);
                    random_word(&mut rng, len)
                })
                .collect();
            [format!("link-{}", i), words.join(" ")]
        })
        .collect();
    DataTable::from_rows(["link", "body"], rows)
}

fn bench_build_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_index");

    for keywords in [100, 1_000, 10_000].iter() {
        let dictionary = generate_dictionary(10, keywords / 10);
        group.throughput(Throughput::Elements(*keywords as u64));
        group.bench_with_input(BenchmarkId::new("keywords", keywords), &dictionary, |b, d| {
            b.iter(|| black_box(KeywordIndex::build(d.clone())))
        });
    }

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    let text = generate_table(1).rows[0][1].clone();

    for keywords in [100, 1_000, 10_000].iter() {
        let index = KeywordIndex::build(generate_dictionary(10, keywords / 10));
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("keywords", keywords), &index, |b, index| {
            b.iter(|| black_box(index.query(black_box(&text))))
        });
    }

    group.finish();
}

fn bench_tag(c: &mut Criterion) {
    let mut group = c.benchmark_group("tag");
    let index = KeywordIndex::build(generate_dictionary(10, 100));
    let categories: Vec<String> = index.categories().to_vec();
    let tagger = CategoryTagger::new();

    for rows in [1_000, 10_000].iter() {
        let table = generate_table(*rows);
        group.throughput(Throughput::Elements(*rows as u64));

        group.bench_with_input(BenchmarkId::new("sequential", rows), &table, |b, table| {
            b.iter_with_setup(
                || table.clone(),
                |mut t| black_box(tagger.tag_in_place(&mut t, "body", &index, &categories).unwrap()),
            )
        });
        group.bench_with_input(BenchmarkId::new("parallel", rows), &table, |b, table| {
            b.iter_with_setup(
                || table.clone(),
                |mut t| black_box(tagger.tag_parallel(&mut t, "body", &index, &categories).unwrap()),
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build_index, bench_query, bench_tag);
criterion_main!(benches);
