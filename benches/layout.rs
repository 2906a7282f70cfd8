use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;
use wordcloud_layout::config::Config;
use wordcloud_layout::layout::compute_layout_with_rng;
use wordcloud_layout::parser::parse_words;
use wordcloud_layout::render::render_svg;
use wordcloud_layout::text_metrics::ApproxMeasure;
use wordcloud_layout::weight::SizingStrategy;

const SIZES: [usize; 4] = [10, 50, 200, 800];

/// `count` lines of `text | weight | group` with a skewed weight spread.
fn word_list_source(count: usize) -> String {
    let mut out = String::from("# generated\n");
    for i in 0..count {
        let weight = 1 + (i * 7919) % 97;
        let group = 1 + i % 5;
        out.push_str(&format!("term{} | {} | {}\n", i, weight, group));
    }
    out
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for count in SIZES {
        let input = word_list_source(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, data| {
            b.iter(|| {
                let words = parse_words(black_box(data)).expect("parse failed");
                black_box(words.len());
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let measure = ApproxMeasure::default();
    for strategy in [SizingStrategy::Continuous, SizingStrategy::Categorical] {
        let mut group = c.benchmark_group(format!("layout_{strategy:?}").to_lowercase());
        let mut config = Config::default();
        config.layout.strategy = strategy;
        for count in SIZES {
            let words = parse_words(&word_list_source(count)).expect("parse failed");
            group.bench_with_input(BenchmarkId::from_parameter(count), &words, |b, words| {
                b.iter(|| {
                    let mut rng = StdRng::seed_from_u64(7);
                    let result = compute_layout_with_rng(black_box(words), &measure, &config, &mut rng)
                        .expect("layout failed");
                    black_box(result.placements.len());
                });
            });
        }
        group.finish();
    }
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let measure = ApproxMeasure::default();
    let config = Config::default();
    for count in SIZES {
        let input = word_list_source(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, data| {
            b.iter(|| {
                let words = parse_words(black_box(data)).expect("parse failed");
                let mut rng = StdRng::seed_from_u64(7);
                let result =
                    compute_layout_with_rng(&words, &measure, &config, &mut rng).expect("layout failed");
                let svg = render_svg(&result, &config);
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_layout, bench_end_to_end);
criterion_main!(benches);
