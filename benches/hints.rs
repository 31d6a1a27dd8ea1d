use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use cryptic_hints::{AuthorStyle, HintGenerator, HintRequest, assemble, classify, detect_author};
use std::sync::Once;

const EXPLANATIONS: &[(&str, &str)] = &[
    ("anagram", "An anagram ('terrible') of RIDE gives DIRE."),
    (
        "container",
        "EASY ('simple') in GOON ('old comedian'), around which the letters are arranged.",
    ),
    ("charade", "GO followed by AT, plus nothing else, then done."),
    ("reversal", "DOG reversed, read back, going up inside CAT"),
    ("unmatched", "A lovely surface reading with nothing to report."),
];

fn warm_up() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        // Compile the lazy regexes once so the benches measure steady state.
        let _ = assemble(&["An anagram of LATE."], AuthorStyle::Generic, &[]);
        let _ = detect_author("", "posted at noon by petero");
    });
}

fn bench_classify(c: &mut Criterion) {
    warm_up();
    for &(label, text) in EXPLANATIONS {
        c.bench_with_input(BenchmarkId::new("classify", label), &text, |b, &text| {
            b.iter(|| black_box(classify(text)));
        });
    }
}

fn bench_assemble(c: &mut Criterion) {
    warm_up();
    let definitions = vec!["old".to_string()];
    for &(label, text) in EXPLANATIONS {
        c.bench_with_input(BenchmarkId::new("assemble", label), &text, |b, &text| {
            b.iter(|| black_box(assemble(&[text], AuthorStyle::PeterO, &definitions)));
        });
    }
}

fn bench_batch(c: &mut Criterion) {
    warm_up();
    let generator = HintGenerator::deterministic();
    let requests: Vec<HintRequest> = (0..64)
        .map(|i| {
            let (_, text) = EXPLANATIONS[i % EXPLANATIONS.len()];
            HintRequest::new([text]).with_definitions(["old"])
        })
        .collect();
    c.bench_function("generate_batch::deterministic_64", |b| {
        b.iter(|| black_box(generator.generate_batch(&requests)));
    });
}

criterion_group!(benches, bench_classify, bench_assemble, bench_batch);
criterion_main!(benches);
