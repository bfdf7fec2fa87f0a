use criterion::{criterion_group, criterion_main, Criterion};
use docsearch_core::{SearchConfig, Tokenizer};

fn bench_tokenize(c: &mut Criterion) {
    let text = "Effects of Feed and Practices (dollars) for poultry: realised production, \
                morbidity and mortality, condemns, ideal production in tonnes -swine";
    let plain = Tokenizer::default();
    let sphinx = Tokenizer::new(SearchConfig::sphinx().tokenizer);
    c.bench_function("tokenize_query", |b| b.iter(|| plain.tokenize(text).count()));
    c.bench_function("parse_query_stemmed", |b| b.iter(|| sphinx.parse(text)));
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
