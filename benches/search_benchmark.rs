use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::Rng;
use searchine::core::config::{EngineOptions, IndexKind, IndexerOptions, RankOptions};
use searchine::core::types::{DocumentData, SearchRequest, TokenData};
use searchine::engine::engine::Engine;
use searchine::scoring::criteria::RankByBm25;
use std::sync::Arc;

const VOCABULARY: &[&str] = &[
    "中国", "人口", "十三亿", "搜索", "引擎", "索引", "分词", "排序", "查询", "文档",
    "数据", "分布", "统计", "评分", "位置", "标签",
];

/// A pre-tokenized document of `num_tokens` vocabulary words.
fn random_document(rng: &mut impl Rng, num_tokens: usize) -> DocumentData {
    let mut tokens: Vec<TokenData> = Vec::new();
    let mut offset = 0;
    for _ in 0..num_tokens {
        let word = VOCABULARY[rng.gen_range(0..VOCABULARY.len())];
        match tokens.iter_mut().find(|t| t.text == word) {
            Some(token) => token.locations.push(offset),
            None => tokens.push(TokenData {
                text: word.to_string(),
                locations: vec![offset],
            }),
        }
        offset += word.len() + 1;
    }
    DocumentData { tokens, ..Default::default() }
}

fn bench_options() -> EngineOptions {
    EngineOptions {
        not_using_segmenter: true,
        indexer_options: IndexerOptions {
            index_kind: IndexKind::Locations,
            ..Default::default()
        },
        default_rank_options: RankOptions {
            scoring_criteria: Some(Arc::new(RankByBm25)),
            max_outputs: 10,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn bench_indexing(c: &mut Criterion) {
    let engine = Engine::new(bench_options());
    let mut rng = rand::thread_rng();
    let mut doc_id = 1u64;

    c.bench_function("index_document", |b| {
        b.iter(|| {
            engine.index_document(doc_id, random_document(&mut rng, 64), false);
            doc_id += 1;
        });
    });
    engine.flush_index();
    engine.shutdown();
}

fn bench_search(c: &mut Criterion) {
    let engine = Engine::new(bench_options());
    let mut rng = rand::thread_rng();
    for doc_id in 1..=10_000u64 {
        engine.index_document(doc_id, random_document(&mut rng, 64), false);
    }
    engine.flush_index();

    c.bench_function("search_two_tokens", |b| {
        b.iter(|| {
            let response = engine.search(SearchRequest {
                tokens: vec!["中国".to_string(), "人口".to_string()],
                ..Default::default()
            });
            black_box(response.num_docs);
        });
    });
    engine.shutdown();
}

criterion_group!(benches, bench_indexing, bench_search);
criterion_main!(benches);
