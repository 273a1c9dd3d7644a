use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use prodsearch_core::{FieldFilter, NumericRange, SearchRequest};
use prodsearch_qdrant::collect_products;
use prodsearch_qdrant::filter::{qdrant_filter_to_payload, request_filter};
use prodsearch_qdrant::mapper::ScoredPoint;
use serde_json::{json, Value};

const HIT_COUNT: usize = 1_000;

fn synthetic_hits() -> Value {
    let hits = (0..HIT_COUNT)
        .map(|index| {
            json!({
                "id": index,
                "score": 1.0 - index as f64 / HIT_COUNT as f64,
                "payload": {
                    "client_id": "bench",
                    "name": format!("Product {index}"),
                    "description": "Synthetic catalogue entry",
                    "price": format!("{}.99", index % 50),
                    "image": format!("https://cdn.example.com/{index}.png"),
                    "link": format!("https://shop.example.com/{index}"),
                    "tags": ["synthetic", "bench"],
                    "variants": [{"id": index, "price": 1.5}],
                    "warehouse": "north"
                }
            })
        })
        .collect::<Vec<_>>();

    Value::Array(hits)
}

fn bench_hit_mapping(c: &mut Criterion) {
    let hits = synthetic_hits();
    let request = SearchRequest::new(vec![0.0; 1536])
        .with_client_id("bench")
        .with_filter("category", FieldFilter::AnyOf(vec![json!("snacks"), json!("drinks")]))
        .with_filter(
            "price",
            FieldFilter::Range(NumericRange {
                gte: Some(1.0),
                lte: Some(25.0),
                ..NumericRange::default()
            }),
        );

    let mut group = c.benchmark_group("qdrant_hit_mapping");

    group.bench_function("decode_and_map_hits", |b| {
        b.iter(|| {
            let points: Vec<ScoredPoint> =
                serde_json::from_value(black_box(hits.clone())).unwrap_or_default();
            black_box(collect_products(points, HIT_COUNT))
        })
    });

    group.bench_function("render_request_filter", |b| {
        b.iter(|| {
            let filter = request_filter(black_box(&request)).ok().flatten();
            black_box(filter.map(|filter| qdrant_filter_to_payload(&filter)))
        })
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(10)
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(2));
    targets = bench_hit_mapping
}
criterion_main!(benches);
