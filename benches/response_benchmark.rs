use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use bloom_api::client::{encode_query, search_params};
use bloom_api::prelude::*;
use bloom_api::response::{build_providers, parse_body};
use serde_json::{json, Value};

// Synthetic search page alternating individuals, organizations and untyped records
fn search_page(size: usize) -> Value {
    let records: Vec<Value> = (0..size)
        .map(|i| {
            let npi = 1_000_000_000u64 + i as u64;
            match i % 3 {
                0 => json!({
                    "npi": npi,
                    "type": "individual",
                    "first_name": "JANE",
                    "last_name": format!("DOE{}", i),
                    "credential": "MD",
                    "enumeration_date": "2007-07-08T00:00:00.000Z",
                    "practice_address": {"address_line": "1 MAIN ST", "city": "ALBANY", "state": "NY", "zip": "12207"},
                    "provider_details": [{"healthcare_taxonomy_code": "207Q00000X", "taxonomy_switch": "yes"}]
                }),
                1 => json!({
                    "npi": npi,
                    "type": "organization",
                    "name": format!("CLINIC {}", i),
                    "organization_official": {"first_name": "ANN", "last_name": "LEE", "title": "CEO"}
                }),
                _ => json!({"npi": npi}),
            }
        })
        .collect();
    json!({ "result": records })
}

fn benchmark_response_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("response_building");

    for size in [1usize, 20, 100] {
        let body = search_page(size).to_string();

        group.bench_with_input(BenchmarkId::new("parse_and_build", size), &body, |b, body| {
            b.iter(|| {
                let result = parse_body(black_box(body)).unwrap();
                let records = match result {
                    bloom_api::response::ResultField::Present(value) => build_providers(value).unwrap(),
                    _ => Vec::new(),
                };
                assert_eq!(records.len(), size);
            })
        });
    }

    group.finish();
}

fn benchmark_record_access(c: &mut Criterion) {
    let records = match search_page(100) {
        Value::Object(mut map) => build_providers(map.remove("result").unwrap_or(Value::Null)).unwrap(),
        _ => unreachable!(),
    };

    c.bench_function("display_names_100", |b| {
        b.iter(|| {
            records.iter()
                .map(|r| black_box(r.display_name()))
                .count()
        })
    });

    c.bench_function("primary_specialty_100", |b| {
        b.iter(|| {
            records.iter()
                .filter_map(|r| r.provider().primary_specialty())
                .count()
        })
    });
}

fn benchmark_query_encoding(c: &mut Criterion) {
    let criteria = Criteria::new()
        .equals("last_name", "SMITH & JONES")
        .equals("practice_address.state", "NY")
        .equals("provider_details.healthcare_taxonomy_code", "207Q00000X");

    c.bench_function("encode_search_query", |b| {
        b.iter(|| encode_query(&search_params(black_box(&criteria), 20, 0)))
    });
}

criterion_group!(
    benches,
    benchmark_response_building,
    benchmark_record_access,
    benchmark_query_encoding
);
criterion_main!(benches);
