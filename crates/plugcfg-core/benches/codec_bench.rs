//! Criterion benchmarks for the YAML codec.
//!
//! Measures decoding with the type-tag allow-list walk against documents of
//! growing size, plus block-style encoding, to keep the cost of the tag check
//! visible next to the cost of parsing itself.
//!
//! Run with:
//! ```bash
//! cargo bench --package plugcfg-core --bench codec_bench
//! ```

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use plugcfg_core::{DocumentCodec, TypeTagAllowList, YamlCodec};
use serde::{Deserialize, Serialize};

// ── Bench fixtures ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Reward {
    Nothing,
    Coins(u32),
    Item { name: String, amount: u16 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Quests {
    title: String,
    rewards: BTreeMap<String, Reward>,
}

const TARGET_TAG: &str = "codec_bench::Quests";

fn quests(entries: usize) -> Quests {
    let rewards = (0..entries)
        .map(|i| {
            let reward = match i % 3 {
                0 => Reward::Nothing,
                1 => Reward::Coins(i as u32),
                _ => Reward::Item {
                    name: format!("item-{i}"),
                    amount: (i % 64) as u16,
                },
            };
            (format!("quest-{i:05}"), reward)
        })
        .collect();
    Quests {
        title: "Daily quests".to_string(),
        rewards,
    }
}

fn allow_list() -> TypeTagAllowList {
    TypeTagAllowList::for_target(TARGET_TAG, ["Coins", "Item"])
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_with_allow_list");
    let allowed = allow_list();

    for entries in [10usize, 100, 1000] {
        let text = YamlCodec.encode(&quests(entries)).expect("encode fixture");
        group.bench_with_input(BenchmarkId::from_parameter(entries), &text, |b, text| {
            b.iter(|| {
                let decoded: Quests = YamlCodec
                    .decode(black_box(text), TARGET_TAG, &allowed)
                    .expect("decode");
                black_box(decoded)
            });
        });
    }
    group.finish();
}

fn bench_reject_disallowed(c: &mut Criterion) {
    // The offending tag sits at the very end, so the whole tree is walked.
    let mut text = YamlCodec.encode(&quests(1000)).expect("encode fixture");
    text.push_str("zz-extra: !std::process::Command rm\n");
    let allowed = allow_list();

    c.bench_function("reject_disallowed_tag_1000", |b| {
        b.iter(|| {
            let result: Result<Quests, _> =
                YamlCodec.decode(black_box(&text), TARGET_TAG, &allowed);
            black_box(result.is_err())
        });
    });
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_block_style");
    for entries in [10usize, 100, 1000] {
        let value = quests(entries);
        group.bench_with_input(BenchmarkId::from_parameter(entries), &value, |b, value| {
            b.iter(|| black_box(YamlCodec.encode(black_box(value)).expect("encode")));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode, bench_reject_disallowed, bench_encode);
criterion_main!(benches);
