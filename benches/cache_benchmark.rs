use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{seq::SliceRandom, thread_rng, Rng};
use std::time::Duration;
use viagem_brasil::cache::{create_cache_key, TimedCache};
use viagem_brasil::fuzzy::{is_similar, similarity};

pub fn cache_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("timed_cache");

    // Mix of reads and writes over key spaces of different sizes
    for keys in [100usize, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(keys), keys, |b, &keys| {
            let cache: TimedCache<Vec<u8>> = TimedCache::new(Duration::from_secs(300));
            let names: Vec<String> = (0..keys)
                .map(|i| create_cache_key("cities", &[&format!("{i}")]))
                .collect();
            let data = vec![0u8; 256];

            b.iter(|| {
                let mut rng = thread_rng();
                for _ in 0..250 {
                    let key = names.choose(&mut rng).unwrap();
                    if rng.gen_bool(0.3) {
                        // 30% writes
                        cache.set(key.clone(), data.clone());
                    } else {
                        // 70% reads
                        black_box(cache.get(key));
                    }
                }
            });
        });
    }

    group.finish();
}

pub fn fuzzy_benchmark(c: &mut Criterion) {
    let cities = [
        "Rio de Janeiro",
        "São Paulo",
        "Florianópolis",
        "Foz do Iguaçu",
        "Armação dos Búzios",
        "Jijoca de Jericoacoara",
    ];

    c.bench_function("similarity_pairwise", |b| {
        b.iter(|| {
            for a in cities.iter() {
                for other in cities.iter() {
                    black_box(similarity(a, other));
                }
            }
        })
    });

    c.bench_function("is_similar_typo", |b| {
        b.iter(|| black_box(is_similar("Florianopolis", "Florianópolis")))
    });
}

criterion_group!(benches, cache_benchmark, fuzzy_benchmark);
criterion_main!(benches);
