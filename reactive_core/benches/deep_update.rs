use criterion::{criterion_group, criterion_main, Criterion};

fn deep_update(c: &mut Criterion) {
    use reactive_core::*;

    c.bench_function("deep_update", |b| {
        b.iter(|| {
            let root = reactive(&object! { "n": 0 });
            let mut layers = vec![root.clone()];
            let mut runners = Vec::new();
            for i in 1..=100usize {
                let prev = layers[i - 1].clone();
                let next = reactive(&object! { "n": 0 });
                layers.push(next.clone());
                runners.push(create_effect(move || {
                    let n =
                        prev.get("n").and_then(|n| n.as_int()).unwrap_or(0);
                    next.set("n", n + 1).unwrap();
                }));
            }
            root.set("n", 1).unwrap();
            assert_eq!(layers[100].get("n"), Some(Value::Int(101)));
            for runner in &runners {
                stop(runner);
            }
        });
    });
}

criterion_group!(deep, deep_update);
criterion_main!(deep);
