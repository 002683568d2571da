use criterion::{criterion_group, criterion_main, Criterion};

fn fan_out(c: &mut Criterion) {
    use reactive_core::*;
    use std::{cell::Cell, rc::Rc};

    c.bench_function("fan_out", |b| {
        b.iter(|| {
            let state = reactive(&object! { "n": 0 });
            let total = Rc::new(Cell::new(0i64));
            let mut runners = Vec::new();
            for _ in 0..1000usize {
                let state = state.clone();
                let total = total.clone();
                runners.push(create_effect(move || {
                    let n =
                        state.get("n").and_then(|n| n.as_int()).unwrap_or(0);
                    total.set(total.get() + n);
                }));
            }
            state.set("n", 1).unwrap();
            assert_eq!(total.get(), 1000);
            for runner in &runners {
                stop(runner);
            }
        });
    });
}

fn many_keys(c: &mut Criterion) {
    use reactive_core::*;

    c.bench_function("many_keys", |b| {
        b.iter(|| {
            let state = reactive(&RawObject::new());
            let runner = create_effect({
                let state = state.clone();
                move || {
                    for i in 0..100usize {
                        let _ = state.get(format!("k{i}"));
                    }
                }
            });
            for i in 0..100usize {
                state.set(format!("k{i}"), i as i64).unwrap();
            }
            assert_eq!(state.target().len(), 100);
            stop(&runner);
        });
    });
}

criterion_group!(wide, fan_out, many_keys);
criterion_main!(wide);
