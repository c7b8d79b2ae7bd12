use criterion::{black_box, criterion_group, criterion_main, Criterion};
use graph_attrs::attrs::{AttributeStore, Expr, ValueKind};

fn populated_store(entities: usize) -> AttributeStore {
    let mut store = AttributeStore::new();
    for i in 0..entities {
        let id = format!("n{}", i);
        store.set_attribute(&id, "A1", i as i32).unwrap();
        store.set_attribute(&id, "A2", 0.5).unwrap();
        store.set_list_attribute(&id, "Scores", [1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        store
            .set_formula_attribute(
                &id,
                "Total",
                Expr::attr("A1", ValueKind::Integer) + Expr::attr("A2", ValueKind::Float),
            )
            .unwrap();
        store
            .set_formula_attribute(&id, "Twice", Expr::attr("Total", ValueKind::Float) * Expr::literal(2))
            .unwrap();
    }
    store
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut store = populated_store(1_000);

    c.bench_function("scalar_set", |b| {
        b.iter(|| store.set_attribute(black_box("n500"), "A1", black_box(7)).unwrap())
    });
    c.bench_function("scalar_get", |b| {
        b.iter(|| store.get_integer_attribute(black_box("n500"), "A1").unwrap())
    });
    c.bench_function("list_get", |b| {
        b.iter(|| store.get_list_attribute(black_box("n500"), "Scores").unwrap())
    });
    c.bench_function("formula_chain", |b| {
        b.iter(|| store.get_float_attribute(black_box("n500"), "Twice").unwrap())
    });
    c.bench_function("recompute_entity", |b| b.iter(|| store.recompute(black_box("n500")).unwrap()));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
