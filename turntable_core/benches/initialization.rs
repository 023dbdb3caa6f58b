use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use turntable_core::geometry::{SlotIndex, Station, target_qei};
use turntable_core::{Command, Inventory, Scheduler, TurntableBuilder};

fn scheduler(fill_ratio: f64) -> Scheduler {
    let engine = TurntableBuilder::new()
        .with_inventory(Inventory::random(Some(7), fill_ratio))
        .build()
        .unwrap();
    Scheduler::new(engine)
}

fn bench_full_initialization(c: &mut Criterion) {
    let mut g = c.benchmark_group("initialization");
    for (name, fill) in [("empty", 0.0), ("full", 1.0)] {
        g.bench_function(name, |b| {
            b.iter_batched(
                || scheduler(fill),
                |mut s| {
                    s.apply(Command::StartInitialization);
                    let spent = s.run_until(|t| t.is_initialized(), 60_000).unwrap();
                    black_box(spent)
                },
                BatchSize::SmallInput,
            );
        });
    }
    g.finish();
}

fn bench_target_table(c: &mut Criterion) {
    c.bench_function("target_qei_all", |b| {
        b.iter(|| {
            let mut acc = 0u32;
            for slot in SlotIndex::all() {
                for station in Station::ALL {
                    acc += u32::from(target_qei(black_box(slot), station, 4096));
                }
            }
            acc
        });
    });
}

criterion_group!(benches, bench_full_initialization, bench_target_table);
criterion_main!(benches);
