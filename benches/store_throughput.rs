use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use kwirk_search::cache::hashtable::HashTableCache;
use kwirk_search::kernel::demo::DemoState;
use kwirk_search::node::NodeBfs;
use kwirk_search::node_index::NodeIndex;
use kwirk_search::step::Step;
use kwirk_search::store::NodeStore;
use kwirk_search::swap::RamSwap;

type Store = NodeStore<DemoState, NodeBfs<DemoState>, HashTableCache<NodeBfs<DemoState>, RamSwap<NodeBfs<DemoState>>>, RamSwap<NodeBfs<DemoState>>>;

fn insert_n_states(store: &Store, n: u32) {
    let step = Step::encode(0, 1, 1, 0).unwrap();
    for i in 0..n {
        let state = DemoState::new((i % 6) as u8, ((i / 6) % 6) as u8, u64::from(i), 5, 5);
        store.lookup_or_insert(state, NodeIndex::NIL, step, i).unwrap();
    }
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_insert_throughput");
    for &n in &[1_000u32, 10_000, 50_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let device: RamSwap<NodeBfs<DemoState>> = RamSwap::open(n + 1).unwrap();
                    NodeStore::new(device, (n as usize).min(4096), 1 + (n as usize) / 4, n + 1)
                },
                |store| insert_n_states(&store, n),
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
