use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use switchyard_events::{BusResult, Context, EventBus, System, SystemHandle, event};

struct Tick(u64);
struct Outer;
struct Inner;

event!(Tick => u64);
event!(Outer, Inner);

#[derive(Debug, Default)]
struct Accumulator {
    total: u64,
}

impl System for Accumulator {
    fn initialize(bus: &EventBus, this: &SystemHandle<Self>) -> BusResult<()> {
        bus.subscribe(this, |a: &mut Accumulator, t: &Tick, _: &Context<'_>| {
            a.total = a.total.wrapping_add(t.0);
            a.total
        })?;
        bus.subscribe(this, |a: &mut Accumulator, _: &Inner, _: &Context<'_>| {
            a.total = a.total.wrapping_add(1);
        })
    }
}

/// Republishes `Inner` from its `Outer` handler.
struct Forwarder;

impl System for Forwarder {
    fn initialize(bus: &EventBus, this: &SystemHandle<Self>) -> BusResult<()> {
        bus.subscribe(this, |_: &mut Forwarder, _: &Outer, ctx: &Context<'_>| {
            let _ = ctx.publish(Inner);
        })
    }
}

fn bus_with_subscribers(n: usize) -> EventBus {
    let bus = EventBus::new();
    for _ in 0..n {
        bus.add_system(Accumulator::default()).unwrap();
    }
    bus
}

fn bench_publish_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_fan_out");

    for subscribers in [0usize, 1, 8, 64] {
        let bus = bus_with_subscribers(subscribers);
        group.throughput(Throughput::Elements(subscribers.max(1) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            &subscribers,
            |b, _| {
                b.iter(|| bus.publish(black_box(Tick(1))).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_nested_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_publish");

    let bus = bus_with_subscribers(4);
    bus.add_system(Forwarder).unwrap();
    group.bench_function("outer_forwards_inner", |b| {
        b.iter(|| bus.publish(black_box(Outer)).unwrap());
    });

    group.finish();
}

fn bench_subscribe(c: &mut Criterion) {
    let mut group = c.benchmark_group("subscribe");

    // Re-subscribing an existing system only replaces its handler.
    let bus = EventBus::new();
    let system = bus.add_system(Accumulator::default()).unwrap();
    group.bench_function("replace_handler", |b| {
        b.iter(|| {
            bus.subscribe(&system, |a: &mut Accumulator, t: &Tick, _: &Context<'_>| {
                a.total ^ t.0
            })
            .unwrap()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_publish_fan_out,
    bench_nested_publish,
    bench_subscribe
);
criterion_main!(benches);
