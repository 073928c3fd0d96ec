use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use event_runner::{
    DomainEvent, EntityTracker, EventBuffer, EventDispatcher, EventRaiser, HandlerRegistry,
    LogEntry, LogSink, Phase, handler_fn,
};

#[derive(Debug)]
enum CounterEvent {
    Incremented,
    Overflowed,
}

impl DomainEvent for CounterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CounterEvent::Incremented => "Incremented",
            CounterEvent::Overflowed => "Overflowed",
        }
    }
}

#[derive(Default)]
struct Counter {
    value: u64,
    events: EventBuffer<CounterEvent>,
}

impl EventRaiser<CounterEvent> for Counter {
    fn event_buffer(&self) -> &EventBuffer<CounterEvent> {
        &self.events
    }

    fn event_buffer_mut(&mut self) -> &mut EventBuffer<CounterEvent> {
        &mut self.events
    }
}

struct Counters(Vec<Counter>);

impl EntityTracker<CounterEvent> for Counters {
    fn visit_tracked(&mut self, visit: &mut dyn FnMut(&mut dyn EventRaiser<CounterEvent>)) {
        for counter in &mut self.0 {
            visit(counter);
        }
    }
}

struct DiscardLog;

impl LogSink for DiscardLog {
    fn record(&self, _entry: LogEntry) {}
}

fn create_dispatcher() -> EventDispatcher<CounterEvent, Counters> {
    let registry = HandlerRegistry::builder()
        .before_save(
            "Incremented",
            handler_fn("Incremented", |_e: &CounterEvent, c: &mut Counters| {
                // Even values cascade into a second generation.
                for counter in c.0.iter_mut().step_by(10) {
                    counter.value += 1;
                    if counter.value % 2 == 0 {
                        counter.raise_event(CounterEvent::Overflowed, Phase::Before);
                    }
                }
                Ok(())
            }),
        )
        .before_save(
            "Overflowed",
            handler_fn("Overflowed", |_e: &CounterEvent, _c: &mut Counters| Ok(())),
        )
        .build()
        .expect("registry has no duplicates");

    EventDispatcher::new(registry).with_log_sink(Arc::new(DiscardLog))
}

fn counters_with_events(count: usize) -> Counters {
    let mut counters: Vec<Counter> = (0..count).map(|_| Counter::default()).collect();
    for counter in &mut counters {
        counter.raise_event(CounterEvent::Incremented, Phase::Before);
    }
    Counters(counters)
}

fn bench_run_before_commit(c: &mut Criterion) {
    let dispatcher = create_dispatcher();
    let mut group = c.benchmark_group("run_before_commit");

    for count in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter_batched(
                || counters_with_events(count),
                |mut counters| dispatcher.run_before_commit(&mut counters),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_run_before_commit);
criterion_main!(benches);
