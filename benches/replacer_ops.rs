use arc_replacer::ArcReplacer;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

const POOL_FRAMES: usize = 1024;

fn bench_record_access(c: &mut Criterion) {
  let mut group = c.benchmark_group("record_access");
  group.throughput(Throughput::Elements(1));

  group.bench_function("live_hit", |b| {
    let replacer = ArcReplacer::new(POOL_FRAMES);
    for frame in 0..POOL_FRAMES {
      replacer.record_access(frame, frame as u64);
    }
    let mut next = 0usize;
    b.iter(|| {
      let frame = next % POOL_FRAMES;
      replacer.record_access(black_box(frame), black_box(frame as u64));
      next += 1;
    });
  });

  group.bench_function("fill_and_remove", |b| {
    let replacer = ArcReplacer::new(POOL_FRAMES);
    let mut next_page = 0u64;
    b.iter(|| {
      // Fresh page each round, so this always exercises the miss path;
      // the removal keeps the frame free for the next round.
      replacer.record_access(black_box(0), black_box(next_page));
      next_page += 1;
      replacer.set_evictable(0, true).unwrap();
      replacer.remove(0).unwrap();
    });
  });

  group.finish();
}

fn bench_evict_readmit(c: &mut Criterion) {
  let mut group = c.benchmark_group("evict");
  group.throughput(Throughput::Elements(1));

  group.bench_function("evict_readmit", |b| {
    let replacer = ArcReplacer::new(POOL_FRAMES);
    for frame in 0..POOL_FRAMES {
      replacer.record_access(frame, frame as u64);
      replacer.set_evictable(frame, true).unwrap();
    }
    b.iter(|| {
      // Evict a frame and immediately re-admit its page; the re-admission
      // is a ghost hit, so the entry comes back evictable on its own.
      if let Some(frame) = replacer.evict() {
        replacer.record_access(black_box(frame), black_box(frame as u64));
      }
    });
  });

  group.finish();
}

criterion_group!(benches, bench_record_access, bench_evict_readmit);
criterion_main!(benches);
