use async_trait::async_trait;
use baton::{
  Args, ChainBuilder, Constructor, Context, EmptyResolver, Next, ScopedStep, Snapshot, StepDescriptor, StepLogic,
  StepResult,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime; // To run async code within Criterion

// --- Helper: a step that does a little CPU work and forwards ---
struct Increment {
  next: Next,
  iterations: u64,
}

#[async_trait]
impl StepLogic for Increment {
  async fn invoke_core(&self, ctx: &mut Context) -> StepResult {
    let counter = ctx.items_mut().get_mut::<u64>("Counter")?;
    for _ in 0..self.iterations {
      *counter = counter.wrapping_add(1);
    }
    self.next.invoke(ctx).await;
    Ok(())
  }

  fn name(&self) -> &str {
    "Increment"
  }
}

fn increment(iterations: u64) -> StepDescriptor {
  StepDescriptor::new("Increment").constructor(
    Constructor::logic(move |args: &Args| {
      Ok(Increment {
        next: args.next()?,
        iterations,
      })
    })
    .with_next(),
  )
}

// --- Helper: a step that fails without forwarding ---
struct Refuse;

#[async_trait]
impl StepLogic for Refuse {
  async fn invoke_core(&self, _ctx: &mut Context) -> StepResult {
    Err(anyhow::anyhow!("refused").into())
  }
}

fn refuse() -> StepDescriptor {
  StepDescriptor::new("Refuse").constructor(Constructor::logic(|_args: &Args| Ok(Refuse)).with_next())
}

// --- Helper: a scoped step that swaps the counter for the downstream call ---
struct ScopedCounter {
  next: Next,
}

#[async_trait]
impl ScopedStep for ScopedCounter {
  fn cached_names(&self) -> Vec<&str> {
    vec!["Counter"]
  }

  fn install(&self, ctx: &mut Context, _previous: &Snapshot) -> StepResult {
    ctx.items_mut().insert("Counter", 0_u64);
    Ok(())
  }

  async fn invoke_scoped(&self, ctx: &mut Context) -> StepResult {
    self.next.invoke(ctx).await;
    Ok(())
  }
}

fn scoped_counter() -> StepDescriptor {
  StepDescriptor::new("ScopedCounter")
    .constructor(Constructor::scoped(|args: &Args| Ok(ScopedCounter { next: args.next()? })).with_next())
}

fn fresh_context() -> Context {
  let mut ctx = Context::new();
  ctx.items_mut().insert("Counter", 0_u64);
  ctx
}

// --- Benchmark Functions ---

fn bench_chain_length(c: &mut Criterion) {
  let rt = Runtime::new().unwrap();
  let mut group = c.benchmark_group("ChainLength");

  for num_steps in [1_usize, 5, 10, 25].iter() {
    let mut builder = ChainBuilder::new(EmptyResolver);
    for _ in 0..*num_steps {
      builder.add_descriptor(increment(10)).unwrap();
    }
    let chain = builder.build().unwrap();

    group.throughput(Throughput::Elements(*num_steps as u64));
    group.bench_with_input(BenchmarkId::from_parameter(num_steps), num_steps, |b, _| {
      b.to_async(&rt).iter(|| async {
        let mut ctx = fresh_context();
        chain.invoke(&mut ctx).await;
        ctx
      });
    });
  }
  group.finish();
}

fn bench_fault_containment(c: &mut Criterion) {
  let rt = Runtime::new().unwrap();
  let mut group = c.benchmark_group("FaultContainment");

  for depth in [1_usize, 10].iter() {
    let mut builder = ChainBuilder::new(EmptyResolver);
    for _ in 0..*depth {
      builder.add_descriptor(increment(1)).unwrap();
    }
    builder.add_descriptor(refuse()).unwrap();
    let chain = builder.build().unwrap();

    group.bench_with_input(BenchmarkId::new("FaultAtDepth", depth), depth, |b, _| {
      b.to_async(&rt).iter(|| async {
        let mut ctx = fresh_context();
        chain.invoke(&mut ctx).await;
        ctx
      });
    });
  }
  group.finish();
}

fn bench_scoped_values(c: &mut Criterion) {
  let rt = Runtime::new().unwrap();
  let mut group = c.benchmark_group("ScopedValues");

  for num_scopes in [1_usize, 5].iter() {
    let mut builder = ChainBuilder::new(EmptyResolver);
    for _ in 0..*num_scopes {
      builder.add_descriptor(scoped_counter()).unwrap();
      builder.add_descriptor(increment(1)).unwrap();
    }
    let chain = builder.build().unwrap();

    group.bench_with_input(BenchmarkId::from_parameter(num_scopes), num_scopes, |b, _| {
      b.to_async(&rt).iter(|| async {
        let mut ctx = fresh_context();
        chain.invoke(&mut ctx).await;
        ctx
      });
    });
  }
  group.finish();
}

fn bench_build(c: &mut Criterion) {
  let mut builder = ChainBuilder::new(EmptyResolver);
  for _ in 0..10 {
    builder.add_descriptor(increment(1)).unwrap();
  }

  c.bench_function("Build10Steps", |b| b.iter(|| builder.build().unwrap()));
}

criterion_group!(
  benches,
  bench_chain_length,
  bench_fault_containment,
  bench_scoped_values,
  bench_build
);
criterion_main!(benches);
