// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use baton::{
  Args, ChainStep, Constructor, Context, Next, ScopedStep, Snapshot, StepDescriptor, StepError, StepLogic,
  StepResult,
};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing_subscriber::EnvFilter;

// --- Well-known test keys ---
pub const MESSAGE: &str = "Message";
pub const TRACE: &str = "Trace";

/// Appends `entry` to the `Vec<String>` stored under [`TRACE`].
pub fn trace(ctx: &mut Context, entry: impl Into<String>) {
  let items = ctx.items_mut();
  if !items.contains_key(TRACE) {
    items.insert(TRACE, Vec::<String>::new());
  }
  items
    .get_mut::<Vec<String>>(TRACE)
    .expect("trace item is a Vec<String>")
    .push(entry.into());
}

pub fn trace_of(ctx: &Context) -> Vec<String> {
  ctx.items().try_get::<Vec<String>>(TRACE).cloned().unwrap_or_default()
}

// --- Word-appending steps ---

/// Appends its word to [`MESSAGE`], delegates, and traces both sides of the call.
pub struct AppendWord {
  word: &'static str,
  next: Next,
}

#[async_trait]
impl StepLogic for AppendWord {
  async fn invoke_core(&self, ctx: &mut Context) -> StepResult {
    let message = ctx.items().get_or_default::<String>(MESSAGE)?;
    let message = if message.is_empty() {
      self.word.to_string()
    } else {
      format!("{} {}", message, self.word)
    };
    ctx.items_mut().insert(MESSAGE, message);

    trace(ctx, format!("enter {}", self.word));
    self.next.invoke(ctx).await;
    trace(ctx, format!("exit {}", self.word));
    Ok(())
  }

  fn name(&self) -> &str {
    self.word
  }
}

pub fn append_word(word: &'static str) -> StepDescriptor {
  StepDescriptor::new(word).constructor(
    Constructor::logic(move |args: &Args| {
      Ok(AppendWord {
        word,
        next: args.next()?,
      })
    })
    .with_next(),
  )
}

pub struct Sponge;
pub struct Bob;
pub struct SquarePants;

impl ChainStep for Sponge {
  fn descriptor() -> StepDescriptor {
    append_word("Sponge")
  }
}

impl ChainStep for Bob {
  fn descriptor() -> StepDescriptor {
    append_word("Bob")
  }
}

impl ChainStep for SquarePants {
  fn descriptor() -> StepDescriptor {
    append_word("SquarePants")
  }
}

// --- Faulting steps ---

/// Traces its entry and fails without delegating.
pub struct FailingStep {
  name: &'static str,
}

#[async_trait]
impl StepLogic for FailingStep {
  async fn invoke_core(&self, ctx: &mut Context) -> StepResult {
    trace(ctx, format!("enter {}", self.name));
    Err(anyhow::anyhow!("{} refused the request", self.name).into())
  }

  fn name(&self) -> &str {
    self.name
  }
}

pub fn failing(name: &'static str) -> StepDescriptor {
  StepDescriptor::new(name).constructor(
    // Chainable even though it never forwards.
    Constructor::logic(move |_args: &Args| Ok(FailingStep { name })).with_next(),
  )
}

/// Traces its entry and panics without delegating.
pub struct PanickingStep;

#[async_trait]
impl StepLogic for PanickingStep {
  async fn invoke_core(&self, ctx: &mut Context) -> StepResult {
    trace(ctx, "enter Panicking");
    panic!("panicking step reached");
  }

  fn name(&self) -> &str {
    "Panicking"
  }
}

pub fn panicking() -> StepDescriptor {
  StepDescriptor::new("Panicking")
    .constructor(Constructor::logic(|_args: &Args| Ok(PanickingStep)).with_next())
}

// --- Scoped steps ---

/// Installs `value` under `key` for the rest of the chain.
pub struct ScopedValue {
  pub key: &'static str,
  pub value: String,
  pub next: Next,
  pub fail_before_delegating: bool,
  pub panic_before_delegating: bool,
}

#[async_trait]
impl ScopedStep for ScopedValue {
  fn cached_names(&self) -> Vec<&str> {
    vec![self.key]
  }

  fn install(&self, ctx: &mut Context, _previous: &Snapshot) -> StepResult {
    ctx.items_mut().insert(self.key, self.value.clone());
    Ok(())
  }

  async fn invoke_scoped(&self, ctx: &mut Context) -> StepResult {
    if self.fail_before_delegating {
      return Err(StepError::validation("ScopedValue", "refusing to delegate"));
    }
    if self.panic_before_delegating {
      panic!("scoped logic panicked");
    }
    self.next.invoke(ctx).await;
    Ok(())
  }

  fn name(&self) -> &str {
    "ScopedValue"
  }
}

pub fn scoped_value(key: &'static str, value: &'static str) -> StepDescriptor {
  StepDescriptor::new(format!("Scoped[{}]", key)).constructor(
    Constructor::scoped(move |args: &Args| {
      Ok(ScopedValue {
        key,
        value: value.to_string(),
        next: args.next()?,
        fail_before_delegating: false,
        panic_before_delegating: false,
      })
    })
    .with_next(),
  )
}

/// Records what `key` held when this step ran, under `observed_key`.
pub fn observe(key: &'static str, observed_key: &'static str) -> StepDescriptor {
  StepDescriptor::from_fn(format!("Observe[{}]", key), move |ctx, next| {
    Box::pin(async move {
      let seen = ctx.items().try_get::<String>(key).cloned();
      ctx.items_mut().insert(observed_key, seen);
      next.invoke(ctx).await;
      Ok(())
    })
  })
}

// --- Disposal probe ---

/// Shared counter registered as a service; probes bump it when dropped.
#[derive(Debug, Default)]
pub struct DropCounter(pub AtomicUsize);

impl DropCounter {
  pub fn count(&self) -> usize {
    self.0.load(Ordering::SeqCst)
  }
}

pub struct DropProbe {
  next: Next,
  counter: Arc<DropCounter>,
}

impl Drop for DropProbe {
  fn drop(&mut self) {
    self.counter.0.fetch_add(1, Ordering::SeqCst);
  }
}

#[async_trait]
impl StepLogic for DropProbe {
  async fn invoke_core(&self, ctx: &mut Context) -> StepResult {
    self.next.invoke(ctx).await;
    Ok(())
  }
}

pub fn drop_probe() -> StepDescriptor {
  StepDescriptor::new("DropProbe").constructor(
    Constructor::logic(|args: &Args| {
      Ok(DropProbe {
        next: args.next()?,
        counter: args.service::<DropCounter>()?,
      })
    })
    .with_next()
    .with_service::<DropCounter>(),
  )
}

// --- Tracing ---
// RUST_LOG overrides the default `baton=debug`.
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("baton=debug"));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
