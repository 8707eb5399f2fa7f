// baton_core/examples/error_handling.rs

use baton::{
  async_trait, Args, ChainBuilder, Constructor, Context, EmptyResolver, Next, StepDescriptor, StepError, StepLogic,
  StepResult,
};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
enum PaymentError {
  #[error("card declined: {0}")]
  Declined(String),
}

struct Log {
  next: Next,
}

#[async_trait]
impl StepLogic for Log {
  async fn invoke_core(&self, ctx: &mut Context) -> StepResult {
    info!("Request entering chain.");
    self.next.invoke(ctx).await;
    // Still runs when a downstream step fails: the failure was contained there.
    info!(faults = ctx.errors().len(), "Request leaving chain.");
    Ok(())
  }

  fn name(&self) -> &str {
    "Log"
  }
}

struct Charge {
  next: Next,
}

#[async_trait]
impl StepLogic for Charge {
  async fn invoke_core(&self, ctx: &mut Context) -> StepResult {
    let card = ctx.items().get::<String>("Card")?;
    if card.starts_with("0000") {
      return Err(anyhow::Error::new(PaymentError::Declined(card.clone())).into());
    }
    ctx.items_mut().insert("Charged", true);
    self.next.invoke(ctx).await;
    Ok(())
  }

  fn name(&self) -> &str {
    "Charge"
  }
}

struct Ship;

#[async_trait]
impl StepLogic for Ship {
  async fn invoke_core(&self, ctx: &mut Context) -> StepResult {
    info!("Shipping order.");
    ctx.items_mut().insert("Shipped", true);
    Ok(())
  }

  fn name(&self) -> &str {
    "Ship"
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

  info!("--- Error Handling Example ---");

  let mut builder = ChainBuilder::new(EmptyResolver);
  builder
    .add_descriptor(
      StepDescriptor::new("Log")
        .constructor(Constructor::logic(|args: &Args| Ok(Log { next: args.next()? })).with_next()),
    )?
    .add_descriptor(
      StepDescriptor::new("Charge")
        .constructor(Constructor::logic(|args: &Args| Ok(Charge { next: args.next()? })).with_next()),
    )?
    .add_descriptor(StepDescriptor::new("Ship").constructor(Constructor::logic(|_args: &Args| Ok(Ship)).with_next()))?;
  let chain = builder.build()?;

  for card in ["4242-4242", "0000-0000"] {
    let mut ctx = Context::new();
    ctx.items_mut().insert("Card", card.to_string());
    chain.invoke(&mut ctx).await;

    if ctx.is_success() {
      info!(card, "Order completed.");
      continue;
    }
    for fault in ctx.errors() {
      warn!(card, step = %fault.step, error = %fault.error, "Order failed.");
      if let StepError::Failed(source) = &fault.error {
        if let Some(PaymentError::Declined(card)) = source.downcast_ref::<PaymentError>() {
          info!(%card, "Customer should be asked for another card.");
        }
      }
    }
    info!(halted_at = ?ctx.halted_at(), shipped = ctx.items().contains_key("Shipped"), "Downstream was skipped.");
  }

  info!("--- Error Handling Example Complete ---");
  Ok(())
}
