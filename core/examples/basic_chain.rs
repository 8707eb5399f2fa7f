// baton_core/examples/basic_chain.rs

use baton::{
  async_trait, Args, ChainBuilder, ChainStep, Constructor, Context, EmptyResolver, Next, StepDescriptor, StepLogic,
  StepResult,
};
use tracing::info;

// 1. Define a step: it holds the next step and decides when to forward.
struct AppendWord {
  word: &'static str,
  next: Next,
}

#[async_trait]
impl StepLogic for AppendWord {
  async fn invoke_core(&self, ctx: &mut Context) -> StepResult {
    let message = ctx.items().try_get::<String>("Message").cloned().unwrap_or_default();
    let message = if message.is_empty() {
      self.word.to_string()
    } else {
      format!("{} {}", message, self.word)
    };
    info!(step = self.word, %message, "Appending word.");
    ctx.items_mut().insert("Message", message);

    self.next.invoke(ctx).await;

    info!(step = self.word, "Downstream returned.");
    Ok(())
  }

  fn name(&self) -> &str {
    self.word
  }
}

// 2. Describe how each step is built.
fn append_word(word: &'static str) -> StepDescriptor {
  StepDescriptor::new(word)
    .constructor(Constructor::logic(move |args: &Args| Ok(AppendWord { word, next: args.next()? })).with_next())
}

struct Sponge;
struct Bob;
struct SquarePants;

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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Chain Example ---");

  // 3. Declare the steps in execution order and build once.
  let mut builder = ChainBuilder::new(EmptyResolver);
  builder.add::<Sponge>()?.add::<Bob>()?.add::<SquarePants>()?;
  let chain = builder.build()?;

  // 4. Invoke per request with a fresh context.
  let mut ctx = Context::new();
  chain.invoke(&mut ctx).await;

  let message = ctx.items().get::<String>("Message")?;
  info!(%message, errors = ctx.errors().len(), "Chain finished.");
  assert_eq!(message, "Sponge Bob SquarePants");

  info!("--- Basic Chain Example Complete ---");
  Ok(())
}
