// baton_core/examples/scoped_services.rs

use baton::{
  async_trait, keys, Args, ChainBuilder, ChainConfig, Constructor, Context, Next, ScopedStep, ServiceRegistry, Snapshot,
  StepCatalog, StepDescriptor, StepLogic, StepResult,
};
use std::sync::Arc;
use tracing::info;

/// A shared dependency handed to steps through the registry.
#[derive(Debug)]
struct Tenant {
  name: String,
}

/// Swaps in a tenant-scoped output key for everything downstream.
struct TenantScope {
  tenant: Arc<Tenant>,
  next: Next,
}

#[async_trait]
impl ScopedStep for TenantScope {
  fn cached_names(&self) -> Vec<&str> {
    vec!["Tenant"]
  }

  fn install(&self, ctx: &mut Context, previous: &Snapshot) -> StepResult {
    info!(tenant = %self.tenant.name, replaced = previous.existed("Tenant"), "Installing tenant.");
    ctx.items_mut().insert("Tenant", self.tenant.name.clone());
    Ok(())
  }

  async fn invoke_scoped(&self, ctx: &mut Context) -> StepResult {
    self.next.invoke(ctx).await;
    Ok(())
  }

  fn name(&self) -> &str {
    "TenantScope"
  }
}

struct Respond {
  next: Next,
}

#[async_trait]
impl StepLogic for Respond {
  async fn invoke_core(&self, ctx: &mut Context) -> StepResult {
    let tenant = ctx.items().get::<String>("Tenant")?.clone();
    ctx.items_mut().insert(keys::STATUS_CODE, 200_u16);
    ctx.items_mut().insert(keys::OUTPUT_OBJECT, format!("hello from {}", tenant));
    self.next.invoke(ctx).await;
    Ok(())
  }

  fn name(&self) -> &str {
    "Respond"
  }
}

fn catalog() -> anyhow::Result<StepCatalog> {
  let mut catalog = StepCatalog::new();
  catalog
    .register(
      StepDescriptor::new("TenantScope").constructor(
        Constructor::scoped(|args: &Args| {
          Ok(TenantScope {
            tenant: args.service::<Tenant>()?,
            next: args.next()?,
          })
        })
        .with_next()
        .with_service::<Tenant>(),
      ),
    )?
    .register(
      StepDescriptor::new("Respond")
        .constructor(Constructor::logic(|args: &Args| Ok(Respond { next: args.next()? })).with_next()),
    )?;
  Ok(catalog)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Scoped Services Example ---");

  let registry = Arc::new(ServiceRegistry::new());
  registry.register(Tenant {
    name: "acme".to_string(),
  });

  let config = ChainConfig::from_toml_str(
    r#"
      name = "tenant-api"
      steps = ["TenantScope", "Respond"]
    "#,
  )?;

  let mut builder = ChainBuilder::new(registry).with_catalog(catalog()?);
  builder.add_config(&config)?;
  let chain = builder.build()?;
  info!(chain = %config.name, steps = ?chain.step_names(), "Chain built from config.");

  let mut ctx = Context::new();
  chain.invoke(&mut ctx).await;

  info!(
    status = ?ctx.items().try_get::<u16>(keys::STATUS_CODE),
    body = ?ctx.items().try_get::<String>(keys::OUTPUT_OBJECT),
    tenant_still_present = ctx.items().contains_key("Tenant"),
    "Chain finished."
  );

  info!("--- Scoped Services Example Complete ---");
  Ok(())
}
