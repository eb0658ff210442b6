use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn setup() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("todo_server=info,todo_core=info,tower_http=info"));
    let fmt_layer = fmt::layer().with_target(true).with_filter(env_filter);

    tracing_subscriber::registry().with(fmt_layer).try_init()?;

    Ok(())
}
