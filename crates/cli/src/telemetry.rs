//! Tracing subscriber setup for the CLI binary. Honors the same environment
//! knobs as the config layer so `EXPENSEFLOW_LOG_LEVEL=debug expenseflow
//! smoke` behaves as expected without a config file.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

pub fn init() -> anyhow::Result<()> {
    let level = std::env::var("EXPENSEFLOW_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_new(&level)
        .with_context(|| format!("invalid EXPENSEFLOW_LOG_LEVEL `{level}`"))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    match std::env::var("EXPENSEFLOW_LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().try_init(),
        Ok("pretty") => builder.pretty().try_init(),
        _ => builder.compact().try_init(),
    }
    .map_err(|error| anyhow::anyhow!("could not install tracing subscriber: {error}"))
}
