use std::sync::Arc;

use anyhow::Context;

use matcon_infra::{LogFormat, Settings};
use matcon_observability::LogOutput;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;

    let output = match settings.logging.format {
        LogFormat::Json => LogOutput::Json,
        LogFormat::Pretty => LogOutput::Pretty,
    };
    matcon_observability::init(&settings.logging.filter, output);

    if settings.auth.jwt_secret == "change-me" {
        tracing::warn!("MATCON__AUTH__JWT_SECRET not set; using insecure dev default");
    }

    let services = Arc::new(matcon_api::app::AppServices::in_memory(
        settings.consumption.sequences(),
    ));
    services.log_events();

    let app = matcon_api::app::build_app(settings.auth.jwt_secret.clone(), services);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        environment = %settings.environment,
        "listening on {}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;
    Ok(())
}
