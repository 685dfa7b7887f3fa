use std::process::ExitCode;
use std::sync::Arc;

use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ara_event_transformer::config::Settings;
use ara_event_transformer::error::{AppError, Result};
use ara_event_transformer::manager::{EntryFilter, SetupOptions, TemplateManager};
use ara_event_transformer::metrics::encode_metrics;
use ara_event_transformer::source::create_content_source;
use ara_event_transformer::template::EngineRegistry;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    init_tracing();

    let outcome = run().await;

    if let Ok(metrics) = encode_metrics() {
        tracing::debug!(metrics = %metrics, "Final metrics");
    }

    match outcome {
        Ok(rendered) => {
            println!("{}", rendered);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Transformation failed");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run() -> Result<String> {
    // Load configuration
    let settings = Settings::new()?;
    tracing::info!("Configuration loaded");

    let registry = Arc::new(EngineRegistry::from_config(&settings.engines)?);
    let manager = TemplateManager::new(registry);

    let location = settings.source.location()?;
    let source = create_content_source(&location)?;

    let render = &settings.render;
    let options = SetupOptions {
        duplicate_keys: settings.setup.duplicate_keys,
        filter: settings.setup.only_requested.then(|| EntryFilter {
            template_type: render.template_type,
            source_type: render.source_type.clone(),
            client_type: render.client_type,
        }),
    };
    manager
        .setup(
            source.as_ref(),
            &location,
            &settings.source.manifest_path,
            &options,
        )
        .await?;

    let event: Value = serde_json::from_str(&render.data)?;
    tracing::debug!("Event data parsed");

    let rendered = match render.client_type {
        Some(client_type) => manager.card_renderer().construct_card_json(
            render.template_type,
            &render.source_type,
            client_type,
            &event,
        )?,
        None => manager.event_transformer().construct_event_json(
            render.template_type,
            &render.source_type,
            &event,
        )?,
    };
    tracing::debug!(rendered = %rendered, "Template rendered");

    // The payload is consumed as JSON downstream
    let payload: Value = serde_json::from_str(&rendered).map_err(|e| {
        AppError::Validation(format!("rendered template is not valid JSON: {}", e))
    })?;

    Ok(payload.to_string())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries the rendered payload only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
