use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer as _};

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig as _;

use gr_domain::config::ObservabilityConfig;
use gr_gateway::bootstrap::DEFAULT_LOG_FILTER;
use gr_gateway::cli::{Cli, Command, ConfigCommand};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, config_path) = gr_gateway::cli::load_config()?;

    match cli.command {
        Command::Doctor => {
            let passed = gr_gateway::cli::doctor::run(&config, &config_path)?;
            if !passed {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Validate) => {
            let valid = gr_gateway::cli::config::validate(&config, &config_path);
            if !valid {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => gr_gateway::cli::config::show(&config),
        command => {
            let tracer_provider = init_tracing(&config.observability);
            let result = run_request(&config, cli.ephemeral, command).await;

            // Flush and shut down the OTel tracer provider so pending spans
            // are exported before the process exits.
            if let Some(provider) = tracer_provider {
                if let Err(e) = provider.shutdown() {
                    tracing::warn!(error = ?e, "OpenTelemetry tracer provider shutdown failed");
                }
            }
            result
        }
    }
}

async fn run_request(
    config: &gr_domain::config::Config,
    ephemeral: bool,
    command: Command,
) -> anyhow::Result<()> {
    use gr_gateway::cli::run;

    match command {
        Command::Ai {
            prompt,
            search,
            scope,
            json,
        } => run::ai(config, ephemeral, scope.scope()?, &prompt, search, json).await,
        Command::AiUpload {
            image,
            text,
            search,
            mime,
        } => run::ai_upload(config, &image, text.as_deref(), search, mime.as_deref()).await,
        Command::GenerateImage { prompt, out } => run::generate_image(config, &prompt, &out).await,
        Command::ResetAi { scope } => run::reset_ai(config, ephemeral, scope.scope()?).await,
        // Handled before tracing is installed.
        Command::Doctor | Command::Config(_) => Ok(()),
    }
}

/// Initialize tracing for request commands.
///
/// Logs go to stderr so replies on stdout stay clean: JSON lines when
/// `json_logs` is set, compact text otherwise. When `otlp_endpoint` is
/// configured, an OpenTelemetry layer is added so that every `tracing`
/// span is also exported via OTLP/gRPC. The returned
/// [`SdkTracerProvider`] handle must be shut down on exit to flush
/// pending spans.
///
/// [`SdkTracerProvider`]: opentelemetry_sdk::trace::SdkTracerProvider
fn init_tracing(obs: &ObservabilityConfig) -> Option<opentelemetry_sdk::trace::SdkTracerProvider> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let fmt_layer = if obs.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .boxed()
    };

    let Some(endpoint) = &obs.otlp_endpoint else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
        return None;
    };

    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
    {
        Ok(e) => e,
        Err(e) => {
            eprintln!(
                "WARNING: failed to create OTLP exporter for {endpoint}: {e}; \
                 continuing without OpenTelemetry"
            );
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .init();
            return None;
        }
    };

    let resource = opentelemetry_sdk::Resource::builder()
        .with_service_name(obs.service_name.clone())
        .build();

    let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(opentelemetry_sdk::trace::Sampler::TraceIdRatioBased(
            obs.sample_rate,
        ))
        .with_resource(resource)
        .build();

    let otel_layer =
        tracing_opentelemetry::layer().with_tracer(tracer_provider.tracer("gemrelay"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    Some(tracer_provider)
}
