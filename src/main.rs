use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parley_gateway::{
    ApiServerBuilder, Config, Interpreter, LanguageCode, OpenAiProvider, SessionRelay,
    resolve_voice,
};

/// Parley - two-party speech-to-speech interpretation relay
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Port to listen on (overrides config file and PARLEY_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Path to a TOML config file (default: ~/.config/parley/config.toml)
    #[arg(short, long, env = "PARLEY_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// List supported languages and their synthesis voices
    Languages,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity; RUST_LOG wins when set
    let filter = match cli.verbose {
        0 => "info,parley_gateway=info",
        1 => "info,parley_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Languages => {
            for lang in LanguageCode::ALL {
                println!(
                    "{:<6} {:<26} {}",
                    lang.as_str(),
                    lang.display_name(),
                    resolve_voice(lang.as_str())
                );
            }
            Ok(())
        }
        Command::Serve => serve(cli.config, cli.port).await,
    }
}

async fn serve(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = Config::load(config_path.as_deref())?;
    if let Some(port) = port {
        config.api_server.port = port;
    }

    tracing::info!(
        port = config.api_server.port,
        provider_url = %config.provider.base_url,
        stt_model = %config.provider.stt_model,
        translation_model = %config.provider.translation_model,
        tts_model = %config.provider.tts_model,
        stage_timeout_secs = config.pipeline.stage_timeout.as_secs(),
        staging_dir = %config.pipeline.staging_dir.display(),
        max_pending = ?config.relay.max_pending,
        "starting parley"
    );

    let provider = Arc::new(OpenAiProvider::new(&config.provider)?);
    let relay = Arc::new(SessionRelay::with_config(config.relay));
    let interpreter = Arc::new(Interpreter::new(provider, relay, config.pipeline));

    ApiServerBuilder::new(interpreter, config.api_server.port)
        .max_upload_bytes(config.api_server.max_upload_bytes)
        .rate_limit(config.api_server.rate_limit_rpm)
        .build()
        .run()
        .await?;

    tracing::info!("parley stopped");
    Ok(())
}
