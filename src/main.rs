use std::sync::Arc;
use clap::Parser;
use log::info;
use promptgate::config::{BackendKind, GatewayConfig, Mode, Overrides};
use promptgate::{server, Gateway};

/// Command line overrides; everything else comes from the environment
#[derive(Debug, Parser)]
#[command(name = "promptgate", version, about)]
struct Args
{   /// Host to bind
    #[arg(long)]
    host: Option<String>
  , /// Port to bind
    #[arg(long)]
    port: Option<u16>
  , /// conversational | single_turn
    #[arg(long)]
    mode: Option<Mode>
  , /// openai | local
    #[arg(long)]
    backend: Option<BackendKind>
  , /// Backend base URL
    #[arg(long)]
    base_url: Option<String>
  , /// Total backend calls per request
    #[arg(long)]
    max_attempts: Option<usize>
}

impl From<Args> for Overrides
{   fn from(args: Args) -> Self
    {   Overrides
        {   mode: args.mode
          , backend: args.backend
          , base_url: args.base_url
          , max_attempts: args.max_attempts
          , host: args.host
          , port: args.port
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>>
{   dotenvy::dotenv().ok();
    env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).init();

    let args = Args::parse();
    let config = GatewayConfig::from_env()?
      .with_overrides(Overrides::from(args));

    info!(
      "Starting promptgate ({:?}, {:?} backend at {})",
      config.mode,
      config.backend.kind,
      config.backend.base_url
    );
    let gateway = Arc::new(Gateway::from_config(config)?);
    server::serve(gateway).await?;
    Ok(())
}
