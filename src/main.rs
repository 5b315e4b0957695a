use std::net::SocketAddr;

use circuit_lib::config::Config;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "circuit")]
#[command(about = "Push/Pull/Legs workout tracker server")]
#[command(version)]
struct Args {
  /// Address to listen on (default: $CIRCUIT_BIND or 127.0.0.1:5000)
  #[arg(short, long)]
  bind: Option<SocketAddr>,

  /// SQLite connection string (default: $DATABASE_URL or the user data dir)
  #[arg(long)]
  database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();

  // Command line wins over the environment
  let mut config = Config::from_env()?;
  if let Some(bind) = args.bind {
    config.bind = bind;
  }
  if let Some(database_url) = args.database_url {
    config.database_url = database_url;
  }

  circuit_lib::run(config).await?;
  Ok(())
}
