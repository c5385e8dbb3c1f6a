use std::net::SocketAddr;

use anyhow::Result;
use bookpost::application::{ServerConfig, serve};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(author, version, about = "Share books with AI-generated covers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve(ServeCommand),
}

#[derive(Debug, Args)]
struct ServeCommand {
    #[arg(
        long,
        env = "BOOKPOST_DATABASE_URL",
        default_value = "sqlite://bookpost.db"
    )]
    database_url: String,

    #[arg(long, env = "BOOKPOST_BIND_ADDRESS", default_value = "127.0.0.1:3000")]
    bind_address: SocketAddr,

    /// S3 bucket that holds cover images
    #[arg(long, env = "BOOKPOST_S3_BUCKET", default_value = "bookpost-covers")]
    s3_bucket: String,

    #[arg(long, env = "BOOKPOST_S3_REGION", default_value = "us-east-1")]
    s3_region: String,

    /// Public base URL for stored objects (e.g. a CDN domain); defaults to
    /// the standard S3 object URL
    #[arg(long, env = "BOOKPOST_PUBLIC_BASE_URL")]
    public_base_url: Option<String>,

    /// Default API key for the image-generation upstream; callers may
    /// supply their own per request
    #[arg(long, env = "BOOKPOST_OPENAI_API_KEY")]
    openai_api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before clap parses env vars)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(cmd) => {
            let config = ServerConfig {
                bind_address: cmd.bind_address,
                database_url: cmd.database_url,
                bucket: cmd.s3_bucket,
                region: cmd.s3_region,
                public_base_url: cmd.public_base_url,
                image_gen_api_key: cmd.openai_api_key.unwrap_or_default(),
            };
            serve(config).await
        }
    }
}

#[allow(clippy::expect_used)] // Startup: panicking is appropriate if logging cannot be initialized
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("RUST_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }
}
