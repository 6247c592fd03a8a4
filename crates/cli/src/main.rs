use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser};
use color_eyre::config::HookBuilder;
use s3deploy_core::{load_config, resolve_config, ConfigFile, ConfigSources};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod handlers;

/// Exit status when required settings are missing
const USAGE_EXIT_CODE: i32 = 2;

/// s3deploy - mirror a local directory into an S3 bucket
#[derive(Parser, Debug)]
#[command(name = "s3deploy")]
#[command(version)]
#[command(about = "Upload a directory to S3 and delete objects that no longer exist locally", long_about = None)]
struct Cli {
    /// S3 bucket to deploy to (required)
    #[arg(short, long, env = "BUCKET")]
    bucket: Option<String>,

    /// Directory to upload (required)
    #[arg(short, long, value_name = "DIRECTORY")]
    dir: Option<String>,

    /// AWS access key (required)
    #[arg(short = 'k', long = "aws_key", value_name = "KEY", env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    aws_key: Option<String>,

    /// AWS secret key (required)
    #[arg(short = 's', long = "aws_secret", value_name = "SECRET", env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    aws_secret: Option<String>,

    /// Region of the bucket (default: us-east-1)
    #[arg(short, long, env = "AWS_REGION")]
    region: Option<String>,

    /// Custom endpoint for S3-compatible services
    #[arg(short, long, value_name = "URL", env = "S3_ENDPOINT")]
    endpoint: Option<String>,

    /// Configuration file (default: ~/.config/s3deploy/config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn sources(&self) -> ConfigSources {
        ConfigSources {
            bucket: self.bucket.clone(),
            upload_dir: self.dir.clone(),
            access_key_id: self.aws_key.clone(),
            secret_access_key: self.aws_secret.clone(),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
        }
    }
}

/// The progress bar and log lines share stderr; only draw the bar when
/// logging stays at its quiet default.
fn show_progress(verbose: u8, rust_log_set: bool) -> bool {
    verbose == 0 && !rust_log_set
}

/// Set up the tracing subscriber on stderr.
///
/// `RUST_LOG` wins, then `-v`, then the config file level.
fn init_logging(verbose: u8, file: &ConfigFile) {
    let level = match verbose {
        0 => file
            .logging
            .as_ref()
            .map(|l| l.level.clone())
            .unwrap_or_else(|| "warn".to_string()),
        1 => "info".to_string(),
        _ => "debug".to_string(),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    if let Err(e) = HookBuilder::default().install() {
        eprintln!("Warning: Failed to install error handler: {}", e);
    }

    // .env must be loaded before clap reads env defaults
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let file = load_config(cli.config.as_deref())?;
    init_logging(cli.verbose, &file);

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => tracing::info!("No .env file, using process environment"),
        Err(e) => tracing::info!(error = %e, "Could not load .env, using process environment"),
    }

    let config = match resolve_config(cli.sources(), &file) {
        Ok(config) => config,
        Err(e) => {
            Cli::command().print_help()?;
            println!();
            eprintln!("{}", e);
            std::process::exit(USAGE_EXIT_CODE);
        }
    };

    let progress = show_progress(cli.verbose, std::env::var_os("RUST_LOG").is_some());
    handlers::handle_deploy(config, progress).await
}
