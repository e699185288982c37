use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use color_eyre::config::HookBuilder;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod handlers;
mod prompts;
mod reporter;

/// sitepilot - deploy a static site to S3 and CloudFront
#[derive(Parser, Debug)]
#[command(name = "sitepilot")]
#[command(version)]
#[command(about = "Deploy a static site folder to S3, optionally behind a private CloudFront distribution", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.config/sitepilot/config.toml)
    #[arg(long, global = true, env = "SITEPILOT_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Sub-command to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Upload the site to an existing bucket and invalidate the CDN cache
    Redeploy {
        /// Local site folder
        #[arg(long)]
        site_dir: Option<PathBuf>,
        /// Target bucket (prompted when omitted)
        #[arg(short, long)]
        bucket: Option<String>,
        /// CloudFront distribution to invalidate (prompted when omitted, empty skips)
        #[arg(short, long)]
        distribution_id: Option<String>,
    },

    /// First-time hosting: private bucket behind a new CloudFront distribution
    Host {
        /// Local site folder
        #[arg(long)]
        site_dir: Option<PathBuf>,
        /// Bucket to use or create (prompted when omitted)
        #[arg(short, long)]
        bucket: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Create a new, empty bucket
    CreateBucket {
        /// Name of the new bucket (prompted when omitted)
        #[arg(short, long)]
        bucket: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Shell completion
    Completion {
        /// Shell type
        shell: Shell,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Setup error handling
    if let Err(e) = HookBuilder::default().install() {
        eprintln!("Warning: Failed to install error handler: {}", e);
    }

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_failure(&e),
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Completion { shell } = cli.command {
        return handlers::handle_completion(shell, &mut Cli::command());
    }

    let config = handlers::load_settings(cli.config.as_deref())?;
    init_tracing(cli.verbose, config.log_level());

    match cli.command {
        Commands::Redeploy {
            site_dir,
            bucket,
            distribution_id,
        } => handlers::handle_redeploy(&config, site_dir, bucket, distribution_id).await,
        Commands::Host {
            site_dir,
            bucket,
            yes,
        } => handlers::handle_host(&config, site_dir, bucket, yes).await,
        Commands::CreateBucket { bucket } => handlers::handle_create_bucket(&config, bucket).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => handlers::handle_config_show(&config, cli.config.as_deref()),
        },
        Commands::Completion { .. } => Ok(()),
    }
}

/// `-v` forces debug, otherwise `RUST_LOG`, otherwise the configured level
fn init_tracing(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Name the failed step and pick the exit code
fn report_failure(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<sitepilot_core::Error>() {
        Some(core) => {
            eprintln!(
                "{} {} failed: {}",
                console::style("ERROR:").red().bold(),
                core.step(),
                core
            );
            ExitCode::from(core.exit_code())
        }
        None => {
            eprintln!("{} {:#}", console::style("ERROR:").red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
