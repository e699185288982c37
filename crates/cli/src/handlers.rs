//! Command handlers for sitepilot CLI

use crate::prompts::{
    confirm_hosting, prompt_distribution_id, prompt_existing_bucket, prompt_new_bucket,
};
use crate::reporter::ConsoleReporter;
use anyhow::Result;
use aws_config::{BehaviorVersion, SdkConfig};
use clap::Command;
use clap_complete::{generate, Shell};
use sitepilot_core::{
    create_new_bucket, get_config_path, load_config, load_config_from, validate_bucket_name,
    validate_config, CloudFrontCdn, ContentRoot, DeployConfig, DeployMode, DeployReport,
    Deployer, InvalidationOutcome, S3Store, SystemClock,
};
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// Load and validate the configuration, from `path` when given
pub fn load_settings(path: Option<&Path>) -> Result<DeployConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    validate_config(&config)?;
    Ok(config)
}

/// S3 and CloudFront clients from the default credential chain
struct AwsClients {
    store: S3Store,
    cdn: CloudFrontCdn,
}

impl AwsClients {
    async fn load(config: &DeployConfig) -> Self {
        let sdk_config: SdkConfig = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self {
            store: S3Store::new(&sdk_config, config),
            cdn: CloudFrontCdn::new(&sdk_config, &config.aws.cdn_region),
        }
    }
}

fn content_root(config: &DeployConfig, site_dir: Option<PathBuf>) -> ContentRoot {
    ContentRoot::new(
        site_dir.unwrap_or_else(|| config.site.dir.clone()),
        config.site.entry_document.clone(),
    )
}

fn verbose_output() -> bool {
    tracing::enabled!(tracing::Level::DEBUG)
}

/// Handle redeploy command
pub async fn handle_redeploy(
    config: &DeployConfig,
    site_dir: Option<PathBuf>,
    bucket: Option<String>,
    distribution_id: Option<String>,
) -> Result<()> {
    let root = content_root(config, site_dir);

    // Nothing is asked nor sent before the local tree checks out
    root.preflight()?;

    let bucket = match bucket {
        Some(bucket) => bucket,
        None => prompt_existing_bucket()?,
    };
    let distribution_id = match distribution_id {
        Some(id) => Some(id),
        None => prompt_distribution_id()?,
    };

    println!("Redeploying {} to s3://{}...", root.root().display(), bucket);
    println!();

    let clients = AwsClients::load(config).await;
    let reporter = ConsoleReporter::new(verbose_output());
    let report = Deployer::new(&clients.store, &clients.cdn, &SystemClock, config)
        .with_reporter(&reporter)
        .run(&root, &bucket, &DeployMode::Redeploy { distribution_id })
        .await?;

    println!();
    println!("✅ Redeploy complete");
    print_summary(&report);

    Ok(())
}

/// Handle host command
pub async fn handle_host(
    config: &DeployConfig,
    site_dir: Option<PathBuf>,
    bucket: Option<String>,
    yes: bool,
) -> Result<()> {
    let root = content_root(config, site_dir);
    root.preflight()?;

    let bucket = match bucket {
        Some(bucket) => bucket,
        None => prompt_new_bucket()?,
    };

    if !yes && !confirm_hosting(&bucket, &config.aws.region)? {
        println!("❌ Hosting cancelled");
        return Ok(());
    }

    println!("Hosting {} from s3://{}...", root.root().display(), bucket);
    println!();

    let clients = AwsClients::load(config).await;
    let reporter = ConsoleReporter::new(verbose_output());
    let report = Deployer::new(&clients.store, &clients.cdn, &SystemClock, config)
        .with_reporter(&reporter)
        .run(&root, &bucket, &DeployMode::Provision)
        .await?;

    println!();
    println!("🎉 Site is live (CloudFront may need a few minutes to deploy)");
    print_summary(&report);

    if let Some(url) = report.site_url() {
        println!();
        println!("  {}", console::style(url).green().bold());
    }

    Ok(())
}

/// Handle create-bucket command
pub async fn handle_create_bucket(config: &DeployConfig, bucket: Option<String>) -> Result<()> {
    let bucket = match bucket {
        Some(bucket) => bucket,
        None => prompt_new_bucket()?,
    };
    validate_bucket_name(&bucket)?;

    println!("Creating bucket '{}' in {}...", bucket, config.aws.region);

    let clients = AwsClients::load(config).await;
    let target = create_new_bucket(&clients.store, &bucket, &config.aws.region).await?;

    println!("  ✅ Bucket created: {}", target.name);
    println!("  Region: {}", target.region);

    Ok(())
}

/// Handle config show command
pub fn handle_config_show(config: &DeployConfig, path: Option<&Path>) -> Result<()> {
    let source = match path {
        Some(path) => path.display().to_string(),
        None => {
            let default = get_config_path()?;
            if default.exists() {
                default.display().to_string()
            } else {
                "built-in defaults".to_string()
            }
        }
    };

    println!("Current configuration ({}):", source);
    println!();
    println!("AWS:");
    println!("  Region: {}", config.aws.region);
    println!("  S3 endpoint: {}", config.storage_endpoint());
    println!("  CloudFront region: {}", config.aws.cdn_region);
    println!();
    println!("Site:");
    println!("  Folder: {}", config.site.dir.display());
    println!("  Entry document: {}", config.site.entry_document);
    println!();
    println!("CDN:");
    println!("  Cache policy: {}", config.cdn.cache_policy_id);
    println!("  Origin request policy: {}", config.cdn.origin_request_policy_id);
    println!("  Price class: {}", config.cdn.price_class);
    println!();
    println!("Log level: {}", config.log_level());

    Ok(())
}

#[derive(Tabled)]
struct SummaryRow {
    item: &'static str,
    value: String,
}

fn print_summary(report: &DeployReport) {
    let mut rows = vec![
        SummaryRow {
            item: "Bucket",
            value: format!(
                "{} ({}){}",
                report.bucket.name,
                report.bucket.region,
                if report.bucket.created { ", created" } else { "" }
            ),
        },
        SummaryRow {
            item: "Files uploaded",
            value: report.uploaded.to_string(),
        },
    ];

    if let Some(distribution) = &report.distribution {
        rows.push(SummaryRow {
            item: "Distribution",
            value: distribution.id.clone(),
        });
        rows.push(SummaryRow {
            item: "Origin",
            value: distribution.origin_domain.clone(),
        });
    }

    rows.push(SummaryRow {
        item: "Invalidation",
        value: match &report.invalidation {
            InvalidationOutcome::Submitted(request) => {
                format!("{} ({})", request.paths.join(", "), request.caller_reference)
            }
            InvalidationOutcome::Skipped => "skipped".to_string(),
        },
    });

    println!();
    println!("{}", Table::new(rows));
}

/// Handle completion command
pub fn handle_completion(shell: Shell, cmd: &mut Command) -> Result<()> {
    generate(shell, cmd, "sitepilot", &mut std::io::stdout());

    eprintln!();
    eprintln!("Installation instructions:");
    match shell {
        Shell::Bash => {
            eprintln!("  # Add to your ~/.bashrc:");
            eprintln!("  source <(sitepilot completion bash)");
        }
        Shell::Zsh => {
            eprintln!("  sitepilot completion zsh > ~/.zsh/completion/_sitepilot");
            eprintln!("  # Then in ~/.zshrc:");
            eprintln!("  fpath=(~/.zsh/completion $fpath)");
        }
        Shell::Fish => {
            eprintln!("  sitepilot completion fish > ~/.config/fish/completions/sitepilot.fish");
        }
        Shell::PowerShell => {
            eprintln!("  sitepilot completion powershell | Out-String | Invoke-Expression");
        }
        _ => {
            eprintln!("  Save the output where your shell loads completions from");
        }
    }

    Ok(())
}
