//! Rolegate CLI - Command line interface.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rolegate_authz::{AuthorizationPipeline, AuthzConfig, BackendRegistry, Authorized, User};

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "rolegate")]
#[command(about = "Rolegate CLI - Resolve user roles through authorization backends")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/rolegate.json", env = "ROLEGATE_CONFIG")]
    config: PathBuf,

    /// Log backend activity (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the roles of one or more principals
    Resolve {
        /// Principal names
        #[arg(required = true)]
        principals: Vec<String>,
        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Validate the configuration and print the backend chain
    CheckConfig,
}

// ============================================================================
// Output Types
// ============================================================================

#[derive(Serialize)]
struct FailureOutput {
    domain: String,
    backend: String,
    kind: String,
    reason: String,
}

#[derive(Serialize)]
struct ResolveOutput {
    user: User,
    cache_hit: bool,
    succeeded: Vec<String>,
    failures: Vec<FailureOutput>,
}

impl From<Authorized> for ResolveOutput {
    fn from(authorized: Authorized) -> Self {
        let failures = authorized
            .report
            .failures
            .iter()
            .map(|f| FailureOutput {
                domain: f.domain.clone(),
                backend: f.error.backend_type().to_string(),
                kind: f.error.kind().to_string(),
                reason: f.error.reason().to_string(),
            })
            .collect();

        Self {
            user: User::clone(&authorized.user),
            cache_hit: authorized.report.cache_hit,
            succeeded: authorized.report.succeeded,
            failures,
        }
    }
}

// ============================================================================
// Command Handlers
// ============================================================================

fn load_config(path: &Path) -> Result<(AuthzConfig, PathBuf)> {
    let config = AuthzConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    let config_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((config, config_dir))
}

async fn cmd_resolve(config_path: &Path, principals: &[String], format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        bail!("Unknown format: {}. Use 'text' or 'json'", format);
    }

    let (config, config_dir) = load_config(config_path)?;
    let pipeline =
        AuthorizationPipeline::from_config(&config, &BackendRegistry::with_builtin(), &config_dir)
            .context("Failed to build authorization pipeline")?;

    let mut outputs = Vec::with_capacity(principals.len());
    for principal in principals {
        let user = User::new(principal.as_str())
            .with_context(|| format!("Invalid principal '{}'", principal))?;
        outputs.push(ResolveOutput::from(pipeline.authorize(user).await));
    }

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
        return Ok(());
    }

    for output in &outputs {
        println!("{}:", output.user.name());
        if output.user.roles().is_empty() {
            println!("  Roles:      (none)");
        } else {
            let roles: Vec<&str> = output.user.roles().iter().map(String::as_str).collect();
            println!("  Roles:      {}", roles.join(", "));
        }
        for (key, value) in output.user.attributes() {
            println!("  Attribute:  {}={}", key, value);
        }
        println!("  Resolved:   {}", output.succeeded.join(", "));
        for failure in &output.failures {
            println!(
                "  Failed:     {} ({}, {}): {}",
                failure.domain, failure.backend, failure.kind, failure.reason
            );
        }
    }

    Ok(())
}

fn cmd_check_config(config_path: &Path) -> Result<()> {
    let (config, config_dir) = load_config(config_path)?;
    let registry = BackendRegistry::with_builtin();
    let chain = registry
        .build_chain(&config, &config_dir)
        .context("Invalid backend chain")?;

    println!("Configuration OK: {}", config_path.display());
    println!(
        "  Cache:      {}",
        if config.cache.enabled {
            format!("enabled, ttl {}s", config.cache.ttl_secs)
        } else {
            "disabled".to_string()
        }
    );
    match config.backend_timeout_ms {
        Some(ms) => println!("  Timeout:    {}ms per backend", ms),
        None => println!("  Timeout:    none"),
    }

    if chain.is_empty() {
        println!("  No backends enabled");
    } else {
        println!("  Chain:");
        for (i, entry) in chain.entries().iter().enumerate() {
            println!("    {}. {} ({})", i + 1, entry.name(), entry.backend_type());
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    tracing::debug!(config = %cli.config.display(), "Using configuration file");

    match cli.command {
        Commands::Resolve { principals, format } => {
            cmd_resolve(&cli.config, &principals, &format).await
        },
        Commands::CheckConfig => cmd_check_config(&cli.config),
    }
}
