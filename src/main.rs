// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hublink::bootstrap::{Connector, Outcome};
use hublink::config::Config;
use hublink::kubernetes::create_hub_client;
use hublink::registry::NO_CLUSTERS_MESSAGE;

/// Bootstrap kubeconfig credentials for clusters managed by an open-cluster-management hub
#[derive(Parser, Debug)]
#[command(name = "hublink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = Output::Text)]
    output: Output,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the managed clusters known to the hub
    Clusters,
    /// Create a service account on a cluster and write a kubeconfig for it
    Connect {
        cluster: String,
        /// ClusterRole bound to the service account
        #[arg(long)]
        role: Option<String>,
    },
    /// Connect every managed cluster
    ConnectAll {
        #[arg(long)]
        role: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Output {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, stdout only carries results
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: identity={}, profile_dir={}",
        config.identity_name,
        config.profile_dir.display()
    );

    let client = create_hub_client(&config)
        .await
        .context("Failed to connect to the hub cluster")?;
    let connector = Connector::new(client, config);

    let failed = match cli.command {
        Command::Clusters => print_outcome(&connector.list_clusters().await, cli.output)?,
        Command::Connect { cluster, role } => {
            print_outcome(&connector.connect(&cluster, role.as_deref()).await, cli.output)?
        }
        Command::ConnectAll { role } => {
            let outcomes = connector.connect_all(role.as_deref()).await?;
            print_outcomes(&outcomes, cli.output)?
        }
    };

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

/// Print a single outcome, returning whether it was an error
fn print_outcome(outcome: &Outcome, output: Output) -> Result<bool> {
    match output {
        Output::Text => println!("{}", outcome.message),
        Output::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
    }
    Ok(outcome.is_error)
}

fn print_outcomes(outcomes: &[(String, Outcome)], output: Output) -> Result<bool> {
    match output {
        Output::Text if outcomes.is_empty() => println!("{}", NO_CLUSTERS_MESSAGE),
        Output::Text => {
            for (cluster, outcome) in outcomes {
                let status = if outcome.is_error { "FAILED" } else { "OK" };
                println!("{} {}: {}", status, cluster, outcome.message);
            }
        }
        Output::Json => {
            let report: Vec<_> = outcomes
                .iter()
                .map(|(cluster, outcome)| {
                    serde_json::json!({
                        "cluster": cluster,
                        "message": outcome.message,
                        "is_error": outcome.is_error,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(outcomes.iter().any(|(_, outcome)| outcome.is_error))
}
