//! FlowForge: derive static routes and nftables host rules from a topology

mod commands;
mod config;
mod error;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use commands::{GenerateOutput, ServiceSelection};
use config::{Settings, SettingsLoader};
use flowforge_core::{EndpointRef, GenerateRequest, Topology, TopologyLoader};
use std::path::PathBuf;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, Registry};

#[derive(Parser)]
#[command(
    name = "flowforge",
    about = "Derive static routes and host firewall rules from a network topology",
    version
)]
struct Cli {
    /// Settings file (TOML), applied on top of user and project settings
    #[arg(long, short = 'c', global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Topology file (JSON); overrides topology.path from the settings
    #[arg(long, short = 't', global = true, value_name = "PATH", env = "FLOWFORGE_TOPOLOGY")]
    topology: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the topology and report missing generator prerequisites
    Check,

    /// List servers, VLANs and eligible via-VLANs of an environment
    List {
        /// Environment tag
        #[arg(long, short = 'e')]
        env: String,
    },

    /// Generate routes, firewall rules and the CSV summary for one flow
    Generate(GenerateArgs),

    /// Rewrite the topology in canonical form
    Normalize {
        /// Target file (default: overwrite the loaded topology file)
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Environment tag
    #[arg(long, short = 'e')]
    env: String,

    /// Source endpoint: server:NAME or vlan:NAME
    #[arg(long, value_name = "ENDPOINT")]
    src: EndpointRef,

    /// Destination endpoint: server:NAME or vlan:NAME
    #[arg(long, value_name = "ENDPOINT")]
    dst: EndpointRef,

    /// VLAN to route through (default: the only eligible VLAN)
    #[arg(long, value_name = "VLAN")]
    via: Option<String>,

    /// Route metric (default: generator.default_metric)
    #[arg(long)]
    metric: Option<u32>,

    /// Also generate the reverse firewall rules
    #[arg(long, short = 'b')]
    bidirectional: bool,

    /// Only generate forward rules, even if generator.bidirectional is set
    #[arg(long, conflicts_with = "bidirectional")]
    no_bidirectional: bool,

    /// Service to allow, NAME[:INDEX] (can be used multiple times)
    #[arg(long = "service", short = 's', value_name = "SERVICE", required = true)]
    services: Vec<ServiceSelection>,

    /// Write routes.txt, firewall.txt and routes.csv into this directory
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Persist the new routes and rules into the topology file
    #[arg(long)]
    apply: bool,
}

type LogHandle = reload::Handle<EnvFilter, Registry>;

fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("FLOWFORGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

/// Returns a handle so `common.verbose` can raise the level once settings are loaded
fn init_logging(verbose: bool) -> LogHandle {
    let (filter, handle) = reload::Layer::new(env_filter(verbose));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    handle
}

/// `--no-bidirectional` wins over the setting, `--bidirectional` over both
fn bidirectional(args: &GenerateArgs, settings: &Settings) -> bool {
    if args.no_bidirectional {
        false
    } else {
        args.bidirectional || settings.generator.bidirectional
    }
}

fn build_request(topology: &Topology, settings: &Settings, args: GenerateArgs) -> Result<(GenerateRequest, GenerateOutput)> {
    let via_vlan = commands::pick_via_vlan(topology, &args.env, args.via.as_deref())?;
    let bidirectional = bidirectional(&args, settings);
    let services = args
        .services
        .iter()
        .map(|s| s.resolve(topology))
        .collect::<Result<Vec<_>>>()?;

    let request = GenerateRequest {
        env: args.env,
        src: args.src,
        dst: args.dst,
        via_vlan,
        metric: args.metric.or(Some(settings.generator.default_metric)),
        bidirectional,
        services,
    };
    let output = GenerateOutput {
        out_dir: args.out_dir.or_else(|| settings.output.dir.clone()),
        apply_to: None,
    };
    Ok((request, output))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_handle = init_logging(cli.verbose);

    let settings =
        SettingsLoader::load_with_priority(cli.config.as_deref()).context("Failed to load settings")?;
    if settings.common.verbose && !cli.verbose {
        if let Err(e) = log_handle.reload(env_filter(true)) {
            tracing::warn!("Failed to enable debug logging from settings: {}", e);
        }
    }

    let configured = settings.topology.path.as_deref();
    let source = commands::topology_source(cli.topology.as_deref(), configured);
    let mut topology = TopologyLoader::load_with_priority(cli.topology.as_deref(), configured)
        .context("Failed to load topology")?;
    match &source {
        Some(path) => tracing::debug!("Using topology {:?}", path),
        None => tracing::debug!("No topology file configured, using built-in default"),
    }

    let output = match cli.command {
        Command::Check => commands::check(&topology)?,
        Command::List { env } => commands::list(&topology, &env)?,
        Command::Generate(args) => {
            let apply = args.apply;
            let (request, mut output) = build_request(&topology, &settings, args)?;
            if apply {
                output.apply_to = Some(
                    source
                        .clone()
                        .context("--apply needs a topology file (--topology or topology.path)")?,
                );
            }
            commands::run_generate(&mut topology, &request, &output)?
        }
        Command::Normalize { output } => {
            let target = output
                .or_else(|| source.clone())
                .context("normalize needs --output or a topology file")?;
            commands::normalize(&topology, &target)?
        }
    };

    println!("{}", output);
    Ok(())
}
