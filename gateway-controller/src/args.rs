use crate::{core::GATEWAY_CONTROLLER_NAME, index, k8s, report::Report, status};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[clap(
    name = "gateway",
    about = "Resolves Gateway API route attachment and delegation"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "linkerd=info,warn",
        env = "LINKERD_GATEWAY_CONTROLLER_LOG"
    )]
    log_level: String,

    #[clap(long, value_enum, default_value = "plain")]
    log_format: LogFormat,

    /// A YAML or JSON document listing gateways, listenerSets, httpRoutes,
    /// tcpRoutes, tlsRoutes, grpcRoutes and namespaces. `-` reads stdin.
    #[clap(long)]
    snapshot: PathBuf,

    #[clap(long, default_value = GATEWAY_CONTROLLER_NAME)]
    controller_name: String,

    #[clap(long, default_value_t = index::DEFAULT_MAX_DELEGATION_DEPTH)]
    max_delegation_depth: usize,

    #[clap(long, default_value_t = index::DEFAULT_MAX_DELEGATION_NODES)]
    max_delegation_nodes: usize,

    #[clap(long, value_enum, default_value = "yaml")]
    output: OutputFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Plain,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

// === impl Args ===

impl Args {
    #[inline]
    pub fn parse_and_run() -> Result<()> {
        Self::parse().run()
    }

    pub fn run(self) -> Result<()> {
        let Self {
            log_level,
            log_format,
            snapshot,
            controller_name,
            max_delegation_depth,
            max_delegation_nodes,
            output,
        } = self;

        log_format.try_init(&log_level)?;

        let resources = load_snapshot(&snapshot)?;
        let snapshot = index::Snapshot::from_resources(&resources);
        info!(
            gateways = snapshot.gateways().len(),
            listener_sets = snapshot.listener_sets().len(),
            routes = snapshot.routes().len(),
            "Loaded snapshot"
        );

        let config = index::Config {
            controller_name,
            max_delegation_depth,
            max_delegation_nodes,
        };
        let resolution = index::resolve(&snapshot, &config);

        let mut statuses = status::Index::new(&config.controller_name);
        statuses.apply_resolution(&resolution);
        let report = Report::new(&resolution, &statuses.statuses());

        let mut stdout = std::io::stdout().lock();
        match output {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut stdout, &report)?;
                writeln!(stdout)?;
            }
            OutputFormat::Yaml => serde_yaml::to_writer(&mut stdout, &report)?,
        }
        Ok(())
    }
}

fn load_snapshot(path: &Path) -> Result<k8s::ResourceSnapshot> {
    let text = if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("failed to read snapshot from stdin")?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?
    };
    parse_snapshot(&text)
}

/// JSON documents are also valid YAML, so one parser reads both.
fn parse_snapshot(text: &str) -> Result<k8s::ResourceSnapshot> {
    serde_yaml::from_str(text).context("failed to parse snapshot")
}

// === impl LogFormat ===

impl LogFormat {
    pub fn try_init(self, filter: &str) -> Result<()> {
        let filter = EnvFilter::try_new(filter)
            .with_context(|| format!("invalid log filter {filter:?}"))?;
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);
        match self {
            Self::Plain => builder.try_init(),
            Self::Json => builder.json().try_init(),
        }
        .map_err(|error| anyhow::anyhow!(error))
    }
}
