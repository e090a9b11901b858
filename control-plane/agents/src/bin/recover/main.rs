//! Rehearses a volume recovery against a captured host state.
//! The host state holds the records of the metadata store and the volumes found on the storage;
//! the reply is printed along with the records an import created.

use agents::recover::{
    memory::{HostState, MemoryBackend, MemoryStore},
    RecoverArgs, RecoverConfig, RecoverMode, Service,
};
use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use stor_port::{
    transport_api::ReplyError,
    types::v0::transport::{RecoverPools, RecoverReply},
};
use utils::tracing_telemetry::{FmtLayer, FmtStyle, TracingTelemetry};

/// The Cli arguments for this binary.
#[derive(Debug, Parser)]
#[clap(name = "recover", version, about = "Recover volumes unknown to the metadata store")]
struct CliArgs {
    /// Yaml file with the captured host state: projects, profiles, networks, pools, drivers,
    /// volumes and mounted pools.
    #[clap(long, short)]
    state: PathBuf,

    /// Yaml file with the pools to scan, eg: `pools: [{name: p1, driver: dir}]`.
    #[clap(long, short)]
    pools: PathBuf,

    /// Format of the printed reply.
    #[clap(long, short, default_value = "yaml")]
    output: OutputFormat,

    /// Formatting style of the logs, which are written to stderr.
    #[clap(long, env = "LOG_STYLE", default_value = "pretty")]
    log_style: FmtStyle,

    /// Don't use ansi colours in the logs.
    #[clap(long, env = "NO_COLOURS")]
    no_colours: bool,

    #[clap(flatten)]
    recover: RecoverArgs,

    #[clap(subcommand)]
    action: Action,
}

#[derive(Debug, Clone, Copy, clap::Subcommand)]
enum Action {
    /// Report the unknown volumes and their missing dependencies.
    Validate,
    /// Recreate the records of the unknown volumes.
    Import,
}

impl From<Action> for RecoverMode {
    fn from(action: Action) -> Self {
        match action {
            Action::Validate => Self::Validate,
            Action::Import => Self::Import,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, strum_macros::EnumString)]
#[strum(serialize_all = "lowercase")]
enum OutputFormat {
    Yaml,
    Json,
}

impl OutputFormat {
    fn render<T: Serialize>(&self, value: &T) -> anyhow::Result<String> {
        Ok(match self {
            Self::Yaml => serde_yaml::to_string(value)?,
            Self::Json => serde_json::to_string_pretty(value)?,
        })
    }
}

/// Records created by an import.
#[derive(Serialize)]
struct Imported {
    pools: Vec<String>,
    instances: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli_args = CliArgs::parse();
    TracingTelemetry::builder()
        .with_writer(FmtLayer::Stderr)
        .with_style(cli_args.log_style)
        .with_colours(!cli_args.no_colours)
        .init("recover");
    tracing::debug!(?cli_args, "Using options");

    run(cli_args).await
}

async fn run(cli_args: CliArgs) -> anyhow::Result<()> {
    let state: HostState = read_yaml(&cli_args.state)?;
    let request: RecoverPools = read_yaml(&cli_args.pools)?;

    let store = MemoryStore::from_state(&state);
    let backend = MemoryBackend::from_state(&state, store.clone());
    let service = Service::new(
        Arc::new(store.clone()),
        Arc::new(backend),
        RecoverConfig::from(&cli_args.recover),
    );
    let known_pools = store.pools().len();
    let known_instances = store.instances().len();

    let mode = RecoverMode::from(cli_args.action);
    let reply = match service.handle(mode, &request).await {
        Ok(reply) => reply,
        Err(error) => return Err(report(error)),
    };
    println!("{}", cli_args.output.render(&reply)?);

    if mode == RecoverMode::Import && matches!(reply, RecoverReply::Empty {}) {
        let imported = Imported {
            pools: store.pools()[known_pools..]
                .iter()
                .map(|pool| pool.name.to_string())
                .collect(),
            instances: store.instances()[known_instances..]
                .iter()
                .map(|instance| format!("{}/{}", instance.project, instance.name))
                .collect(),
        };
        println!("{}", cli_args.output.render(&imported)?);
    }
    Ok(())
}

fn report(error: ReplyError) -> anyhow::Error {
    let status = http::StatusCode::from(&error);
    tracing::error!(%status, kind = error.kind.as_ref(), "Recovery failed");
    anyhow::Error::new(error).context(format!("recovery failed with status {status}"))
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open '{}'", path.display()))?;
    serde_yaml::from_reader(file).with_context(|| format!("failed to parse '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_args() {
        let args =
            CliArgs::parse_from(["recover", "-s", "host.yaml", "-p", "pools.yaml", "import"]);
        assert_eq!(args.output, OutputFormat::Yaml);
        assert_eq!(args.log_style, FmtStyle::Pretty);
        assert!(!args.no_colours);
        assert_eq!(RecoverMode::from(args.action), RecoverMode::Import);

        let args = CliArgs::parse_from([
            "recover",
            "--state",
            "host.yaml",
            "--pools",
            "pools.yaml",
            "--output",
            "json",
            "--log-style",
            "compact",
            "--no-colours",
            "--root-device-name",
            "rootfs",
            "validate",
        ]);
        assert_eq!(args.output, OutputFormat::Json);
        assert_eq!(args.log_style, FmtStyle::Compact);
        assert!(args.no_colours);
        assert_eq!(RecoverConfig::from(&args.recover).root_device_name(), "rootfs");
        assert_eq!(RecoverMode::from(args.action), RecoverMode::Validate);
    }
}
