use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use meshgen_core::{ComponentRole, MeshSpec};
use meshgen_resolve::{ReplicaLookup, StaticLookup};
use meshgen_synth::Descriptor;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "meshgenctl", version, about = "Render mesh control-plane descriptors")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Yaml)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Yaml, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render every descriptor for one role (or all roles)
    Render {
        /// Mesh specification file (YAML or JSON)
        #[arg(long = "spec", env = "MESHGEN_SPEC")]
        spec: PathBuf,
        /// Component role: telemetry, policy or all
        #[arg(long = "role", env = "MESHGEN_ROLE", default_value = "all")]
        role: String,
        /// Pin an observed replica count, e.g. istio-telemetry-autoscaler=3
        #[arg(long = "replicas", value_name = "NAME=N")]
        replicas: Vec<String>,
        /// Read observed replica counts from live autoscalers in the current kube context
        #[arg(long = "live", action = ArgAction::SetTrue)]
        live: bool,
    },
    /// Validate a mesh specification for every role without printing descriptors
    Check {
        #[arg(long = "spec", env = "MESHGEN_SPEC")]
        spec: PathBuf,
    },
}

fn init_tracing() {
    let env = std::env::var("MESHGEN_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // logs go to stderr so rendered output stays pipeable
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("MESHGEN_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid MESHGEN_METRICS_ADDR; expected host:port");
        }
    }
}

fn load_spec(path: &Path) -> Result<MeshSpec> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    // YAML is a superset of JSON
    serde_yaml::from_str(&raw).with_context(|| format!("parsing mesh specification {}", path.display()))
}

fn parse_roles(role: &str) -> Result<Vec<ComponentRole>> {
    if role == "all" {
        return Ok(ComponentRole::ALL.to_vec());
    }
    Ok(vec![role.parse::<ComponentRole>()?])
}

fn parse_replica_override(s: &str) -> Result<(String, i32)> {
    let (name, n) = s.split_once('=').ok_or_else(|| anyhow!("invalid --replicas {:?} (expect NAME=N)", s))?;
    if name.is_empty() {
        bail!("invalid --replicas {:?}: empty name", s);
    }
    let n = n.parse::<i32>().with_context(|| format!("invalid replica count in {:?}", s))?;
    if n < 0 {
        bail!("invalid --replicas {:?}: count must not be negative", s);
    }
    Ok((name.to_string(), n))
}

fn render(descriptors: &[Descriptor], output: Output) -> Result<String> {
    match output {
        Output::Json => Ok(serde_json::to_string_pretty(descriptors)?),
        Output::Yaml => {
            let mut out = String::new();
            for d in descriptors {
                out.push_str("---\n");
                out.push_str(&serde_yaml::to_string(d).with_context(|| format!("rendering {}", d.key()))?);
            }
            Ok(out)
        }
    }
}

async fn build_lookup(spec: &MeshSpec, roles: &[ComponentRole], pins: &[String], live: bool) -> Result<StaticLookup> {
    let namespace = spec.namespace.clone().unwrap_or_default();
    let mut lookup = if live && !namespace.is_empty() {
        let client = meshgen_kubehub::get_kube_client().await?;
        meshgen_kubehub::prefetch_replicas(client, &namespace, roles).await
    } else {
        if live {
            warn!("--live given but spec has no namespace; skipping autoscaler lookup");
        }
        StaticLookup::new()
    };
    // explicit pins win over live state
    for pin in pins {
        let (name, n) = parse_replica_override(pin)?;
        lookup.insert(name, namespace.clone(), n);
    }
    Ok(lookup)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render { spec, role, replicas, live } => {
            let roles = parse_roles(&role)?;
            let mesh = load_spec(&spec)?;
            let lookup = build_lookup(&mesh, &roles, &replicas, live).await?;
            info!(roles = ?roles, pins = replicas.len(), live, "render invoked");

            let mut all = Vec::new();
            for role in roles {
                let descriptors = meshgen_synth::synthesize(&mesh, role, &lookup as &dyn ReplicaLookup)
                    .with_context(|| format!("synthesizing {}", role))?;
                all.extend(descriptors);
            }
            print!("{}", render(&all, cli.output)?);
        }
        Commands::Check { spec } => {
            let mesh = load_spec(&spec)?;
            let mut failed = false;
            for role in ComponentRole::ALL {
                match meshgen_synth::synthesize(&mesh, role, &meshgen_resolve::NoLookup) {
                    Ok(d) => println!("{}: ok ({} descriptors)", role, d.len()),
                    Err(e) => {
                        error!(%role, error = %e, "check failed");
                        println!("{}: {}", role, e);
                        failed = true;
                    }
                }
            }
            if failed {
                bail!("mesh specification {} is invalid", spec.display());
            }
        }
    }
    Ok(())
}
