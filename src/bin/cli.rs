//! frosta CLI - SensorThings query compilation.
//!
//! Usage:
//!   frosta relations                          # Shortest path for every type pair
//!   frosta resolve <from> <to>                # One navigation path
//!   frosta compile <entity> [constraints]     # Compiled request, no network
//!   frosta fetch <entity> [constraints]       # Compile, execute and collapse

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use frosta::{
    resolve, Config, Constraints, EntityRef, EntityType, FrostClient, RelationTable, SchemaGraph,
};

#[derive(Parser)]
#[command(name = "frosta")]
#[command(about = "frosta - SensorThings query compiler", long_about = None)]
struct Cli {
    /// Configuration file (TOML). FROSTA_URL and friends override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the navigation path between every pair of entity types
    Relations,

    /// Resolve the navigation path from one entity type to another
    Resolve {
        /// Origin type (singular or plural, case-insensitive)
        from: String,
        /// Target type
        to: String,
    },

    /// Compile constraints into a request without executing it
    Compile(QueryArgs),

    /// Compile, execute against the configured service and print the result
    Fetch(QueryArgs),
}

#[derive(Args)]
struct QueryArgs {
    /// Entity type to query (e.g. Observations, thing)
    entity: String,

    /// Wildcard pattern on @iot.id (`x*`, `*x`, `*x*`)
    #[arg(long)]
    id: Option<String>,

    /// Wildcard pattern on name
    #[arg(long)]
    name: Option<String>,

    /// Wildcard pattern on description
    #[arg(long)]
    description: Option<String>,

    /// Inclusive lower bound on phenomenonTime
    #[arg(long)]
    start: Option<String>,

    /// Exclusive upper bound on phenomenonTime
    #[arg(long)]
    end: Option<String>,

    /// Inclusive lower bound on result
    #[arg(long, allow_hyphen_values = true)]
    lower: Option<f64>,

    /// Exclusive upper bound on result
    #[arg(long, allow_hyphen_values = true)]
    upper: Option<f64>,

    /// Related entity as Type:id; repeat for several
    #[arg(long = "related", value_name = "TYPE:ID")]
    related: Vec<String>,

    /// Raw filter expression appended to the compiled clauses
    #[arg(long)]
    filter: Option<String>,

    /// Ordering override, passed through verbatim
    #[arg(long)]
    orderby: Option<String>,

    #[arg(long)]
    skip: Option<u64>,

    #[arg(long)]
    top: Option<u64>,
}

impl QueryArgs {
    fn entity_type(&self) -> Result<EntityType> {
        Ok(self.entity.parse()?)
    }

    fn constraints(&self) -> Result<Constraints> {
        let mut constraints = Constraints::new();
        if let Some(id) = &self.id {
            constraints = constraints.id(id.as_str());
        }
        if let Some(name) = &self.name {
            constraints = constraints.name(name.as_str());
        }
        if let Some(description) = &self.description {
            constraints = constraints.description(description.as_str());
        }
        if let Some(start) = &self.start {
            constraints = constraints.start(start.as_str());
        }
        if let Some(end) = &self.end {
            constraints = constraints.end(end.as_str());
        }
        if let Some(lower) = self.lower {
            constraints = constraints.lower_limit(lower);
        }
        if let Some(upper) = self.upper {
            constraints = constraints.upper_limit(upper);
        }
        if !self.related.is_empty() {
            let refs = self
                .related
                .iter()
                .map(|spec| EntityRef::parse(spec))
                .collect::<frosta::Result<Vec<_>>>()?;
            constraints = constraints.related(refs);
        }
        if let Some(filter) = &self.filter {
            constraints = constraints.filter(filter.as_str());
        }
        if let Some(orderby) = &self.orderby {
            constraints = constraints.order_by(orderby.as_str());
        }
        if let Some(skip) = self.skip {
            constraints = constraints.skip(skip);
        }
        if let Some(top) = self.top {
            constraints = constraints.top(top);
        }
        Ok(constraints)
    }
}

#[derive(Serialize)]
struct RelationRow<'a> {
    from: EntityType,
    to: EntityType,
    path: &'a frosta::NavigationPath,
}

#[derive(Serialize)]
struct CompiledRequest {
    request: String,
    spec: frosta::QuerySpec,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Relations => {
            let table = RelationTable::build(SchemaGraph::sensor_things());
            let rows: Vec<_> = table
                .iter()
                .map(|(from, to, path)| RelationRow { from, to, path })
                .collect();
            print_json(&rows)
        }
        Commands::Resolve { from, to } => {
            let path = resolve(from.parse()?, to.parse()?)?;
            println!("{}", path);
            Ok(())
        }
        Commands::Compile(args) => {
            let spec = frosta::compile(args.entity_type()?, &args.constraints()?)?;
            print_json(&CompiledRequest {
                request: spec.to_request_line(),
                spec,
            })
        }
        Commands::Fetch(args) => {
            let config = load_config(cli.config.as_deref())?;
            let client = FrostClient::from_config(&config)?;
            let result = client.query(args.entity_type()?, &args.constraints()?)?;
            print_json(&result)
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => {
            let mut config = Config::default();
            config.apply_env();
            config.validate()?;
            Ok(config)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
