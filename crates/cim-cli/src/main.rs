//! # cim-cli
//!
//! Command-line front end for the CIM RDFS schema compiler.
//!
//! Selects profile documents by glob pattern, resolves them into one
//! specification and writes the structured dump or a summary.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use cim_ir::Cursor;
use cim_schema::{ResolveConfig, SchemaLoader, Specification};

#[derive(Parser)]
#[command(name = "cimgen")]
#[command(about = "CIM RDFS schema compiler")]
#[command(version)]
struct Cli {
    /// Path to a resolution configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the matching profiles and write the structured dump
    Dump {
        /// Glob pattern selecting the profile documents
        pattern: String,

        /// Output file; the format follows its extension
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Format used when writing to stdout
        #[arg(short, long, value_enum, default_value_t = DumpFormat::Json)]
        format: DumpFormat,
    },

    /// Resolve the matching profiles and print entity counts
    Summary {
        /// Glob pattern selecting the profile documents
        pattern: String,
    },

    /// Decode a single document and print its value tree as JSON
    Decode {
        /// Document to decode
        input: PathBuf,

        /// Sub-tree to print, e.g. `rdf:RDF/rdf:Description[0]`
        #[arg(short, long)]
        path: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DumpFormat {
    Json,
    Yaml,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ResolveConfig> {
    match path {
        Some(path) => ResolveConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(ResolveConfig::default()),
    }
}

fn resolve(config: ResolveConfig, pattern: &str) -> anyhow::Result<Specification> {
    SchemaLoader::new(config)
        .load_pattern(pattern)
        .with_context(|| format!("failed to load profiles matching '{pattern}'"))
}

fn dump(spec: &Specification, output: Option<&Path>, format: DumpFormat) -> anyhow::Result<()> {
    if let Some(path) = output {
        spec.write_dump(path)
            .with_context(|| format!("failed to write dump to {}", path.display()))?;
        tracing::info!(path = %path.display(), "dump written");
        return Ok(());
    }

    let content = match format {
        DumpFormat::Json => spec.to_json_pretty()?,
        DumpFormat::Yaml => spec.to_yaml()?,
    };
    println!("{content}");
    Ok(())
}

fn summary(spec: &Specification) {
    let stats = spec.stats();
    println!("profiles: {}", spec.profile_order.join(", "));
    println!("types: {}", stats.types);
    println!("attributes: {}", stats.attributes);
    println!("enums: {}", stats.enums);
    println!("enum values: {}", stats.enum_values);
    println!("datatypes: {}", stats.datatypes);
    println!("primitives: {}", stats.primitives);
}

fn decode(input: &Path, path: Option<&str>) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
    let document =
        cim_ir::decode(&bytes).with_context(|| format!("failed to decode {}", input.display()))?;

    let cursor = Cursor::new(&document);
    let cursor = match path {
        Some(path) => cursor.navigate(path)?,
        None => cursor,
    };

    let json = match (cursor.value(), cursor.map(), cursor.text()) {
        (Some(value), _, _) => serde_json::to_string_pretty(value)?,
        (None, Some(map), _) => serde_json::to_string_pretty(map)?,
        (None, None, Some(text)) => serde_json::to_string_pretty(text)?,
        (None, None, None) => bail!("nothing to print at the selected path"),
    };
    println!("{json}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Dump {
            pattern,
            output,
            format,
        } => {
            let spec = resolve(load_config(cli.config.as_deref())?, &pattern)?;
            dump(&spec, output.as_deref(), format)
        }
        Commands::Summary { pattern } => {
            let spec = resolve(load_config(cli.config.as_deref())?, &pattern)?;
            summary(&spec);
            Ok(())
        }
        Commands::Decode { input, path } => decode(&input, path.as_deref()),
    }
}
