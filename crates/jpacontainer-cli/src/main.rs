//! JPAContainer Command-Line Tool
//!
//! Inspects the metadata derived from type descriptions and translates JSON
//! filters into JPQL queries.

mod executor;
mod formatter;

use clap::{Parser, Subcommand};
use formatter::OutputFormat;
use jpacontainer_core::{ContainerConfig, MetadataFactory, TypeRegistry};
use std::path::PathBuf;

/// JPAContainer Command-Line Tool
#[derive(Parser, Debug)]
#[command(name = "jpac")]
#[command(version, about = "Inspect entity metadata and translate filters to JPQL")]
pub struct Args {
    /// Type descriptions (.json, or a binary snapshot)
    #[arg(short = 't', long)]
    pub types: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List described classes
    Classes,

    /// Show the metadata of an entity or embeddable class
    Metadata {
        /// Class name
        class: String,
    },

    /// List the filterable properties of an entity
    Filterable {
        /// Entity class name
        class: String,
    },

    /// Translate a JSON filter into a JPQL query over an entity
    Translate {
        /// Entity class name
        class: String,

        /// Filter JSON, or @path to read it from a file
        #[arg(short = 'F', long)]
        filter: String,

        /// Alias of the query root
        #[arg(long, default_value = jpacontainer_core::config::DEFAULT_ROOT_ALIAS)]
        root_alias: String,

        /// Prefix of generated parameter names
        #[arg(long, default_value = jpacontainer_core::config::DEFAULT_PARAMETER_PREFIX)]
        parameter_prefix: String,

        /// Reject filters on non-filterable properties
        #[arg(long)]
        strict: bool,
    },

    /// Write the type descriptions as a binary snapshot
    Snapshot {
        /// Output file
        output: PathBuf,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter())
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Info level for the tool and the core library unless `RUST_LOG` says otherwise.
fn log_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("jpac=info".parse().unwrap())
        .add_directive("jpacontainer_core=info".parse().unwrap())
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let registry = TypeRegistry::load(&args.types)?;
    tracing::info!(types = registry.len(), path = %args.types.display(), "Loaded type descriptions");

    let factory = MetadataFactory::new(registry);
    let formatter = formatter::create_formatter(args.format);

    let output = match args.command {
        Command::Classes => executor::list_classes(&factory, &*formatter),
        Command::Metadata { class } => executor::show_metadata(&factory, &class, &*formatter)?,
        Command::Filterable { class } => executor::show_filterable(&factory, &class, &*formatter)?,
        Command::Translate {
            class,
            filter,
            root_alias,
            parameter_prefix,
            strict,
        } => {
            let config = ContainerConfig::new()
                .with_root_alias(root_alias)
                .with_parameter_prefix(parameter_prefix)
                .with_validate_filters_on_add(strict);
            let filter = executor::read_filter(&filter)?;
            executor::translate(&factory, &class, filter, config, &*formatter)?
        }
        Command::Snapshot { output } => {
            let bytes = factory.registry().to_bytes()?;
            std::fs::write(&output, &bytes)?;
            formatter.format_message(&format!(
                "Wrote {} type descriptions ({} bytes) to {}",
                factory.registry().len(),
                bytes.len(),
                output.display()
            ))
        }
    };

    println!("{}", output);
    Ok(())
}
