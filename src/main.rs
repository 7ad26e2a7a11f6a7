use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use tblmerge::config::{CliConfig, DEFAULT_SCHEMA, MergeRequest};
use tblmerge::loader::FsLoader;
use tblmerge::merge::merge_schemas;
use tblmerge::report::{render_summary, render_validation};
use tblmerge::schema::render_document;
use tblmerge::validate::validate_merged_schema;

/// tblmerge - combine tbls schema documents from several databases
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge multiple tbls schema JSON files into a single combined schema
    ///
    /// Standardizes table names to database.schema.table, extracts virtual
    /// relations from view JOIN clauses and removes duplicate relations,
    /// preferring foreign key constraints over extracted ones.
    Merge(MergeArgs),
}

#[derive(Args)]
struct MergeArgs {
    /// Schema JSON files to merge (at least 2)
    inputs: Vec<PathBuf>,

    /// Output file path (required)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Name for the merged schema
    #[arg(long)]
    name: Option<String>,

    /// Description for the merged schema
    #[arg(long)]
    desc: Option<String>,

    /// Schema used for unqualified names
    #[arg(long, default_value = DEFAULT_SCHEMA)]
    default_schema: String,

    /// Use SQL Server bracket notation [Database].[Schema].[Table]
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    brackets: bool,

    /// Extract virtual relations from view JOIN clauses
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    extract_view_relations: bool,

    /// Validate the merged schema and report broken relations
    #[arg(long)]
    validate: bool,

    /// Database name for a file, as filepath:dbname (repeatable)
    #[arg(long = "db-mapping", value_name = "PATH:NAME")]
    db_mappings: Vec<String>,
}

impl From<MergeArgs> for CliConfig {
    fn from(args: MergeArgs) -> Self {
        CliConfig {
            inputs: args.inputs,
            output: args.output,
            name: args.name,
            description: args.desc,
            default_schema: args.default_schema,
            use_brackets: args.brackets,
            extract_view_relations: args.extract_view_relations,
            validate: args.validate,
            db_mappings: args.db_mappings,
        }
    }
}

fn run_merge(args: MergeArgs) -> anyhow::Result<()> {
    let request = MergeRequest::from_cli(args.into())?;
    let sources = request.sources();

    println!("Merging {} schema files...", sources.len());
    for (i, source) in sources.iter().enumerate() {
        println!("  [{}/{}] {}", i + 1, sources.len(), source);
    }

    let (merged, stats) = merge_schemas(&sources, &FsLoader, &request.config)?;

    let bytes = render_document(&merged)?;
    fs::write(&request.output, bytes)
        .with_context(|| format!("failed to write {}", request.output.display()))?;

    let output = request.output.display().to_string();
    print!("{}", render_summary(&stats, &merged, &request.config, &output));

    if request.validate {
        println!();
        print!("{}", render_validation(&validate_merged_schema(&merged)));
    }

    Ok(())
}

fn main() {
    // Progress logs go to stderr; RUST_LOG=info shows per-file steps.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Merge(args) => run_merge(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
