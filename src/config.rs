use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_NAME: &str = "Combined Schema";
pub const DEFAULT_SCHEMA: &str = "dbo";

/// Input errors, reported before any document is read.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least 2 schema files are required, got {0}")]
    TooFewInputs(usize),

    #[error("output file must be specified with -o or --output")]
    MissingOutput,

    #[error("invalid database mapping format: {0} (expected filepath:dbname)")]
    InvalidMapping(String),
}

/// Merge settings. The only configuration channel into the merge core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Name of the merged schema
    pub name: String,
    /// Description of the merged schema
    pub description: String,
    /// Schema used for unqualified names when a document declares none
    pub default_schema: String,
    /// Emit `[Database].[Schema].[Table]` instead of `Database.Schema.Table`
    pub use_brackets: bool,
    /// Derive virtual relations from view JOIN clauses
    pub extract_view_relations: bool,
    /// Source identity -> database name
    pub database_mapping: BTreeMap<String, String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            description: String::new(),
            default_schema: DEFAULT_SCHEMA.to_string(),
            use_brackets: true,
            extract_view_relations: true,
            database_mapping: BTreeMap::new(),
        }
    }
}

impl MergeConfig {
    /// Fill an empty name or description for a merge of `source_count` documents.
    pub fn with_defaults_for(mut self, source_count: usize) -> Self {
        if self.name.is_empty() {
            self.name = DEFAULT_NAME.to_string();
        }
        if self.description.is_empty() {
            self.description = format!("Combined schema from {} databases", source_count);
        }
        self
    }

    /// Database name for a source, if one is mapped explicitly.
    pub fn mapped_database(&self, source: &str) -> Option<&str> {
        self.database_mapping.get(source).map(String::as_str)
    }
}

/// Raw command-line values for the `merge` command.
#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    pub inputs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub default_schema: String,
    pub use_brackets: bool,
    pub extract_view_relations: bool,
    pub validate: bool,
    pub db_mappings: Vec<String>,
}

/// A validated merge invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeRequest {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub validate: bool,
    pub config: MergeConfig,
}

impl MergeRequest {
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        if cli.inputs.len() < 2 {
            return Err(ConfigError::TooFewInputs(cli.inputs.len()));
        }
        let output = cli.output.ok_or(ConfigError::MissingOutput)?;

        let mut database_mapping = BTreeMap::new();
        for mapping in &cli.db_mappings {
            let (path, database) = parse_db_mapping(mapping)?;
            database_mapping.insert(path, database);
        }

        let config = MergeConfig {
            name: cli.name.unwrap_or_default(),
            description: cli.description.unwrap_or_default(),
            default_schema: cli.default_schema,
            use_brackets: cli.use_brackets,
            extract_view_relations: cli.extract_view_relations,
            database_mapping,
        }
        .with_defaults_for(cli.inputs.len());

        Ok(Self {
            inputs: cli.inputs,
            output,
            validate: cli.validate,
            config,
        })
    }

    /// Source identities as passed on the command line.
    pub fn sources(&self) -> Vec<String> {
        self.inputs.iter().map(|p| p.to_string_lossy().into_owned()).collect()
    }
}

/// Split `filepath:dbname` on its last `:` so drive letters stay in the path.
pub fn parse_db_mapping(mapping: &str) -> Result<(String, String), ConfigError> {
    match mapping.rsplit_once(':') {
        Some((path, database)) if !path.is_empty() && !database.is_empty() => {
            Ok((path.to_string(), database.to_string()))
        }
        _ => Err(ConfigError::InvalidMapping(mapping.to_string())),
    }
}
