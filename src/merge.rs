//! Merging several schema documents into one cross-database schema.

use thiserror::Error;

use crate::config::MergeConfig;
use crate::dedup::deduplicate_relations;
use crate::derive::derive_relations;
use crate::identifier::{NameContext, QualifiedName, extract_database_name};
use crate::loader::{LoadError, SchemaLoader};
use crate::repair::{RelationLinker, RepairError, SchemaRepair};
use crate::schema::{Constraint, Function, Index, Relation, Schema, Table};
use crate::sql::{JoinExtractor, TokenJoinExtractor};

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("failed to load schema from {source_id}: {source}")]
    Load {
        source_id: String,
        source: LoadError,
    },
    #[error("failed to repair merged schema: {0}")]
    Repair(#[from] RepairError),
}

/// Counters collected while merging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub total_tables: usize,
    pub total_views: usize,
    /// Relations declared in the source documents.
    pub total_relations: usize,
    pub total_functions: usize,
    /// Database name assigned to each source, in input order.
    pub databases: Vec<String>,
    pub cross_db_relations: usize,
    pub extracted_relations: usize,
    pub deduplicated_count: usize,
}

/// Merge documents with the default join extractor and repair step.
pub fn merge_schemas(
    sources: &[String],
    loader: &dyn SchemaLoader,
    config: &MergeConfig,
) -> Result<(Schema, MergeStats), MergeError> {
    Merger::new(config).merge(sources, loader)
}

pub struct Merger<'a> {
    config: &'a MergeConfig,
    extractor: &'a dyn JoinExtractor,
    repair: &'a dyn SchemaRepair,
}

impl<'a> Merger<'a> {
    pub fn new(config: &'a MergeConfig) -> Self {
        Self {
            config,
            extractor: &TokenJoinExtractor,
            repair: &RelationLinker,
        }
    }

    pub fn with_extractor(mut self, extractor: &'a dyn JoinExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_repair(mut self, repair: &'a dyn SchemaRepair) -> Self {
        self.repair = repair;
        self
    }

    /// Load and merge `sources` in order. Any load or repair failure aborts
    /// the whole merge.
    pub fn merge(
        &self,
        sources: &[String],
        loader: &dyn SchemaLoader,
    ) -> Result<(Schema, MergeStats), MergeError> {
        let config = self.config.clone().with_defaults_for(sources.len());
        let mut merged = Schema {
            name: config.name,
            desc: config.description,
            ..Schema::default()
        };
        let mut stats = MergeStats::default();

        for source in sources {
            let document = loader.load(source).map_err(|source_err| MergeError::Load {
                source_id: source.clone(),
                source: source_err,
            })?;
            self.merge_document(&mut merged, &mut stats, source, document);
        }

        stats.deduplicated_count = dedup_in_place(&mut merged);

        self.repair.repair(&mut merged)?;
        // Relinked endpoints can make two distinct keys equal.
        stats.deduplicated_count += dedup_in_place(&mut merged);

        if stats.deduplicated_count > 0 {
            log::info!("Removed {} duplicate relation(s)", stats.deduplicated_count);
        }

        Ok((merged, stats))
    }

    fn merge_document(&self, merged: &mut Schema, stats: &mut MergeStats, source: &str, document: Schema) {
        let database = match self.config.mapped_database(source) {
            Some(name) => name.to_string(),
            None => extract_database_name(source),
        };
        let schema_name = document
            .current_schema()
            .map(|s| s.trim_matches('"'))
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.config.default_schema)
            .to_string();
        let names = NameContext::new(&database, &schema_name, self.config.use_brackets);

        log::info!("Merging {} as database {} (schema {})", source, database, schema_name);

        let tables: Vec<Table> = document
            .tables
            .iter()
            .map(|t| standardize_table(t, &names))
            .collect();
        let relations: Vec<Relation> = document
            .relations
            .iter()
            .map(|r| standardize_relation(r, &names))
            .collect();
        let derived = if self.config.extract_view_relations {
            derive_relations(&tables, self.extractor, &names)
        } else {
            Vec::new()
        };
        let functions: Vec<Function> = document
            .functions
            .iter()
            .map(|f| Function {
                name: names.standardize(&f.name),
                ..f.clone()
            })
            .collect();

        let cross_db = relations.iter().filter(|r| is_cross_database(r)).count();
        log::debug!(
            "{}: {} table(s), {} relation(s), {} extracted, {} cross-database",
            source,
            tables.len(),
            relations.len(),
            derived.len(),
            cross_db
        );

        stats.databases.push(database.clone());
        stats.total_tables += tables.len();
        stats.total_views += tables.iter().filter(|t| t.is_view()).count();
        stats.total_relations += relations.len();
        stats.extracted_relations += derived.len();
        stats.total_functions += functions.len();
        stats.cross_db_relations += cross_db;

        merged.tables.extend(tables);
        merged.relations.extend(relations);
        merged.relations.extend(derived);
        merged.functions.extend(functions);
        if merged.driver.is_none() {
            merged.driver = document.driver;
        }
    }
}

/// Number of relations removed.
fn dedup_in_place(schema: &mut Schema) -> usize {
    let before = schema.relations.len();
    schema.relations = deduplicate_relations(std::mem::take(&mut schema.relations));
    before - schema.relations.len()
}

/// Both sides carry a database component and they differ.
pub fn is_cross_database(relation: &Relation) -> bool {
    let child = QualifiedName::parse(&relation.table).database;
    let parent = QualifiedName::parse(&relation.parent_table).database;
    !child.is_empty() && !parent.is_empty() && child != parent
}

fn standardize_table(table: &Table, names: &NameContext<'_>) -> Table {
    Table {
        name: names.standardize(&table.name),
        referenced_tables: table
            .referenced_tables
            .iter()
            .map(|r| names.standardize(r))
            .collect(),
        constraints: table
            .constraints
            .iter()
            .map(|c| standardize_constraint(c, names))
            .collect(),
        indexes: table
            .indexes
            .iter()
            .map(|i| Index {
                table: i.table.as_deref().map(|t| names.standardize(t)),
                ..i.clone()
            })
            .collect(),
        ..table.clone()
    }
}

fn standardize_constraint(constraint: &Constraint, names: &NameContext<'_>) -> Constraint {
    Constraint {
        table: constraint.table.as_deref().map(|t| names.standardize(t)),
        referenced_table: constraint
            .referenced_table
            .as_deref()
            .map(|t| names.standardize_keeping_database(t)),
        ..constraint.clone()
    }
}

fn standardize_relation(relation: &Relation, names: &NameContext<'_>) -> Relation {
    Relation {
        table: names.standardize_keeping_database(&relation.table),
        parent_table: names.standardize_keeping_database(&relation.parent_table),
        ..relation.clone()
    }
}
