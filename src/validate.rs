//! Referential consistency checks over a merged schema.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::identifier::QualifiedName;
use crate::schema::{Relation, Schema};

/// Which end of a relation points at a missing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Child,
    Parent,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Child => "child",
            Side::Parent => "parent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenRelation {
    /// `"<table> -> <parent_table>"`
    pub relation: String,
    pub missing: String,
    pub side: Side,
    pub is_virtual: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseCounts {
    pub tables: usize,
    pub relations: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub total_tables: usize,
    pub total_relations: usize,
    pub fk_relations: usize,
    pub virtual_relations: usize,
    /// Database components found on tables and relation endpoints, sorted.
    pub databases: Vec<String>,
    /// Tables and relations (by child table) per database.
    pub per_database: BTreeMap<String, DatabaseCounts>,
    /// Relation endpoints with no matching table, sorted.
    pub missing_tables: Vec<String>,
    /// In relation order, child before parent.
    pub broken_relations: Vec<BrokenRelation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.broken_relations.is_empty()
    }
}

/// Check that every relation endpoint names a table of the schema.
pub fn validate_merged_schema(schema: &Schema) -> ValidationReport {
    let table_names: HashSet<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
    let mut databases: BTreeSet<String> = BTreeSet::new();
    let mut per_database: BTreeMap<String, DatabaseCounts> = BTreeMap::new();
    let mut missing_tables: BTreeSet<String> = BTreeSet::new();
    let mut broken_relations = Vec::new();

    for table in &schema.tables {
        let database = QualifiedName::parse(&table.name).database;
        if !database.is_empty() {
            per_database.entry(database.clone()).or_default().tables += 1;
            databases.insert(database);
        }
    }

    for relation in &schema.relations {
        let child_db = QualifiedName::parse(&relation.table).database;
        let parent_db = QualifiedName::parse(&relation.parent_table).database;
        if !child_db.is_empty() {
            per_database.entry(child_db.clone()).or_default().relations += 1;
            databases.insert(child_db);
        }
        if !parent_db.is_empty() {
            databases.insert(parent_db);
        }

        for (name, side) in [
            (&relation.table, Side::Child),
            (&relation.parent_table, Side::Parent),
        ] {
            if !table_names.contains(name.as_str()) {
                missing_tables.insert(name.clone());
                broken_relations.push(broken(relation, name, side));
            }
        }
    }

    let virtual_relations = schema.relations.iter().filter(|r| r.is_virtual).count();

    ValidationReport {
        total_tables: schema.tables.len(),
        total_relations: schema.relations.len(),
        fk_relations: schema.relations.len() - virtual_relations,
        virtual_relations,
        databases: databases.into_iter().collect(),
        per_database,
        missing_tables: missing_tables.into_iter().collect(),
        broken_relations,
    }
}

fn broken(relation: &Relation, missing: &str, side: Side) -> BrokenRelation {
    BrokenRelation {
        relation: format!("{} -> {}", relation.table, relation.parent_table),
        missing: missing.to_string(),
        side,
        is_virtual: relation.is_virtual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Table;

    fn schema() -> Schema {
        let table = |name: &str| Table {
            name: name.to_string(),
            ..Table::default()
        };
        let relation = |table: &str, parent: &str, is_virtual: bool| Relation {
            table: table.to_string(),
            columns: vec!["id".to_string()],
            parent_table: parent.to_string(),
            parent_columns: vec!["id".to_string()],
            is_virtual,
            ..Relation::default()
        };

        Schema {
            tables: vec![
                table("[DV].[dbo].[Orders]"),
                table("[DV].[dbo].[Customers]"),
                table("[DM].[dbo].[Dim_Date]"),
            ],
            relations: vec![
                relation("[DV].[dbo].[Orders]", "[DV].[dbo].[Customers]", false),
                relation("[DV].[dbo].[Orders]", "[SA].[dbo].[Products]", true),
                relation("[XX].[dbo].[Ghost]", "[DM].[dbo].[Dim_Date]", false),
            ],
            ..Schema::default()
        }
    }

    #[test]
    fn test_counts() {
        let report = validate_merged_schema(&schema());

        assert_eq!(report.total_tables, 3);
        assert_eq!(report.total_relations, 3);
        assert_eq!(report.fk_relations, 2);
        assert_eq!(report.virtual_relations, 1);
        assert_eq!(report.databases, vec!["DM", "DV", "SA", "XX"]);
        assert_eq!(
            report.per_database.get("DV"),
            Some(&DatabaseCounts { tables: 2, relations: 2 })
        );
        assert_eq!(
            report.per_database.get("DM"),
            Some(&DatabaseCounts { tables: 1, relations: 0 })
        );
    }

    #[test]
    fn test_broken_relations() {
        let report = validate_merged_schema(&schema());

        assert!(!report.is_valid());
        assert_eq!(report.missing_tables, vec!["[SA].[dbo].[Products]", "[XX].[dbo].[Ghost]"]);
        assert_eq!(report.broken_relations.len(), 2);

        let parent_missing = &report.broken_relations[0];
        assert_eq!(parent_missing.relation, "[DV].[dbo].[Orders] -> [SA].[dbo].[Products]");
        assert_eq!(parent_missing.missing, "[SA].[dbo].[Products]");
        assert_eq!(parent_missing.side, Side::Parent);
        assert!(parent_missing.is_virtual);

        let child_missing = &report.broken_relations[1];
        assert_eq!(child_missing.side, Side::Child);
        assert!(!child_missing.is_virtual);
    }

    #[test]
    fn test_valid_schema() {
        let mut schema = schema();
        schema.relations.truncate(1);
        let before = schema.clone();

        let report = validate_merged_schema(&schema);

        assert!(report.is_valid());
        assert!(report.missing_tables.is_empty());
        assert_eq!(schema, before);
    }
}
