//! Post-merge relinking of relations to the tables they reference.

use std::collections::HashMap;

use thiserror::Error;

use crate::identifier::normalize_brackets;
use crate::schema::Schema;

#[derive(Debug, Error)]
pub enum RepairError {
    #[error("relation #{index} has no {side} table")]
    MissingEndpoint { index: usize, side: &'static str },
    #[error("relation {table} -> {parent_table} pairs {columns} column(s) with {parent_columns} parent column(s)")]
    ColumnMismatch {
        table: String,
        parent_table: String,
        columns: usize,
        parent_columns: usize,
    },
}

/// Relinks in-memory references after a merge.
pub trait SchemaRepair {
    fn repair(&self, schema: &mut Schema) -> Result<(), RepairError>;
}

/// Resolves relation endpoints to the table names present in the schema.
///
/// An endpoint that differs from a table name only by brackets or ASCII case
/// takes the table's spelling. Endpoints with no matching table are left for
/// the validator to report.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationLinker;

impl RelationLinker {
    fn fold(name: &str) -> String {
        normalize_brackets(name).to_ascii_lowercase()
    }
}

impl SchemaRepair for RelationLinker {
    fn repair(&self, schema: &mut Schema) -> Result<(), RepairError> {
        let mut folded: HashMap<String, &str> = HashMap::new();
        for table in &schema.tables {
            folded.entry(Self::fold(&table.name)).or_insert(&table.name);
        }

        let resolve = |name: &str| -> Option<String> {
            if schema.find_table(name).is_some() {
                return None;
            }
            folded.get(&Self::fold(name)).map(|t| t.to_string())
        };

        let mut relinked = Vec::new();
        for (index, relation) in schema.relations.iter().enumerate() {
            if relation.table.is_empty() {
                return Err(RepairError::MissingEndpoint { index, side: "child" });
            }
            if relation.parent_table.is_empty() {
                return Err(RepairError::MissingEndpoint { index, side: "parent" });
            }
            if relation.columns.len() != relation.parent_columns.len() {
                return Err(RepairError::ColumnMismatch {
                    table: relation.table.clone(),
                    parent_table: relation.parent_table.clone(),
                    columns: relation.columns.len(),
                    parent_columns: relation.parent_columns.len(),
                });
            }
            relinked.push((index, resolve(&relation.table), resolve(&relation.parent_table)));
        }

        for (index, table, parent_table) in relinked {
            let relation = &mut schema.relations[index];
            if let Some(name) = table {
                log::debug!("relinked {} to {}", relation.table, name);
                relation.table = name;
            }
            if let Some(name) = parent_table {
                log::debug!("relinked {} to {}", relation.parent_table, name);
                relation.parent_table = name;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Relation, Table};

    fn schema(tables: &[&str], relations: Vec<Relation>) -> Schema {
        Schema {
            tables: tables
                .iter()
                .map(|name| Table {
                    name: name.to_string(),
                    ..Table::default()
                })
                .collect(),
            relations,
            ..Schema::default()
        }
    }

    fn relation(table: &str, parent: &str) -> Relation {
        Relation {
            table: table.to_string(),
            columns: vec!["customer_id".to_string()],
            parent_table: parent.to_string(),
            parent_columns: vec!["id".to_string()],
            ..Relation::default()
        }
    }

    #[test]
    fn test_relinks_case_and_brackets() {
        let mut schema = schema(
            &["[DV].[dbo].[Orders]", "[DV].[dbo].[Customers]"],
            vec![relation("[DV].[dbo].[ORDERS]", "DV.dbo.customers")],
        );

        RelationLinker.repair(&mut schema).unwrap();

        assert_eq!(schema.relations[0].table, "[DV].[dbo].[Orders]");
        assert_eq!(schema.relations[0].parent_table, "[DV].[dbo].[Customers]");
    }

    #[test]
    fn test_unresolved_endpoints_are_kept() {
        let mut schema = schema(
            &["[DV].[dbo].[Orders]"],
            vec![relation("[DV].[dbo].[Orders]", "[DM].[dbo].[Customers]")],
        );

        RelationLinker.repair(&mut schema).unwrap();

        assert_eq!(schema.relations[0].parent_table, "[DM].[dbo].[Customers]");
    }

    #[test]
    fn test_rejects_malformed_relations() {
        let mut missing = schema(&[], vec![relation("", "[DV].[dbo].[Customers]")]);
        assert!(matches!(
            RelationLinker.repair(&mut missing),
            Err(RepairError::MissingEndpoint { index: 0, side: "child" })
        ));

        let mut uneven = relation("a", "b");
        uneven.parent_columns.push("tenant_id".to_string());
        let mut mismatched = schema(&["a", "b"], vec![uneven]);
        assert!(matches!(
            RelationLinker.repair(&mut mismatched),
            Err(RepairError::ColumnMismatch { columns: 1, parent_columns: 2, .. })
        ));
    }
}
