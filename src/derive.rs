//! Virtual relations derived from table and view definitions.

use crate::identifier::NameContext;
use crate::schema::{Cardinality, Relation, Table};
use crate::sql::{JoinExtractor, JoinRelation, JoinType};

/// Child and parent cardinality implied by a join type.
pub fn join_cardinality(join_type: JoinType) -> (Cardinality, Cardinality) {
    match join_type {
        JoinType::Left => (Cardinality::ZeroOrOne, Cardinality::ZeroOrMore),
        JoinType::Right => (Cardinality::ZeroOrMore, Cardinality::ZeroOrOne),
        JoinType::Inner | JoinType::Full => (Cardinality::ExactlyOne, Cardinality::ZeroOrMore),
    }
}

impl From<&JoinRelation> for Relation {
    fn from(join: &JoinRelation) -> Self {
        let (cardinality, parent_cardinality) = join_cardinality(join.join_type);
        Relation {
            table: join.from_table.clone(),
            columns: join.from_columns.clone(),
            cardinality,
            parent_table: join.to_table.clone(),
            parent_columns: join.to_columns.clone(),
            parent_cardinality,
            def: join.display_def(),
            is_virtual: true,
            ..Relation::default()
        }
    }
}

/// Extract virtual relations from the definitions of base tables, views and
/// materialized views. Table names are expected to be standardized already.
pub fn derive_relations(
    tables: &[Table],
    extractor: &dyn JoinExtractor,
    names: &NameContext<'_>,
) -> Vec<Relation> {
    tables
        .iter()
        .filter(|t| t.has_scannable_def())
        .flat_map(|table| {
            let joins = extractor.extract(&table.def, &table.name, names);
            if !joins.is_empty() {
                log::debug!("{}: {} join(s) found in definition", table.name, joins.len());
            }
            joins.iter().map(Relation::from).collect::<Vec<_>>()
        })
        .collect()
}
