//! Relation identity and duplicate resolution.

use std::collections::HashMap;

use crate::schema::Relation;

/// Identity of a relation: child table, child columns, parent table, parent columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationKey {
    pub table: String,
    pub columns: String,
    pub parent_table: String,
    pub parent_columns: String,
}

impl From<&Relation> for RelationKey {
    fn from(relation: &Relation) -> Self {
        Self {
            table: relation.table.clone(),
            columns: relation.columns.join(","),
            parent_table: relation.parent_table.clone(),
            parent_columns: relation.parent_columns.join(","),
        }
    }
}

/// Keep one relation per key, preferring declared constraints over virtual ones.
///
/// The first relation seen for a key is kept unless it is virtual and a later
/// one is not. Several virtual (or several declared) candidates resolve to the
/// earliest in input order. Survivors keep the position where their key first
/// appeared.
pub fn deduplicate_relations(relations: Vec<Relation>) -> Vec<Relation> {
    let mut slots: HashMap<RelationKey, usize> = HashMap::new();
    let mut kept: Vec<Relation> = Vec::with_capacity(relations.len());

    for relation in relations {
        let key = RelationKey::from(&relation);
        match slots.get(&key) {
            Some(&slot) => {
                if kept[slot].is_virtual && !relation.is_virtual {
                    kept[slot] = relation;
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(relation);
            }
        }
    }

    kept
}
