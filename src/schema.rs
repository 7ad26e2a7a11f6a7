//! Schema document model (tbls JSON layout).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const BASE_TABLE: &str = "BASE TABLE";
pub const VIEW: &str = "VIEW";
pub const MATERIALIZED_VIEW: &str = "MATERIALIZED VIEW";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid schema document: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Failed to render schema document: {0}")]
    Render(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<Function>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<Driver>,
    /// Document keys this model does not interpret (labels, viewpoints, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Schema {
    /// The driver's declared current schema, if any.
    pub fn current_schema(&self) -> Option<&str> {
        self.driver
            .as_ref()
            .and_then(|d| d.meta.as_ref())
            .map(|m| m.current_schema.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(rename = "type", default)]
    pub typ: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub def: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_tables: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Table {
    pub fn is_view(&self) -> bool {
        self.typ == VIEW || self.typ == MATERIALIZED_VIEW
    }

    /// Whether the table's definition may carry joins worth scanning.
    pub fn has_scannable_def(&self) -> bool {
        matches!(self.typ.as_str(), BASE_TABLE | VIEW | MATERIALIZED_VIEW) && !self.def.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type", default)]
    pub typ: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    #[serde(default)]
    pub def: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    #[serde(rename = "type", default)]
    pub typ: String,
    #[serde(default)]
    pub def: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_table: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub table: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub cardinality: Cardinality,
    pub parent_table: String,
    #[serde(default)]
    pub parent_columns: Vec<String>,
    #[serde(default)]
    pub parent_cardinality: Cardinality,
    #[serde(default)]
    pub def: String,
    #[serde(rename = "virtual", default)]
    pub is_virtual: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Multiplicity of one side of a relation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    ZeroOrOne,
    ExactlyOne,
    ZeroOrMore,
    OneOrMore,
    #[default]
    #[serde(rename = "")]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub return_type: String,
    #[serde(default)]
    pub arguments: String,
    #[serde(rename = "type", default)]
    pub typ: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub database_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<DriverMeta>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_schema: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub dict: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parse a schema document from JSON bytes.
pub fn parse_document(bytes: &[u8]) -> Result<Schema, DocumentError> {
    serde_json::from_slice(bytes).map_err(DocumentError::Parse)
}

/// Render a schema document as indented JSON with a trailing newline.
pub fn render_document(schema: &Schema) -> Result<Vec<u8>, DocumentError> {
    let mut bytes = serde_json::to_vec_pretty(schema).map_err(DocumentError::Render)?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "name": "dv",
        "desc": "",
        "tables": [
            {
                "name": "dbo.Orders",
                "type": "BASE TABLE",
                "columns": [
                    {"name": "id", "type": "int", "nullable": false, "extra_def": "IDENTITY(1,1)",
                     "labels": [{"name": "key", "virtual": false}]}
                ],
                "constraints": [
                    {"name": "PK_Orders", "type": "PRIMARY KEY", "def": "PRIMARY KEY (id)",
                     "table": "dbo.Orders", "columns": ["id"], "clustered": true}
                ],
                "labels": [{"name": "core", "virtual": true}]
            }
        ],
        "relations": [
            {
                "table": "dbo.Orders",
                "columns": ["customer_id"],
                "cardinality": "zero_or_more",
                "parent_table": "dbo.Customers",
                "parent_columns": ["id"],
                "parent_cardinality": "exactly_one",
                "def": "FOREIGN KEY (customer_id) REFERENCES Customers(id)",
                "virtual": false
            }
        ],
        "driver": {"name": "sqlserver", "meta": {"current_schema": "\"sales\"", "collation": "Latin1_General"}}
    }"#;

    #[test]
    fn test_parse_document() {
        let schema = parse_document(DOC.as_bytes()).unwrap();
        assert_eq!(schema.tables.len(), 1);
        assert_eq!(schema.tables[0].typ, BASE_TABLE);
        assert_eq!(schema.relations[0].cardinality, Cardinality::ZeroOrMore);
        assert_eq!(schema.relations[0].parent_cardinality, Cardinality::ExactlyOne);
        assert!(!schema.relations[0].is_virtual);
        assert_eq!(schema.current_schema(), Some("\"sales\""));
    }

    #[test]
    fn test_unknown_fields_survive_rendering() {
        let schema = parse_document(DOC.as_bytes()).unwrap();
        let table = &schema.tables[0];
        assert_eq!(table.columns[0].extra["extra_def"], "IDENTITY(1,1)");
        assert_eq!(table.constraints[0].extra["clustered"], true);

        let rendered = String::from_utf8(render_document(&schema).unwrap()).unwrap();
        let reparsed = parse_document(rendered.as_bytes()).unwrap();
        assert_eq!(reparsed, schema);
        assert!(rendered.contains("\"labels\""));
        assert!(rendered.contains("\"extra_def\": \"IDENTITY(1,1)\""));
        assert!(rendered.contains("\"clustered\": true"));
        assert!(rendered.contains("\"collation\": \"Latin1_General\""));
        assert!(rendered.ends_with("}\n"));
        assert!(rendered.contains("\n  \"tables\""));
    }

    #[test]
    fn test_unknown_cardinality_is_empty_string() {
        let rel = Relation {
            table: "a".to_string(),
            parent_table: "b".to_string(),
            ..Relation::default()
        };
        let json = serde_json::to_value(&rel).unwrap();
        assert_eq!(json["cardinality"], "");
        assert_eq!(json["virtual"], false);
    }

    #[test]
    fn test_invalid_document() {
        let err = parse_document(b"{ not json").unwrap_err();
        assert!(matches!(err, DocumentError::Parse(_)));
    }

    #[test]
    fn test_scannable_def() {
        let view = Table {
            name: "v".to_string(),
            typ: VIEW.to_string(),
            def: "SELECT 1".to_string(),
            ..Table::default()
        };
        assert!(view.has_scannable_def());
        assert!(view.is_view());

        let proc = Table {
            typ: "PROCEDURE".to_string(),
            ..view.clone()
        };
        assert!(!proc.has_scannable_def());
    }
}
