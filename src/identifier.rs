//! Qualified object names: `Table`, `Schema.Table`, `Database.Schema.Table`
//! and their bracketed forms.

use std::fmt;

/// Parsed components of a qualified name. Any component may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualifiedName {
    pub database: String,
    pub schema: String,
    pub table: String,
}

impl QualifiedName {
    /// Parse a possibly bracketed, dot-separated name.
    ///
    /// Brackets are removed before splitting. Names with more than three
    /// parts keep the last three (a linked-server prefix is dropped).
    pub fn parse(name: &str) -> Self {
        let normalized = normalize_brackets(name);
        let parts: Vec<&str> = normalized.split('.').collect();

        match parts.as_slice() {
            [table] => Self {
                table: table.to_string(),
                ..Self::default()
            },
            [schema, table] => Self {
                schema: schema.to_string(),
                table: table.to_string(),
                ..Self::default()
            },
            [.., database, schema, table] => Self {
                database: database.to_string(),
                schema: schema.to_string(),
                table: table.to_string(),
            },
            [] => Self::default(),
        }
    }

    /// Rebuild the name, optionally bracketing each component.
    pub fn to_name(&self, use_brackets: bool) -> String {
        build_qualified_name(&self.table, &self.schema, &self.database, use_brackets)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_name(false))
    }
}

/// Remove every `[` and `]` from an identifier.
/// `[Database].[Schema].[Table]` -> `Database.Schema.Table`
pub fn normalize_brackets(identifier: &str) -> String {
    identifier.chars().filter(|c| !matches!(c, '[' | ']')).collect()
}

/// Wrap an identifier in brackets unless it already is.
pub fn bracket_identifier(identifier: &str) -> String {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return String::new();
    }
    if identifier.starts_with('[') && identifier.ends_with(']') {
        return identifier.to_string();
    }
    format!("[{}]", identifier)
}

/// Join the non-empty parts in database, schema, table order.
pub fn build_qualified_name(table: &str, schema: &str, database: &str, use_brackets: bool) -> String {
    [database, schema, table]
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| {
            if use_brackets {
                bracket_identifier(part)
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Standardize a table name to `Database.Schema.Table` (or its bracketed form),
/// filling missing components from the defaults.
pub fn standardize_table_name(
    name: &str,
    default_db: &str,
    default_schema: &str,
    use_brackets: bool,
) -> String {
    if name.is_empty() {
        return String::new();
    }

    let parsed = QualifiedName::parse(name);
    let database = if parsed.database.is_empty() {
        default_db
    } else {
        &parsed.database
    };
    let schema = if parsed.schema.is_empty() {
        default_schema
    } else {
        &parsed.schema
    };

    build_qualified_name(&parsed.table, schema, database, use_brackets)
}

/// Defaults applied when standardizing names from one source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameContext<'a> {
    pub database: &'a str,
    pub schema: &'a str,
    pub use_brackets: bool,
}

impl<'a> NameContext<'a> {
    pub fn new(database: &'a str, schema: &'a str, use_brackets: bool) -> Self {
        Self {
            database,
            schema,
            use_brackets,
        }
    }

    pub fn standardize(&self, name: &str) -> String {
        standardize_table_name(name, self.database, self.schema, self.use_brackets)
    }

    /// Standardize, keeping the name's own database component when it has one.
    pub fn standardize_keeping_database(&self, name: &str) -> String {
        let explicit = QualifiedName::parse(name).database;
        let database = if explicit.is_empty() {
            self.database
        } else {
            explicit.as_str()
        };
        standardize_table_name(name, database, self.schema, self.use_brackets)
    }
}

/// Derive a database name from a schema file path.
/// `dv_schema.json` -> `DV`, `my-database-schema.json` -> `MY-DATABASE`
pub fn extract_database_name(path: &str) -> String {
    let filename = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let stem = match filename.rfind('.') {
        Some(idx) => &filename[..idx],
        None => filename,
    };
    let stem = stem.strip_suffix("_schema").unwrap_or(stem);
    let stem = stem.strip_suffix("-schema").unwrap_or(stem);

    stem.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qn(database: &str, schema: &str, table: &str) -> QualifiedName {
        QualifiedName {
            database: database.to_string(),
            schema: schema.to_string(),
            table: table.to_string(),
        }
    }

    #[test]
    fn test_parse_qualified_name() {
        assert_eq!(QualifiedName::parse("Users"), qn("", "", "Users"));
        assert_eq!(QualifiedName::parse("dbo.Users"), qn("", "dbo", "Users"));
        assert_eq!(
            QualifiedName::parse("DV.dbo.Hub_Customer"),
            qn("DV", "dbo", "Hub_Customer")
        );
    }

    #[test]
    fn test_parse_bracketed_matches_plain() {
        for (bracketed, plain) in [
            ("[Users]", "Users"),
            ("[dbo].[Users]", "dbo.Users"),
            ("[DV].[dbo].[Hub_Customer]", "DV.dbo.Hub_Customer"),
        ] {
            assert_eq!(QualifiedName::parse(bracketed), QualifiedName::parse(plain));
        }
    }

    #[test]
    fn test_parse_more_than_three_parts() {
        assert_eq!(
            QualifiedName::parse("SRV.DV.dbo.Orders"),
            qn("DV", "dbo", "Orders")
        );
    }

    #[test]
    fn test_normalize_brackets() {
        assert_eq!(normalize_brackets("Users"), "Users");
        assert_eq!(normalize_brackets("[Users]"), "Users");
        assert_eq!(normalize_brackets("[DV].[dbo].[Users]"), "DV.dbo.Users");
        assert_eq!(normalize_brackets("]][x["), "x");

        for input in ["[a].[b]", "[[nested]]", "plain", ""] {
            let once = normalize_brackets(input);
            assert_eq!(normalize_brackets(&once), once);
            assert!(!once.contains('[') && !once.contains(']'));
        }
    }

    #[test]
    fn test_bracket_identifier() {
        assert_eq!(bracket_identifier("MyTable"), "[MyTable]");
        assert_eq!(bracket_identifier("[MyTable]"), "[MyTable]");
        assert_eq!(bracket_identifier(""), "");
        assert_eq!(bracket_identifier("  MyTable  "), "[MyTable]");

        for input in ["a", "[b]", "  c ", ""] {
            let once = bracket_identifier(input);
            assert_eq!(bracket_identifier(&once), once);
        }
    }

    #[test]
    fn test_build_qualified_name() {
        assert_eq!(build_qualified_name("Users", "", "", false), "Users");
        assert_eq!(build_qualified_name("Users", "", "", true), "[Users]");
        assert_eq!(build_qualified_name("Users", "dbo", "", false), "dbo.Users");
        assert_eq!(build_qualified_name("Users", "dbo", "DV", true), "[DV].[dbo].[Users]");
        assert_eq!(build_qualified_name("Users", "", "DV", false), "DV.Users");
    }

    #[test]
    fn test_standardize_table_name() {
        assert_eq!(standardize_table_name("Users", "DV", "dbo", true), "[DV].[dbo].[Users]");
        assert_eq!(
            standardize_table_name("sales.Orders", "DV", "dbo", true),
            "[DV].[sales].[Orders]"
        );
        assert_eq!(
            standardize_table_name("DM.sales.Orders", "DV", "dbo", true),
            "[DM].[sales].[Orders]"
        );
        assert_eq!(
            standardize_table_name("[dbo].[Users]", "DV", "dbo", true),
            "[DV].[dbo].[Users]"
        );
        assert_eq!(standardize_table_name("Users", "DV", "dbo", false), "DV.dbo.Users");
        assert_eq!(standardize_table_name("", "DV", "dbo", true), "");
    }

    #[test]
    fn test_extract_database_name() {
        assert_eq!(extract_database_name("dv_schema.json"), "DV");
        assert_eq!(extract_database_name("my-database-schema.json"), "MY-DATABASE");
        assert_eq!(extract_database_name("warehouse.json"), "WAREHOUSE");
        assert_eq!(extract_database_name("/data/schemas/dm_schema.json"), "DM");
        assert_eq!(extract_database_name("C:\\schemas\\sa_schema.json"), "SA");
        assert_eq!(extract_database_name("raw.v2_schema.json"), "RAW.V2");
    }

    #[test]
    fn test_name_context_keeps_explicit_database() {
        let ctx = NameContext::new("DV", "dbo", true);
        assert_eq!(ctx.standardize("Orders"), "[DV].[dbo].[Orders]");
        assert_eq!(ctx.standardize_keeping_database("DM.dbo.Dim_Date"), "[DM].[dbo].[Dim_Date]");
        assert_eq!(ctx.standardize_keeping_database("sales.Orders"), "[DV].[sales].[Orders]");
    }

    #[test]
    fn test_display() {
        assert_eq!(QualifiedName::parse("[DV].[dbo].[Users]").to_string(), "DV.dbo.Users");
    }
}
