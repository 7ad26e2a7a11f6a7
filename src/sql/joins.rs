//! JOIN clause extraction from view and procedure definitions.
//!
//! Recognizes `[LEFT|RIGHT|INNER|OUTER|CROSS|FULL] [OUTER] JOIN <table> [AS] <alias> ON <condition>`.
//! The alias is mandatory. Every `alias.column = alias.column` pair in the
//! condition becomes its own fact; composite keys are not grouped.
//! Anything unrecognized yields no facts rather than an error.

use std::fmt;

use super::lexer::{Lexer, Spanned, Token};
use crate::identifier::NameContext;

/// Longest ON condition shown in a relation definition before truncation.
const MAX_CONDITION_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    /// Classify by case-insensitive substring search over the clause text.
    pub fn classify(clause: &str) -> Self {
        let upper = clause.to_uppercase();
        if upper.contains("LEFT") {
            Self::Left
        } else if upper.contains("RIGHT") {
            Self::Right
        } else if upper.contains("FULL") {
            Self::Full
        } else {
            Self::Inner
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relation discovered from a JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRelation {
    pub from_table: String,
    pub from_columns: Vec<String>,
    pub to_table: String,
    pub to_columns: Vec<String>,
    pub join_type: JoinType,
    /// ON condition with whitespace collapsed.
    pub on_condition: String,
}

impl JoinRelation {
    /// `"[LEFT JOIN] o.customer_id = c.id"`, condition truncated to 100 characters.
    pub fn display_def(&self) -> String {
        let condition = if self.on_condition.chars().count() > MAX_CONDITION_CHARS {
            let head: String = self.on_condition.chars().take(MAX_CONDITION_CHARS).collect();
            format!("{}...", head)
        } else {
            self.on_condition.clone()
        };
        format!("[{} JOIN] {}", self.join_type, condition)
    }
}

/// Extracts join facts from SQL definition text.
pub trait JoinExtractor {
    fn extract(&self, sql: &str, source_table: &str, names: &NameContext<'_>) -> Vec<JoinRelation>;
}

/// Token-based extractor built on the SQL lexer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenJoinExtractor;

impl JoinExtractor for TokenJoinExtractor {
    fn extract(&self, sql: &str, source_table: &str, names: &NameContext<'_>) -> Vec<JoinRelation> {
        if sql.is_empty() {
            return Vec::new();
        }

        let tokens = Lexer::new(sql).tokenize();
        let mut scanner = JoinScanner {
            sql,
            tokens: &tokens,
            pos: 0,
        };

        let mut relations = Vec::new();
        while let Some(clause) = scanner.next_clause() {
            let to_table = names.standardize(&clause.table);
            let join_type = JoinType::classify(clause.text);
            let on_condition = collapse_whitespace(clause.condition);

            for (from_column, to_column) in clause.pairs {
                relations.push(JoinRelation {
                    from_table: source_table.to_string(),
                    from_columns: vec![from_column],
                    to_table: to_table.clone(),
                    to_columns: vec![to_column],
                    join_type,
                    on_condition: on_condition.clone(),
                });
            }
        }
        relations
    }
}

/// Extract joins with the default extractor.
pub fn extract_joins(sql: &str, source_table: &str, names: &NameContext<'_>) -> Vec<JoinRelation> {
    TokenJoinExtractor.extract(sql, source_table, names)
}

struct JoinClause<'s> {
    table: String,
    /// Join keywords through the end of the condition.
    text: &'s str,
    condition: &'s str,
    pairs: Vec<(String, String)>,
}

struct JoinScanner<'s, 't> {
    sql: &'s str,
    tokens: &'t [Spanned],
    pos: usize,
}

impl<'s, 't> JoinScanner<'s, 't> {
    fn token(&self, pos: usize) -> &Token {
        self.tokens.get(pos).map_or(&Token::Eof, |s| &s.token)
    }

    fn next_clause(&mut self) -> Option<JoinClause<'s>> {
        while self.pos < self.tokens.len() {
            let join_pos = self.pos;
            self.pos += 1;
            if self.token(join_pos) != &Token::Join {
                continue;
            }
            if let Some(clause) = self.clause_at(join_pos) {
                return Some(clause);
            }
        }
        None
    }

    /// Index of the first keyword of `[type] [OUTER] JOIN`.
    fn clause_start(&self, join_pos: usize) -> usize {
        let mut start = join_pos;
        if start > 0 && self.token(start - 1) == &Token::Outer {
            start -= 1;
        }
        if start > 0
            && matches!(
                self.token(start - 1),
                Token::Left | Token::Right | Token::Inner | Token::Outer | Token::Cross | Token::Full
            )
        {
            start -= 1;
        }
        start
    }

    fn clause_at(&mut self, join_pos: usize) -> Option<JoinClause<'s>> {
        let mut pos = join_pos + 1;

        let table = self.read_table_name(&mut pos)?;

        if self.token(pos) == &Token::As {
            pos += 1;
        }
        let Token::Ident(_alias) = self.token(pos) else {
            return None;
        };
        pos += 1;

        if self.token(pos) != &Token::On {
            return None;
        }
        pos += 1;

        let condition_start = pos;
        while !self.token(pos).ends_condition() {
            pos += 1;
        }
        if pos == condition_start {
            return None;
        }
        // Resume at the terminator so a following join keyword is seen again.
        self.pos = pos;

        let sql = self.sql;
        let tokens = self.tokens;
        let start = tokens[self.clause_start(join_pos)].start;
        let end = tokens[pos - 1].end;

        Some(JoinClause {
            table,
            text: &sql[start..end],
            condition: &sql[tokens[condition_start].start..end],
            pairs: equality_pairs(&tokens[condition_start..pos]),
        })
    }

    /// `name`, `schema.name`, `db.schema.name`, `db..name`, each part optionally delimited.
    fn read_table_name(&self, pos: &mut usize) -> Option<String> {
        let Token::Ident(first) = self.token(*pos) else {
            return None;
        };
        let mut name = first.clone();
        *pos += 1;

        while self.token(*pos) == &Token::Dot {
            let mut dots = 0;
            while self.token(*pos) == &Token::Dot {
                dots += 1;
                *pos += 1;
            }
            let Token::Ident(part) = self.token(*pos) else {
                return None;
            };
            name.push_str(&".".repeat(dots));
            name.push_str(part);
            *pos += 1;
        }
        Some(name)
    }
}

/// Non-overlapping `alias.column = alias.column` matches, left to right.
fn equality_pairs(condition: &[Spanned]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut i = 0;
    while i < condition.len() {
        let window: Vec<&Token> = condition[i..].iter().take(7).map(|s| &s.token).collect();
        if let [
            Token::Ident(_),
            Token::Dot,
            Token::Ident(left),
            Token::Eq,
            Token::Ident(_),
            Token::Dot,
            Token::Ident(right),
        ] = window.as_slice()
        {
            pairs.push((left.clone(), right.clone()));
            i += 7;
        } else {
            i += 1;
        }
    }
    pairs
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
