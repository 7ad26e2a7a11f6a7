//! SQL definition scanning for relations that are not declared as constraints.

mod joins;
mod lexer;

pub use joins::{JoinExtractor, JoinRelation, JoinType, TokenJoinExtractor, extract_joins};
