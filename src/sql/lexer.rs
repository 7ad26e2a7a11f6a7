//! SQL lexer for scanning view and procedure definitions.

use std::iter::Peekable;
use std::str::CharIndices;

/// SQL token types.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Join keywords
    Join,
    Left,
    Right,
    Inner,
    Outer,
    Cross,
    Full,
    As,
    On,

    // Clause keywords that end a join condition
    Where,
    Group,
    Order,
    Having,
    Union,

    // Identifiers and literals
    Ident(String),
    Str(String),
    Num(String),

    // Symbols
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,
    Eq,
    /// Any other operator (`<>`, `>=`, `+`, ...)
    Op(String),

    // End of input
    Eof,
}

impl Token {
    /// Keywords that may open a join clause.
    pub fn is_join_keyword(&self) -> bool {
        matches!(
            self,
            Token::Join
                | Token::Left
                | Token::Right
                | Token::Inner
                | Token::Outer
                | Token::Cross
                | Token::Full
        )
    }

    /// Tokens that end a join's ON condition.
    pub fn ends_condition(&self) -> bool {
        self.is_join_keyword()
            || matches!(
                self,
                Token::Where
                    | Token::Group
                    | Token::Order
                    | Token::Having
                    | Token::Union
                    | Token::Semicolon
                    | Token::Eof
            )
    }
}

/// A token with its byte range in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

/// SQL lexer.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    current: Option<(usize, char)>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.char_indices().peekable();
        let current = chars.next();
        Self {
            input,
            chars,
            current,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.current.map(|(_, c)| c)
    }

    /// Byte offset of the current character, or the input length at the end.
    fn offset(&self) -> usize {
        self.current.map_or(self.input.len(), |(i, _)| i)
    }

    fn advance(&mut self) {
        self.current = self.chars.next();
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current_char() {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance(); // skip /
        self.advance(); // skip *
        while let Some(c) = self.current_char() {
            self.advance();
            if c == '*' && self.current_char() == Some('/') {
                self.advance();
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.current_char() {
            if c.is_alphanumeric() || c == '_' || c == '$' || c == '#' || c == '@' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }
        ident
    }

    /// Read a delimited identifier or string; a doubled closing delimiter escapes itself.
    fn read_delimited(&mut self, close: char) -> String {
        self.advance(); // skip opening delimiter
        let mut text = String::new();
        while let Some(c) = self.current_char() {
            if c == close {
                if self.peek() == Some(close) {
                    text.push(c);
                    self.advance();
                    self.advance();
                } else {
                    self.advance(); // skip closing delimiter
                    break;
                }
            } else {
                text.push(c);
                self.advance();
            }
        }
        text
    }

    fn read_number(&mut self) -> String {
        let mut num = String::new();
        let mut has_dot = false;

        while let Some(c) = self.current_char() {
            if c.is_ascii_digit() {
                num.push(c);
                self.advance();
            } else if c == '.' && !has_dot && self.peek().is_some_and(|n| n.is_ascii_digit()) {
                has_dot = true;
                num.push(c);
                self.advance();
            } else {
                break;
            }
        }
        num
    }

    fn read_operator(&mut self, first: char) -> Token {
        self.advance();
        match (first, self.current_char()) {
            ('<', Some('>' | '=')) | ('>', Some('=')) | ('!', Some('=')) => {
                let second = self.current_char().unwrap_or_default();
                self.advance();
                Token::Op(format!("{}{}", first, second))
            }
            _ => Token::Op(first.to_string()),
        }
    }

    fn keyword_or_ident(&self, s: &str) -> Token {
        match s.to_uppercase().as_str() {
            "JOIN" => Token::Join,
            "LEFT" => Token::Left,
            "RIGHT" => Token::Right,
            "INNER" => Token::Inner,
            "OUTER" => Token::Outer,
            "CROSS" => Token::Cross,
            "FULL" => Token::Full,
            "AS" => Token::As,
            "ON" => Token::On,
            "WHERE" => Token::Where,
            "GROUP" => Token::Group,
            "ORDER" => Token::Order,
            "HAVING" => Token::Having,
            "UNION" => Token::Union,
            _ => Token::Ident(s.to_string()),
        }
    }

    pub fn next_token(&mut self) -> Spanned {
        loop {
            self.skip_whitespace();
            let start = self.offset();

            let token = match self.current_char() {
                None => Token::Eof,

                Some('-') if self.peek() == Some('-') => {
                    self.skip_line_comment();
                    continue;
                }
                Some('/') if self.peek() == Some('*') => {
                    self.skip_block_comment();
                    continue;
                }

                Some('(') => {
                    self.advance();
                    Token::LParen
                }
                Some(')') => {
                    self.advance();
                    Token::RParen
                }
                Some(',') => {
                    self.advance();
                    Token::Comma
                }
                Some(';') => {
                    self.advance();
                    Token::Semicolon
                }
                Some('.') => {
                    self.advance();
                    Token::Dot
                }
                Some('=') => {
                    self.advance();
                    Token::Eq
                }

                // SQL Server style [identifier]
                Some('[') => Token::Ident(self.read_delimited(']')),
                Some('"') => Token::Ident(self.read_delimited('"')),
                Some('`') => Token::Ident(self.read_delimited('`')),
                Some('\'') => Token::Str(self.read_delimited('\'')),

                Some(c) if c.is_ascii_digit() => Token::Num(self.read_number()),

                Some(c) if c.is_alphabetic() || c == '_' || c == '@' || c == '#' => {
                    let ident = self.read_identifier();
                    self.keyword_or_ident(&ident)
                }

                Some(c) => self.read_operator(c),
            };

            return Spanned {
                token,
                start,
                end: self.offset(),
            };
        }
    }

    /// Collect all tokens, ending with `Eof`.
    pub fn tokenize(&mut self) -> Vec<Spanned> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token();
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(sql: &str) -> Vec<Token> {
        Lexer::new(sql).tokenize().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_simple_join() {
        let toks = tokens("LEFT OUTER JOIN Customers c ON o.id = c.id");

        assert_eq!(toks[0], Token::Left);
        assert_eq!(toks[1], Token::Outer);
        assert_eq!(toks[2], Token::Join);
        assert_eq!(toks[3], Token::Ident("Customers".to_string()));
        assert_eq!(toks[4], Token::Ident("c".to_string()));
        assert_eq!(toks[5], Token::On);
        assert_eq!(toks[6], Token::Ident("o".to_string()));
        assert_eq!(toks[7], Token::Dot);
        assert_eq!(toks[9], Token::Eq);
        assert_eq!(toks.last(), Some(&Token::Eof));
    }

    #[test]
    fn test_delimited_identifiers() {
        let toks = tokens(r#"[dbo].[Order Items] "x" `y` [a]]b]"#);

        assert_eq!(toks[0], Token::Ident("dbo".to_string()));
        assert_eq!(toks[1], Token::Dot);
        assert_eq!(toks[2], Token::Ident("Order Items".to_string()));
        assert_eq!(toks[3], Token::Ident("x".to_string()));
        assert_eq!(toks[4], Token::Ident("y".to_string()));
        assert_eq!(toks[5], Token::Ident("a]b".to_string()));
    }

    #[test]
    fn test_bracketed_keyword_is_identifier() {
        assert_eq!(tokens("[Left]")[0], Token::Ident("Left".to_string()));
    }

    #[test]
    fn test_comments_and_strings() {
        let toks = tokens("-- LEFT JOIN x\nSELECT /* JOIN */ 'INNER JOIN' FROM t");

        assert_eq!(toks[0], Token::Ident("SELECT".to_string()));
        assert_eq!(toks[1], Token::Str("INNER JOIN".to_string()));
        assert_eq!(toks[2], Token::Ident("FROM".to_string()));
    }

    #[test]
    fn test_operators() {
        let toks = tokens("a <> b >= c = d");

        assert_eq!(toks[1], Token::Op("<>".to_string()));
        assert_eq!(toks[3], Token::Op(">=".to_string()));
        assert_eq!(toks[5], Token::Eq);
    }

    #[test]
    fn test_spans() {
        let sql = "JOIN  [dbo].T";
        let spanned = Lexer::new(sql).tokenize();

        assert_eq!((spanned[0].start, spanned[0].end), (0, 4));
        assert_eq!(&sql[spanned[1].start..spanned[1].end], "[dbo]");
        assert_eq!(spanned.last().map(|s| s.start), Some(sql.len()));
    }
}
