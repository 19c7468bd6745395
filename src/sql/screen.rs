//! Query text screening.
//!
//! Query text is spliced into `EXPLAIN (FORMAT JSON) <query>`, so it has to
//! be exactly one statement. Syntax checking stays with the engine: text
//! sqlparser cannot parse is still sent, as long as its tokens contain no
//! statement separator.

use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};
use tracing::debug;

use super::error::{ScreenError, ScreenResult};

/// Check that `sql` holds one statement and return it without trailing
/// semicolons or surrounding whitespace.
pub fn screen_query(sql: &str) -> ScreenResult<&str> {
    let sql = sql
        .trim()
        .trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    if sql.is_empty() {
        return Err(ScreenError::EmptyQuery);
    }

    let dialect = PostgreSqlDialect {};
    match Parser::parse_sql(&dialect, sql) {
        Ok(statements) if statements.len() > 1 => {
            Err(ScreenError::MultipleStatements(statements.len()))
        }
        Ok(_) => Ok(sql),
        Err(e) => {
            debug!(error = %e, "query not understood locally, deferring to engine");
            let separators = Tokenizer::new(&dialect, sql)
                .tokenize()
                .map(|tokens| tokens.iter().filter(|t| **t == Token::SemiColon).count())
                .unwrap_or(0);
            if separators > 0 {
                Err(ScreenError::MultipleStatements(separators + 1))
            } else {
                Ok(sql)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_statement() {
        assert_eq!(
            screen_query("  SELECT * FROM nation;  ").unwrap(),
            "SELECT * FROM nation"
        );
        assert_eq!(
            screen_query("SELECT ';' AS semi FROM region").unwrap(),
            "SELECT ';' AS semi FROM region"
        );
    }

    #[test]
    fn test_empty() {
        assert_eq!(screen_query(""), Err(ScreenError::EmptyQuery));
        assert_eq!(screen_query(" ;; "), Err(ScreenError::EmptyQuery));
    }

    #[test]
    fn test_multiple_statements() {
        assert_eq!(
            screen_query("SELECT 1; DROP TABLE orders"),
            Err(ScreenError::MultipleStatements(2))
        );
    }

    #[test]
    fn test_unparsed_text_passes_through() {
        // Left for the engine to judge.
        assert_eq!(screen_query("SELEC * FROM nation").unwrap(), "SELEC * FROM nation");
        assert!(matches!(
            screen_query("SELEC 1; DROP TABLE orders"),
            Err(ScreenError::MultipleStatements(_))
        ));
    }
}
