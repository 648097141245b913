//! SQL text helpers

/// Quote an identifier: `userId` becomes `"userId"`
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal: `It's` becomes `'It''s'`
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Comma-separated quoted identifiers
pub fn column_list<S: AsRef<str>>(columns: &[S]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `SELECT DISTINCT` of the given columns
pub fn select_distinct<S: AsRef<str>>(columns: &[S], table: &str) -> String {
    format!(
        "SELECT DISTINCT {} FROM {}",
        column_list(columns),
        quote_ident(table)
    )
}
