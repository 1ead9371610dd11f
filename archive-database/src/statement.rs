/*!
Typed delete statements and the predicates that filter them
*/

use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::types::Value;

use crate::error::{Result, StoreError};
use crate::store::quote_identifier;

lazy_static! {
    static ref DELETE_FROM: Regex =
        Regex::new(r"(?is)^\s*DELETE\s+FROM\s+(.+?)\s*;?\s*$").expect("static pattern");
    static ref WHERE_KEYWORD: Regex = Regex::new(r"(?i)\s+WHERE\s+").expect("static pattern");
    static ref TABLE_NAME: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("static pattern");
}

/// A SQL boolean expression with its positional (`?`) parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    sql: String,
    params: Vec<Value>,
}

impl Predicate {
    /// Wrap a hand-written SQL condition. The text is trusted as-is.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::raw_with_params(sql, Vec::new())
    }

    pub fn raw_with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into().trim().to_string(),
            params,
        }
    }

    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self {
            sql: format!("{} = ?", quote_identifier(column)),
            params: vec![value.into()],
        }
    }

    pub fn is_not_null(column: &str) -> Self {
        Self::raw(format!("{} IS NOT NULL", quote_identifier(column)))
    }

    pub fn and(self, other: Predicate) -> Self {
        let mut params = self.params;
        params.extend(other.params);
        Self {
            sql: format!("({}) AND ({})", self.sql, other.sql),
            params,
        }
    }

    /// The condition that applies when a caller adds `extra` on top of a
    /// statement's own `original` condition.
    pub fn combine(original: Option<&Predicate>, extra: Option<&Predicate>) -> Option<Predicate> {
        match (original, extra) {
            (Some(original), Some(extra)) => Some(original.clone().and(extra.clone())),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// ` WHERE <sql>`, ready to append to a statement.
    pub fn where_clause(&self) -> String {
        format!(" WHERE {}", self.sql)
    }
}

/// `DELETE FROM <table[, table...]> [WHERE <predicate>]`
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    tables: Vec<String>,
    predicate: Option<Predicate>,
}

impl DeleteStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            tables: vec![table.into()],
            predicate: None,
        }
    }

    pub fn and_from(mut self, table: impl Into<String>) -> Self {
        self.tables.push(table.into());
        self
    }

    /// Narrow the statement; repeated filters are AND-ed together.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Predicate::combine(self.predicate.as_ref(), Some(&predicate));
        self
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    /// Parse raw statement text of the shape
    /// `DELETE FROM <table[, table...]> [WHERE <predicate>]`.
    ///
    /// Keywords match case-insensitively and identifiers may be wrapped in
    /// backticks or double quotes. Schema-qualified names (`main.orders`) and
    /// anything else are rejected.
    pub fn parse(sql: &str) -> Result<Self> {
        let body = DELETE_FROM
            .captures(sql)
            .and_then(|captures| captures.get(1))
            .ok_or_else(|| StoreError::malformed(sql))?
            .as_str();

        let mut parts = WHERE_KEYWORD.splitn(body, 2);
        let from = parts.next().unwrap_or_default();
        let predicate = match parts.next() {
            Some(condition) if !condition.trim().is_empty() => Some(Predicate::raw(condition)),
            Some(_) => return Err(StoreError::malformed(sql)),
            None => None,
        };

        let tables = from
            .replace(['`', '"'], "")
            .split(',')
            .map(|table| table.trim().to_string())
            .collect::<Vec<_>>();

        if tables.iter().any(|table| !TABLE_NAME.is_match(table)) {
            return Err(StoreError::malformed(sql));
        }

        Ok(Self { tables, predicate })
    }

    /// The single-table `DELETE` the driver runs for `table`.
    pub fn sql_for(&self, table: &str) -> String {
        let mut sql = format!("DELETE FROM {}", quote_identifier(table));
        if let Some(predicate) = &self.predicate {
            sql.push_str(&predicate.where_clause());
        }
        sql
    }
}
