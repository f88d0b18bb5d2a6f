// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{fmt::Debug, str::FromStr, sync::Arc};

use super::{expression::Expression, SQLBuilder};
use crate::SqlError;

/// What is being quoted: an identifier (table, column, alias) or a literal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteKind {
    Name,
    Value,
}

/// An error reported by a database driver, reduced to the parts a dialect needs to classify it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    pub code: Option<String>,
    pub message: String,
}

impl NativeError {
    pub fn new(code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code: code.map(|c| c.to_string()),
            message: message.into(),
        }
    }
}

/// Vendor specific parts of SQL generation: identifier quoting, literal escaping, and
/// classification of driver errors.
pub trait Dialect: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn quote(&self, value: &str, kind: QuoteKind) -> String;

    /// Give the dialect a chance to render an expression itself. Returns `true` if it did (in
    /// which case it must have pushed any bindings the fragment needs).
    fn render_expression(&self, _expression: &Expression, _builder: &mut SQLBuilder<'_>) -> bool {
        false
    }

    fn create_error(&self, native: NativeError) -> SqlError;
}

/// Quote a possibly qualified identifier (`users.id` -> `"users"."id"`). Every segment except
/// `*` is quoted, with embedded `close` characters doubled.
fn quote_name(name: &str, open: char, close: char) -> String {
    name.split('.')
        .map(|segment| {
            if segment == "*" {
                segment.to_string()
            } else {
                let escaped = segment.replace(close, &format!("{close}{close}"));
                format!("{open}{escaped}{close}")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Quote a literal the ANSI way. Also used when no dialect is configured.
pub(crate) fn quote_string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote(&self, value: &str, kind: QuoteKind) -> String {
        match kind {
            QuoteKind::Name => quote_name(value, '"', '"'),
            QuoteKind::Value => quote_string_literal(value),
        }
    }

    fn create_error(&self, native: NativeError) -> SqlError {
        match native.code.as_deref() {
            Some("23505") => SqlError::UniqueViolation(native.message),
            Some("23503") => SqlError::ForeignKeyViolation(native.message),
            Some("42601") => SqlError::Syntax(native.message),
            Some("42P01") | Some("42703") => SqlError::UndefinedObject(native.message),
            _ => SqlError::Native {
                code: native.code,
                message: native.message,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote(&self, value: &str, kind: QuoteKind) -> String {
        match kind {
            QuoteKind::Name => quote_name(value, '`', '`'),
            // MySQL treats backslash as an escape character inside string literals
            QuoteKind::Value => format!(
                "'{}'",
                value.replace('\\', "\\\\").replace('\'', "''")
            ),
        }
    }

    fn create_error(&self, native: NativeError) -> SqlError {
        match native.code.as_deref() {
            Some("1062") => SqlError::UniqueViolation(native.message),
            Some("1451") | Some("1452") => SqlError::ForeignKeyViolation(native.message),
            Some("1064") => SqlError::Syntax(native.message),
            Some("1146") | Some("1054") => SqlError::UndefinedObject(native.message),
            _ => SqlError::Native {
                code: native.code,
                message: native.message,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote(&self, value: &str, kind: QuoteKind) -> String {
        match kind {
            QuoteKind::Name => quote_name(value, '"', '"'),
            QuoteKind::Value => quote_string_literal(value),
        }
    }

    fn create_error(&self, native: NativeError) -> SqlError {
        // SQLite reports the generic SQLITE_ERROR (1) for both syntax errors and missing tables
        match native.code.as_deref() {
            Some("2067") | Some("1555") => SqlError::UniqueViolation(native.message),
            Some("787") => SqlError::ForeignKeyViolation(native.message),
            Some("1") if native.message.contains("no such") => {
                SqlError::UndefinedObject(native.message)
            }
            Some("1") if native.message.contains("syntax error") => {
                SqlError::Syntax(native.message)
            }
            _ => SqlError::Native {
                code: native.code,
                message: native.message,
            },
        }
    }
}

/// The dialects shipped with this crate, selectable by name (see [`crate::config`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectKind {
    Postgres,
    MySql,
    Sqlite,
}

impl DialectKind {
    pub fn dialect(self) -> Arc<dyn Dialect> {
        match self {
            DialectKind::Postgres => Arc::new(Postgres),
            DialectKind::MySql => Arc::new(MySql),
            DialectKind::Sqlite => Arc::new(Sqlite),
        }
    }
}

impl FromStr for DialectKind {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(DialectKind::Postgres),
            "mysql" | "mariadb" => Ok(DialectKind::MySql),
            "sqlite" => Ok(DialectKind::Sqlite),
            _ => Err(SqlError::UnsupportedParameter(format!(
                "Unknown SQL dialect '{s}'"
            ))),
        }
    }
}
