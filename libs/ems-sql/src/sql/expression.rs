// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{ExpressionBuilder, SQLBuilder, SQLParam};
use crate::SqlResult;

/// A fragment of SQL that can appear as a column, an operand or a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Rendered verbatim. Never parameterized, never quoted.
    Raw(String),
    /// A column or other identifier such as `users.id` (rendered as `"users"."id"` under a quoting
    /// dialect), optionally aliased (`... AS "alias"`).
    Key { name: String, alias: Option<String> },
    /// A pre-rendered fragment along with the bindings for its placeholders (typically a subquery).
    Sql { sql: String, params: Vec<SQLParam> },
}

impl Expression {
    pub fn raw(sql: impl Into<String>) -> Self {
        Expression::Raw(sql.into())
    }

    pub fn key(name: impl Into<String>) -> Self {
        Expression::Key {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased_key(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Expression::Key {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    pub fn sql(sql: impl Into<String>, params: Vec<SQLParam>) -> Self {
        Expression::Sql {
            sql: sql.into(),
            params,
        }
    }

    /// The name of the key, if this is a key expression
    pub fn key_name(&self) -> Option<&str> {
        match self {
            Expression::Key { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl From<&str> for Expression {
    fn from(name: &str) -> Self {
        Expression::key(name)
    }
}

impl From<String> for Expression {
    fn from(name: String) -> Self {
        Expression::key(name)
    }
}

impl ExpressionBuilder for Expression {
    fn build(&self, builder: &mut SQLBuilder) -> SqlResult<()> {
        if builder.render_with_dialect(self) {
            return Ok(());
        }

        match self {
            Expression::Raw(sql) => builder.push_str(sql),
            Expression::Key { name, alias } => {
                builder.push_identifier(name);
                if let Some(alias) = alias {
                    builder.push_str(" AS ");
                    builder.push_identifier(alias);
                }
            }
            Expression::Sql { sql, params } => {
                builder.push_str(sql);
                builder.extend_params(params.iter().cloned());
            }
        }
        Ok(())
    }
}
