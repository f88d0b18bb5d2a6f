// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{parentheses::Parentheses, predicate::Predicate, ExpressionBuilder, SQLBuilder};
use crate::SqlResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinDirection {
    Left,
    Right,
    Inner,
    /// A plain `JOIN`
    #[default]
    Unspecified,
}

impl JoinDirection {
    fn keyword(&self) -> &'static str {
        match self {
            JoinDirection::Left => "LEFT JOIN",
            JoinDirection::Right => "RIGHT JOIN",
            JoinDirection::Inner => "INNER JOIN",
            JoinDirection::Unspecified => "JOIN",
        }
    }
}

/// A join such as `LEFT JOIN "addresses" AS "address" ON "users"."address_id" = "address"."id"`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// The joined table such as `addresses`.
    pub table: String,
    pub alias: Option<String>,
    pub direction: JoinDirection,
    /// The keyword introducing the conditions (`ON`)
    pub unification: String,
    pub conditions: Parentheses,
}

impl JoinClause {
    pub fn new(table: impl Into<String>, alias: Option<String>, direction: JoinDirection) -> Self {
        Self {
            table: table.into(),
            alias,
            direction,
            unification: "ON".to_string(),
            conditions: Parentheses::and(),
        }
    }

    pub fn left(table: impl Into<String>, alias: Option<String>) -> Self {
        Self::new(table, alias, JoinDirection::Left)
    }

    /// Add an `left = right` key comparison to the join conditions
    pub fn on(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.conditions.push(Predicate::keys(left, "=", right));
        self
    }

    /// The name under which the joined table is visible to the rest of the query
    pub fn visible_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

impl ExpressionBuilder for JoinClause {
    /// Build expression of the form `<direction> JOIN <table> [AS <alias>] [ON <conditions>]`.
    fn build(&self, builder: &mut SQLBuilder) -> SqlResult<()> {
        builder.push_str(self.direction.keyword());
        builder.push_space();
        builder.push_identifier(&self.table);

        if let Some(alias) = &self.alias {
            builder.push_str(" AS ");
            builder.push_identifier(alias);
        }

        if !self.conditions.is_empty() {
            builder.push_space();
            builder.push_str(&self.unification);
            builder.push_space();
            self.conditions.build(builder)?;
        }
        Ok(())
    }
}
