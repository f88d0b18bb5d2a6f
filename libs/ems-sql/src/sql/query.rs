// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::str::FromStr;

use indexmap::IndexMap;

use super::{
    expression::Expression,
    join::JoinClause,
    order::{OrderBy, Ordering},
    parentheses::{Condition, Parentheses},
    predicate::Operand,
    query_renderer, ExpressionBuilder, SQLBuilder, SQLParam,
};
use crate::{SqlError, SqlResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

impl FromStr for Operation {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SELECT" => Ok(Operation::Select),
            "INSERT" => Ok(Operation::Insert),
            "UPDATE" => Ok(Operation::Update),
            "DELETE" => Ok(Operation::Delete),
            _ => Err(SqlError::UnsupportedParameter(format!(
                "Unsupported query operation '{s}'"
            ))),
        }
    }
}

/// A dialect-neutral SQL statement. The ORM compiler produces these and the
/// [`crate::QueryRenderer`] turns them into SQL text and bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub operation: Operation,
    /// The root table
    pub table: String,
    /// Selected columns (SELECT)
    pub columns: Vec<Expression>,
    /// Column -> value (INSERT and UPDATE)
    pub values: IndexMap<String, Operand>,
    pub joins: Vec<JoinClause>,
    pub conditions: Parentheses,
    pub group_bys: Vec<Expression>,
    pub havings: Parentheses,
    pub order_bys: OrderBy,
    pub distinct: bool,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Query {
    pub fn new(operation: Operation, table: impl Into<String>) -> Self {
        Self {
            operation,
            table: table.into(),
            columns: vec![],
            values: IndexMap::new(),
            joins: vec![],
            conditions: Parentheses::and(),
            group_bys: vec![],
            havings: Parentheses::and(),
            order_bys: OrderBy::default(),
            distinct: false,
            limit: None,
            offset: None,
        }
    }

    /// Create a query from an operation name such as `"select"`.
    pub fn from_operation(operation: &str, table: impl Into<String>) -> SqlResult<Self> {
        Ok(Self::new(operation.parse()?, table))
    }

    pub fn select(table: impl Into<String>) -> Self {
        Self::new(Operation::Select, table)
    }

    pub fn insert(table: impl Into<String>) -> Self {
        Self::new(Operation::Insert, table)
    }

    pub fn update(table: impl Into<String>) -> Self {
        Self::new(Operation::Update, table)
    }

    pub fn delete(table: impl Into<String>) -> Self {
        Self::new(Operation::Delete, table)
    }

    pub fn column(mut self, column: impl Into<Expression>) -> Self {
        self.add_column(column);
        self
    }

    /// Add a column unless an equal one is already selected
    pub fn add_column(&mut self, column: impl Into<Expression>) {
        let column = column.into();
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
    }

    pub fn value(mut self, column: impl Into<String>, value: impl Into<SQLParam>) -> Self {
        self.values
            .insert(column.into(), Operand::Value(value.into()));
        self
    }

    /// Set a column to a computed value (inlined rather than bound)
    pub fn value_expression(mut self, column: impl Into<String>, value: Expression) -> Self {
        self.values
            .insert(column.into(), Operand::Expression(value));
        self
    }

    pub fn join(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    pub fn has_join(&self, visible_name: &str) -> bool {
        self.joins
            .iter()
            .any(|join| join.visible_name() == visible_name)
    }

    pub fn filter(mut self, condition: impl Into<Condition>) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn group_by(mut self, column: impl Into<Expression>) -> Self {
        self.group_bys.push(column.into());
        self
    }

    pub fn having(mut self, condition: impl Into<Condition>) -> Self {
        self.havings.push(condition);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ordering: Ordering) -> Self {
        self.order_bys.insert(column, ordering);
        self
    }

    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl ExpressionBuilder for Query {
    fn build(&self, builder: &mut SQLBuilder) -> SqlResult<()> {
        query_renderer::build_query(self, builder)
    }
}
