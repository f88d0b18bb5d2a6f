// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use tracing::{debug, instrument};

use super::{
    dialect::{quote_string_literal, Dialect, QuoteKind},
    expression::Expression,
    join::JoinClause,
    order::OrderBy,
    parentheses::Parentheses,
    predicate::Operand,
    query::{Operation, Query},
    ExpressionBuilder, SQLBuilder, SQLParam,
};
use crate::{SqlError, SqlResult};

/// Renders [`Query`]s (and fragments of them) to SQL text with `?` placeholders plus the
/// bindings for those placeholders, in order.
///
/// The renderer holds no state besides the (read-only) dialect. Each top-level call allocates
/// its own bindings list; the fragment-level methods (`render_columns`, `render_conditions`, ...)
/// instead append to a caller-supplied list so that several fragments can be assembled into one
/// statement while keeping placeholders and bindings aligned.
///
/// Without a dialect, identifiers are emitted as given (no quoting) and literal values are
/// quoted the ANSI way.
#[derive(Debug, Clone, Default)]
pub struct QueryRenderer {
    dialect: Option<Arc<dyn Dialect>>,
    log_interpolated: bool,
}

impl QueryRenderer {
    pub fn new(dialect: Option<Arc<dyn Dialect>>) -> Self {
        Self {
            dialect,
            log_interpolated: false,
        }
    }

    pub fn with_dialect(dialect: Arc<dyn Dialect>) -> Self {
        Self::new(Some(dialect))
    }

    /// Include the interpolated SQL (see [`QueryRenderer::interpolate`]) in debug logs
    pub fn log_interpolated(mut self, log_interpolated: bool) -> Self {
        self.log_interpolated = log_interpolated;
        self
    }

    pub fn dialect(&self) -> Option<&dyn Dialect> {
        self.dialect.as_deref()
    }

    /// Render a query according to its operation.
    #[instrument(
        name = "QueryRenderer::render",
        skip_all,
        fields(table = %query.table, operation = ?query.operation)
    )]
    pub fn render(&self, query: &Query) -> SqlResult<(String, Vec<SQLParam>)> {
        let (sql, params) = self.build(|builder| build_query(query, builder))?;

        if self.log_interpolated {
            debug!(
                params = params.len(),
                "Rendered SQL: {}",
                self.interpolate(&sql, &params)
            );
        } else {
            debug!(params = %serialize_params(&params), "Rendered SQL: {}", sql);
        }

        Ok((sql, params))
    }

    pub fn render_select(&self, query: &Query) -> SqlResult<(String, Vec<SQLParam>)> {
        self.build(|builder| build_select(query, builder))
    }

    pub fn render_insert(&self, query: &Query) -> SqlResult<(String, Vec<SQLParam>)> {
        self.build(|builder| build_insert(query, builder))
    }

    pub fn render_update(&self, query: &Query) -> SqlResult<(String, Vec<SQLParam>)> {
        self.build(|builder| build_update(query, builder))
    }

    pub fn render_delete(&self, query: &Query) -> SqlResult<(String, Vec<SQLParam>)> {
        self.build(|builder| build_delete(query, builder))
    }

    /// `col1, col2 AS alias, ...` (`*` when there are no columns)
    pub fn render_columns(
        &self,
        columns: &[Expression],
        bindings: &mut Vec<SQLParam>,
    ) -> SqlResult<String> {
        self.fragment(bindings, |builder| build_columns(columns, builder))
    }

    /// One join per line
    pub fn render_joins(
        &self,
        joins: &[JoinClause],
        bindings: &mut Vec<SQLParam>,
    ) -> SqlResult<String> {
        self.fragment(bindings, |builder| builder.push_elems(joins, "\n"))
    }

    /// The conditions without the `WHERE`/`HAVING` keyword
    pub fn render_conditions(
        &self,
        conditions: &Parentheses,
        bindings: &mut Vec<SQLParam>,
    ) -> SqlResult<String> {
        self.fragment(bindings, |builder| conditions.build(builder))
    }

    /// The grouping expressions without the `GROUP BY` keyword
    pub fn render_group_by(
        &self,
        group_bys: &[Expression],
        bindings: &mut Vec<SQLParam>,
    ) -> SqlResult<String> {
        self.fragment(bindings, |builder| builder.push_elems(group_bys, ", "))
    }

    /// The sort keys without the `ORDER BY` keyword
    pub fn render_order_by(
        &self,
        order_bys: &OrderBy,
        bindings: &mut Vec<SQLParam>,
    ) -> SqlResult<String> {
        self.fragment(bindings, |builder| order_bys.build(builder))
    }

    pub fn quote_name(&self, name: &str) -> String {
        match self.dialect() {
            Some(dialect) => dialect.quote(name, QuoteKind::Name),
            None => name.to_string(),
        }
    }

    pub fn quote_value(&self, value: &str) -> String {
        match self.dialect() {
            Some(dialect) => dialect.quote(value, QuoteKind::Value),
            None => quote_string_literal(value),
        }
    }

    /// Substitute each `?` placeholder (outside string literals and quoted identifiers) with its
    /// binding rendered as a literal. For logging and debugging only; never execute the result.
    pub fn interpolate(&self, sql: &str, bindings: &[SQLParam]) -> String {
        let mut result = String::with_capacity(sql.len());
        let mut bindings = bindings.iter();
        // The quote character of the span we are in, if any. A doubled quote closes and
        // reopens the span, which leaves us inside it.
        let mut quoted_by: Option<char> = None;

        for c in sql.chars() {
            match (c, quoted_by) {
                ('\'' | '"' | '`', None) => {
                    quoted_by = Some(c);
                    result.push(c);
                }
                (_, Some(quote)) if c == quote => {
                    quoted_by = None;
                    result.push(c);
                }
                ('?', None) => match bindings.next() {
                    Some(binding) => result.push_str(&self.literal(binding)),
                    None => result.push(c),
                },
                _ => result.push(c),
            }
        }

        result
    }

    fn literal(&self, param: &SQLParam) -> String {
        match param {
            SQLParam::Null => "NULL".to_string(),
            SQLParam::Bool(true) => "TRUE".to_string(),
            SQLParam::Bool(false) => "FALSE".to_string(),
            SQLParam::Int(i) => i.to_string(),
            SQLParam::Float(f) => f.to_string(),
            SQLParam::String(s) => self.quote_value(s),
            SQLParam::Bytes(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
                format!("X'{hex}'")
            }
        }
    }

    fn build(
        &self,
        func: impl FnOnce(&mut SQLBuilder) -> SqlResult<()>,
    ) -> SqlResult<(String, Vec<SQLParam>)> {
        let mut builder = SQLBuilder::new(self.dialect());
        func(&mut builder)?;
        Ok(builder.into_sql())
    }

    /// Build into a builder seeded with `bindings`, then hand the (extended) bindings back.
    fn fragment(
        &self,
        bindings: &mut Vec<SQLParam>,
        func: impl FnOnce(&mut SQLBuilder) -> SqlResult<()>,
    ) -> SqlResult<String> {
        let mut builder = SQLBuilder::with_params(self.dialect(), std::mem::take(bindings));
        let result = func(&mut builder);
        let (sql, params) = builder.into_sql();
        *bindings = params;
        result.map(|_| sql)
    }
}

/// Bindings as a JSON array for the debug log
fn serialize_params(params: &[SQLParam]) -> String {
    serde_json::to_string(params).unwrap_or_else(|_| format!("<{} params>", params.len()))
}

pub(crate) fn build_query(query: &Query, builder: &mut SQLBuilder) -> SqlResult<()> {
    match query.operation {
        Operation::Select => build_select(query, builder),
        Operation::Insert => build_insert(query, builder),
        Operation::Update => build_update(query, builder),
        Operation::Delete => build_delete(query, builder),
    }
}

/// `SELECT <columns>\nFROM <table>` followed, when non-empty and in this order, by joins,
/// `WHERE`, `GROUP BY`, `HAVING`, `ORDER BY`, `LIMIT` and `OFFSET`, each on its own line.
fn build_select(query: &Query, builder: &mut SQLBuilder) -> SqlResult<()> {
    builder.push_str("SELECT ");
    if query.distinct {
        builder.push_str("DISTINCT ");
    }
    build_columns(&query.columns, builder)?;

    builder.push_newline();
    builder.push_str("FROM ");
    builder.push_identifier(&query.table);

    if !query.joins.is_empty() {
        builder.push_newline();
        builder.push_elems(&query.joins, "\n")?;
    }

    build_where(&query.conditions, builder)?;

    if !query.group_bys.is_empty() {
        builder.push_newline();
        builder.push_str("GROUP BY ");
        builder.push_elems(&query.group_bys, ", ")?;
    }

    if !query.havings.is_empty() {
        builder.push_newline();
        builder.push_str("HAVING ");
        query.havings.build(builder)?;
    }

    if !query.order_bys.is_empty() {
        builder.push_newline();
        builder.push_str("ORDER BY ");
        query.order_bys.build(builder)?;
    }

    if let Some(limit) = query.limit {
        builder.push_newline();
        builder.push_str(format!("LIMIT {limit}"));
    }

    if let Some(offset) = query.offset {
        builder.push_newline();
        builder.push_str(format!("OFFSET {offset}"));
    }

    Ok(())
}

/// `INSERT INTO <table> (<columns>)\nVALUES (<values>)`
fn build_insert(query: &Query, builder: &mut SQLBuilder) -> SqlResult<()> {
    if query.values.is_empty() {
        return Err(SqlError::UnsupportedParameter(format!(
            "INSERT into '{}' without any values",
            query.table
        )));
    }

    builder.push_str("INSERT INTO ");
    builder.push_identifier(&query.table);
    builder.push_str(" (");
    builder.push_iter(query.values.keys(), ", ", |builder, column| {
        builder.push_identifier(column);
        Ok(())
    })?;
    builder.push(')');

    builder.push_newline();
    builder.push_str("VALUES (");
    builder.push_iter(query.values.values(), ", ", build_value)?;
    builder.push(')');

    Ok(())
}

/// `UPDATE <table>\nSET <col> = <value>, ...` plus an optional `WHERE` line
fn build_update(query: &Query, builder: &mut SQLBuilder) -> SqlResult<()> {
    if query.values.is_empty() {
        return Err(SqlError::UnsupportedParameter(format!(
            "UPDATE of '{}' without any values",
            query.table
        )));
    }

    builder.push_str("UPDATE ");
    builder.push_identifier(&query.table);

    builder.push_newline();
    builder.push_str("SET ");
    builder.push_iter(query.values.iter(), ", ", |builder, (column, value)| {
        builder.push_identifier(column);
        builder.push_str(" = ");
        build_value(builder, value)
    })?;

    build_where(&query.conditions, builder)
}

/// `DELETE FROM <table>` plus an optional `WHERE` line
fn build_delete(query: &Query, builder: &mut SQLBuilder) -> SqlResult<()> {
    builder.push_str("DELETE FROM ");
    builder.push_identifier(&query.table);

    build_where(&query.conditions, builder)
}

fn build_columns(columns: &[Expression], builder: &mut SQLBuilder) -> SqlResult<()> {
    if columns.is_empty() {
        builder.push('*');
        Ok(())
    } else {
        builder.push_elems(columns, ", ")
    }
}

fn build_where(conditions: &Parentheses, builder: &mut SQLBuilder) -> SqlResult<()> {
    if !conditions.is_empty() {
        builder.push_newline();
        builder.push_str("WHERE ");
        conditions.build(builder)?;
    }
    Ok(())
}

/// A value in INSERT/UPDATE. Expressions are inlined (bringing their own bindings along), so
/// computed values and subqueries work.
fn build_value(builder: &mut SQLBuilder, value: &Operand) -> SqlResult<()> {
    match value {
        Operand::Value(param) => {
            builder.push_param(param.clone());
            Ok(())
        }
        Operand::Expression(expression) => expression.build(builder),
        Operand::Key(column) => {
            builder.push_identifier(column);
            Ok(())
        }
        Operand::List(_) => Err(SqlError::type_mismatch("a single value", "list")),
    }
}
