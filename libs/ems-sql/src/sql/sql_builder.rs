// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{
    dialect::{quote_string_literal, Dialect, QuoteKind},
    expression::Expression,
    ExpressionBuilder, SQLParam,
};
use crate::SqlResult;

/// Accumulates the SQL text and, in lockstep, the bindings for its `?` placeholders. Every
/// placeholder is pushed through [`SQLBuilder::push_param`], so the n-th `?` in the text always
/// corresponds to the n-th binding.
pub struct SQLBuilder<'d> {
    /// The SQL being built with placeholders for each parameter
    sql: String,
    /// The list of parameters
    params: Vec<SQLParam>,
    /// Dialect used for quoting. Without one, identifiers are emitted as is.
    dialect: Option<&'d dyn Dialect>,
}

impl<'d> SQLBuilder<'d> {
    pub fn new(dialect: Option<&'d dyn Dialect>) -> Self {
        Self::with_params(dialect, Vec::new())
    }

    /// Continue accumulating after the given bindings (used by the fragment-level renderer
    /// entry points that share a bindings list across calls).
    pub fn with_params(dialect: Option<&'d dyn Dialect>, params: Vec<SQLParam>) -> Self {
        Self {
            sql: String::new(),
            params,
            dialect,
        }
    }

    pub fn dialect(&self) -> Option<&'d dyn Dialect> {
        self.dialect
    }

    /// Push a string
    pub fn push_str<T: AsRef<str>>(&mut self, s: T) {
        self.sql.push_str(s.as_ref());
    }

    /// Push a character
    pub fn push(&mut self, c: char) {
        self.sql.push(c);
    }

    pub fn push_space(&mut self) {
        self.sql.push(' ');
    }

    pub fn push_newline(&mut self) {
        self.sql.push('\n');
    }

    /// Push an identifier (table, column, alias), quoted by the dialect if there is one.
    pub fn push_identifier<T: AsRef<str>>(&mut self, s: T) {
        match self.dialect {
            Some(dialect) => {
                let quoted = dialect.quote(s.as_ref(), QuoteKind::Name);
                self.sql.push_str(&quoted);
            }
            None => self.sql.push_str(s.as_ref()),
        }
    }

    /// Push a parameter: a `?` placeholder in the SQL and the value in the bindings.
    pub fn push_param(&mut self, param: SQLParam) {
        self.params.push(param);
        self.push('?');
    }

    /// Append bindings for placeholders that are already part of pushed text (pre-rendered
    /// fragments).
    pub fn extend_params(&mut self, params: impl IntoIterator<Item = SQLParam>) {
        self.params.extend(params);
    }

    /// Quote a literal value (used for debugging output, never for execution).
    pub fn quote_value(&self, value: &str) -> String {
        match self.dialect {
            Some(dialect) => dialect.quote(value, QuoteKind::Value),
            None => quote_string_literal(value),
        }
    }

    /// Offer the expression to the dialect. Returns `true` if the dialect rendered it.
    pub(crate) fn render_with_dialect(&mut self, expression: &Expression) -> bool {
        match self.dialect {
            Some(dialect) => dialect.render_expression(expression, self),
            None => false,
        }
    }

    /// Push elements of an iterator, separated by `sep`. The `push_elem` function provides
    /// the flexibility to map the elements (compared to [`SQLBuilder::push_elems`], which assumes that
    /// the elements implement [`ExpressionBuilder`]).
    pub fn push_iter<T>(
        &mut self,
        iter: impl ExactSizeIterator<Item = T>,
        sep: &str,
        push_elem: impl Fn(&mut Self, T) -> SqlResult<()>,
    ) -> SqlResult<()> {
        let len = iter.len();
        for (i, item) in iter.enumerate() {
            push_elem(self, item)?;

            if i < len - 1 {
                self.sql.push_str(sep);
            }
        }
        Ok(())
    }

    /// Push elements of a slice, separated by `sep`.
    pub fn push_elems<T: ExpressionBuilder>(&mut self, elems: &[T], sep: &str) -> SqlResult<()> {
        self.push_iter(elems.iter(), sep, |builder, elem| elem.build(builder))
    }

    /// Get the SQL string and the list of parameters. Calling this method should be the final step
    /// in building an SQL expression, and thus this builder consumes the `self`.
    pub fn into_sql(self) -> (String, Vec<SQLParam>) {
        (self.sql, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::{MySql, Postgres};

    #[test]
    fn placeholders_follow_params() {
        let mut builder = SQLBuilder::new(Some(&Postgres));
        builder.push_identifier("users.age");
        builder.push_str(" BETWEEN ");
        builder.push_param(SQLParam::from(18));
        builder.push_str(" AND ");
        builder.push_param(SQLParam::from(65));

        assert_binding!(builder.into_sql(), r#""users"."age" BETWEEN ? AND ?"#, 18, 65);
    }

    #[test]
    fn continues_after_existing_params() {
        let mut builder = SQLBuilder::with_params(Some(&MySql), vec![SQLParam::from("a")]);
        builder.push_param(SQLParam::from("b"));

        assert_binding!(builder.into_sql(), "?", "a", "b");
    }

    #[test]
    fn quote_value_without_dialect() {
        let builder = SQLBuilder::new(None);
        assert_eq!(builder.quote_value("it's"), "'it''s'");
    }
}
