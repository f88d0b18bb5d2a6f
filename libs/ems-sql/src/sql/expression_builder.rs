// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{dialect::Dialect, SQLBuilder, SQLParam};
use crate::SqlResult;

/// A trait for types that can build themselves into an SQL expression.
///
/// Each constituent of a query (expression, predicate, condition group, join, query) implements
/// this trait, which is then used to hierarchically build an SQL string and the list of
/// parameters to be supplied to it.
pub trait ExpressionBuilder {
    /// Build the SQL expression into the given SQL builder
    fn build(&self, builder: &mut SQLBuilder) -> SqlResult<()>;

    /// Build the SQL expression into a string and return it along with the bindings. Useful for
    /// testing/debugging, where we want to assert on the generated SQL without going through the
    /// [`crate::QueryRenderer`].
    fn to_sql(&self, dialect: Option<&dyn Dialect>) -> SqlResult<(String, Vec<SQLParam>)>
    where
        Self: Sized,
    {
        let mut builder = SQLBuilder::new(dialect);
        self.build(&mut builder)?;
        Ok(builder.into_sql())
    }
}

impl<T> ExpressionBuilder for Box<T>
where
    T: ExpressionBuilder,
{
    fn build(&self, builder: &mut SQLBuilder) -> SqlResult<()> {
        self.as_ref().build(builder)
    }
}

impl<T> ExpressionBuilder for &T
where
    T: ExpressionBuilder,
{
    fn build(&self, builder: &mut SQLBuilder) -> SqlResult<()> {
        (**self).build(builder)
    }
}
