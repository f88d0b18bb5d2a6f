// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Compile object-level queries into SQL.
//!
//! An [`OrmQuery`] names an entity type and refers to columns through relation paths
//! (`address.country.name`). The [`OrmQueryCompiler`] resolves those paths against a
//! [`SchemaInspector`] and produces a dialect-neutral [`Query`] with the required joins and
//! column aliases. The [`QueryRenderer`] then turns a [`Query`] into SQL text with `?`
//! placeholders along with the bindings for those placeholders (in placeholder order), quoting
//! identifiers through a [`Dialect`].
//!
//! ```no_run
//! use ems_sql::{ClassMapInspector, OrmQuery, OrmQueryCompiler, QueryRenderer, Postgres};
//! # use std::sync::Arc;
//! # fn main() -> ems_sql::SqlResult<()> {
//! let inspector = ClassMapInspector::from_json(r#"{ ... }"#)?;
//! let orm_query = OrmQuery::new("User")
//!     .where_value("address.city", "=", "Berlin")
//!     .with("address");
//!
//! let query = OrmQueryCompiler::new(&inspector).to_select(&orm_query, None)?;
//! let (sql, bindings) = QueryRenderer::with_dialect(Arc::new(Postgres)).render(&query)?;
//! # Ok(())
//! # }
//! ```
//!
//! Executing the SQL is left to the caller.

#[macro_use]
mod sql;
mod asql;
mod schema;
mod transform;

pub mod config;
pub mod sql_error;

/// Public types at the root level of this crate
pub use asql::{
    orm_query::OrmQuery,
    relation_path::{alias_for, split_column_path},
};
pub use schema::{
    class_map::{ClassMap, Junction, JunctionTarget, Relationship},
    inspector::{ClassMapInspector, SchemaInspector},
};
pub use sql::{
    dialect::{Dialect, DialectKind, MySql, NativeError, Postgres, QuoteKind, Sqlite},
    expression::Expression,
    join::{JoinClause, JoinDirection},
    order::{OrderBy, Ordering},
    parentheses::{Condition, Connective, Parentheses},
    predicate::{Operand, Predicate},
    query::{Operation, Query},
    query_renderer::QueryRenderer,
    ExpressionBuilder, SQLBuilder, SQLParam,
};
pub use sql_error::{SqlError, SqlResult, WithContext};
pub use transform::{
    orm_query_compiler::{CompiledOrmQuery, OrmQueryCompiler},
    relation_map::{RelationMap, RelationMapEntry},
};
