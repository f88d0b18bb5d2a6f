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

use super::{ExpressionBuilder, SQLBuilder};
use crate::{SqlError, SqlResult};

#[derive(Debug, Clone, PartialEq, Eq, Copy, Default)]
pub enum Ordering {
    #[default]
    Asc,
    Desc,
}

impl Ordering {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Ordering::Asc => "ASC",
            Ordering::Desc => "DESC",
        }
    }
}

impl FromStr for Ordering {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ASC" => Ok(Ordering::Asc),
            "DESC" => Ok(Ordering::Desc),
            _ => Err(SqlError::UnsupportedParameter(format!(
                "Unsupported sort direction '{s}'"
            ))),
        }
    }
}

/// Column -> direction, in the order the sort keys apply.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderBy(pub IndexMap<String, Ordering>);

impl OrderBy {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Add (or re-direct) a sort key. An existing key keeps its position.
    pub fn insert(&mut self, column: impl Into<String>, ordering: Ordering) {
        self.0.insert(column.into(), ordering);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Ordering)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Ordering)> for OrderBy {
    fn from_iter<T: IntoIterator<Item = (String, Ordering)>>(iter: T) -> Self {
        OrderBy(iter.into_iter().collect())
    }
}

impl ExpressionBuilder for OrderBy {
    /// Build `<col> ASC, <col> DESC, ...` (without the `ORDER BY` keyword)
    fn build(&self, builder: &mut SQLBuilder) -> SqlResult<()> {
        builder.push_iter(self.0.iter(), ", ", |builder, (column, ordering)| {
            builder.push_identifier(column);
            builder.push_space();
            builder.push_str(ordering.as_sql());
            Ok(())
        })
    }
}
