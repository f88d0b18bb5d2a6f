// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::sql::{
    order::{OrderBy, Ordering},
    parentheses::{Condition, Parentheses},
    predicate::Predicate,
    SQLParam,
};

/// A query expressed against the object model rather than tables.
///
/// Keys in conditions and order-bys are column paths relative to `orm_class`: `name` refers to a
/// column of the root entity, `address.city` to the `city` column of the entity reached through
/// the `address` relationship. `withs` lists relation paths to eager-load.
///
/// The compiler (see [`crate::OrmQueryCompiler`]) turns this into a [`crate::Query`] with the
/// necessary joins; it is up to the compiler to decide how to reach each related table.
#[derive(Debug, Clone, PartialEq)]
pub struct OrmQuery {
    /// The root entity type
    pub orm_class: String,
    pub conditions: Parentheses,
    pub order_bys: OrderBy,
    pub withs: Vec<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl OrmQuery {
    pub fn new(orm_class: impl Into<String>) -> Self {
        Self {
            orm_class: orm_class.into(),
            conditions: Parentheses::and(),
            order_bys: OrderBy::default(),
            withs: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn filter(mut self, condition: impl Into<Condition>) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Shorthand for `filter(Predicate::value(path, operator, value))`
    pub fn where_value(
        self,
        path: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<SQLParam>,
    ) -> Self {
        self.filter(Predicate::value(path, operator, value))
    }

    pub fn order_by(mut self, path: impl Into<String>, ordering: Ordering) -> Self {
        self.order_bys.insert(path, ordering);
        self
    }

    /// Eager-load the relation path (each path is loaded once)
    pub fn with(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        if !self.withs.contains(&path) {
            self.withs.push(path);
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let query = OrmQuery::new("User")
            .where_value("address.city", "=", "Berlin")
            .order_by("name", Ordering::Desc)
            .with("address")
            .with("address")
            .limit(10);

        assert_eq!(query.orm_class, "User");
        assert_eq!(query.conditions.len(), 1);
        assert_eq!(query.withs, vec!["address".to_string()]);
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, None);
    }
}
