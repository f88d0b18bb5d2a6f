// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#[macro_use]
#[cfg(test)]
mod test_util;

pub mod dialect;
pub mod expression;
pub mod join;
pub mod order;
pub mod parentheses;
pub mod predicate;
pub mod query;
pub mod query_renderer;

mod expression_builder;
mod sql_builder;
mod sql_param;

pub use expression_builder::ExpressionBuilder;
pub use sql_builder::SQLBuilder;
pub use sql_param::SQLParam;
