// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{predicate::Predicate, ExpressionBuilder, SQLBuilder, SQLParam};
use crate::SqlResult;

/// The boolean connective joining the members of a [`Parentheses`] group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connective {
    #[default]
    And,
    Or,
}

impl Connective {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

/// A member of a condition group.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Predicate(Predicate),
    Group(Parentheses),
    /// A pre-formatted SQL fragment, emitted verbatim (escape hatch for conditions the model
    /// cannot express)
    Raw(String),
}

impl From<Predicate> for Condition {
    fn from(predicate: Predicate) -> Self {
        Condition::Predicate(predicate)
    }
}

impl From<Parentheses> for Condition {
    fn from(group: Parentheses) -> Self {
        Condition::Group(group)
    }
}

/// An ordered group of conditions joined by one connective. Groups nest, forming a tree.
///
/// The top-level group renders without surrounding parentheses. A nested group is wrapped in
/// parentheses only when it has more than one member and its connective differs from the
/// enclosing one (`a AND (b OR c)`); otherwise its members are spliced into the parent's list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parentheses {
    pub connective: Connective,
    pub conditions: Vec<Condition>,
}

impl Parentheses {
    pub fn new(connective: Connective) -> Self {
        Self {
            connective,
            conditions: vec![],
        }
    }

    pub fn and() -> Self {
        Self::new(Connective::And)
    }

    pub fn or() -> Self {
        Self::new(Connective::Or)
    }

    /// Add a condition (builder style)
    pub fn with(mut self, condition: impl Into<Condition>) -> Self {
        self.push(condition);
        self
    }

    pub fn push(&mut self, condition: impl Into<Condition>) {
        self.conditions.push(condition.into());
    }

    /// Add `left operator value`
    pub fn where_value(
        &mut self,
        left: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<SQLParam>,
    ) -> &mut Self {
        self.push(Predicate::value(left, operator, value));
        self
    }

    /// Add `left operator right` where both sides are keys
    pub fn where_keys(
        &mut self,
        left: impl Into<String>,
        operator: impl Into<String>,
        right: impl Into<String>,
    ) -> &mut Self {
        self.push(Predicate::keys(left, operator, right));
        self
    }

    /// True if the group (recursively) holds no renderable condition
    pub fn is_empty(&self) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Group(group) => group.is_empty(),
            Condition::Raw(sql) => sql.trim().is_empty(),
            Condition::Predicate(_) => false,
        })
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// All predicates in the tree, depth first
    pub fn predicates(&self) -> Vec<&Predicate> {
        fn collect<'a>(group: &'a Parentheses, acc: &mut Vec<&'a Predicate>) {
            for condition in &group.conditions {
                match condition {
                    Condition::Predicate(predicate) => acc.push(predicate),
                    Condition::Group(group) => collect(group, acc),
                    Condition::Raw(_) => {}
                }
            }
        }

        let mut acc = vec![];
        collect(self, &mut acc);
        acc
    }

    /// Rebuild the tree with each predicate replaced by the result of `map`, keeping the
    /// connectives and nesting.
    pub fn try_map_predicates<F>(&self, map: &F) -> SqlResult<Parentheses>
    where
        F: Fn(&Predicate) -> SqlResult<Predicate>,
    {
        let conditions = self
            .conditions
            .iter()
            .map(|condition| {
                Ok(match condition {
                    Condition::Predicate(predicate) => Condition::Predicate(map(predicate)?),
                    Condition::Group(group) => Condition::Group(group.try_map_predicates(map)?),
                    Condition::Raw(sql) => Condition::Raw(sql.clone()),
                })
            })
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(Parentheses {
            connective: self.connective,
            conditions,
        })
    }
}

impl ExpressionBuilder for Parentheses {
    fn build(&self, builder: &mut SQLBuilder) -> SqlResult<()> {
        let renderable: Vec<&Condition> = self
            .conditions
            .iter()
            .filter(|condition| match condition {
                Condition::Group(group) => !group.is_empty(),
                Condition::Raw(sql) => !sql.trim().is_empty(),
                Condition::Predicate(_) => true,
            })
            .collect();

        let separator = format!(" {} ", self.connective.as_sql());

        builder.push_iter(renderable.into_iter(), &separator, |builder, condition| {
            match condition {
                Condition::Predicate(predicate) => predicate.build(builder),
                Condition::Raw(sql) => {
                    builder.push_str(sql);
                    Ok(())
                }
                Condition::Group(group) => {
                    let needs_parens =
                        group.connective != self.connective && group.renderable_len() > 1;
                    if needs_parens {
                        builder.push('(');
                        group.build(builder)?;
                        builder.push(')');
                        Ok(())
                    } else {
                        group.build(builder)
                    }
                }
            }
        })
    }
}

impl Parentheses {
    fn renderable_len(&self) -> usize {
        self.conditions
            .iter()
            .filter(|condition| match condition {
                Condition::Group(group) => !group.is_empty(),
                Condition::Raw(sql) => !sql.trim().is_empty(),
                Condition::Predicate(_) => true,
            })
            .count()
    }
}
