// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{expression::Expression, ExpressionBuilder, SQLBuilder, SQLParam};
use crate::{SqlError, SqlResult};

/// Operators a predicate may use. Operators are emitted verbatim, so anything outside this list
/// is rejected.
const SUPPORTED_OPERATORS: &[&str] = &[
    "=", "!=", "<>", "<", "<=", ">", ">=", "LIKE", "NOT LIKE", "ILIKE", "NOT ILIKE", "IN", "NOT IN",
    "IS", "IS NOT",
];

/// One side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A column, possibly qualified or a dotted relation path (`address.city`)
    Key(String),
    Expression(Expression),
    Value(SQLParam),
    List(Vec<SQLParam>),
}

impl Operand {
    pub fn key(name: impl Into<String>) -> Self {
        Operand::Key(name.into())
    }

    pub fn value(value: impl Into<SQLParam>) -> Self {
        Operand::Value(value.into())
    }

    pub fn list<T: Into<SQLParam>>(values: impl IntoIterator<Item = T>) -> Self {
        Operand::List(values.into_iter().map(Into::into).collect())
    }

    fn kind(&self) -> &'static str {
        match self {
            Operand::Key(_) => "key",
            Operand::Expression(_) => "expression",
            Operand::Value(_) => "value",
            Operand::List(_) => "list",
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, Operand::Value(SQLParam::Null))
    }
}

impl From<Expression> for Operand {
    fn from(expression: Expression) -> Self {
        Operand::Expression(expression)
    }
}

impl From<SQLParam> for Operand {
    fn from(value: SQLParam) -> Self {
        Operand::Value(value)
    }
}

/// `left operator right`, for example `address.city = ?`.
///
/// `right_is_key` marks a right side given as a plain string that names a column (to be quoted as
/// an identifier) rather than a literal (to be bound as a parameter).
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub left: Operand,
    pub operator: Option<String>,
    pub right: Operand,
    pub right_is_key: bool,
}

impl Predicate {
    pub fn new(left: Operand, operator: impl Into<String>, right: Operand) -> Self {
        Self {
            left,
            operator: Some(operator.into()),
            right,
            right_is_key: false,
        }
    }

    /// Compare a key with a literal value.
    pub fn value(
        left: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<SQLParam>,
    ) -> Self {
        Self::new(Operand::key(left), operator, Operand::value(value))
    }

    /// Compare two keys, such as in a join condition `users.address_id = address.id`.
    pub fn keys(
        left: impl Into<String>,
        operator: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self::new(Operand::key(left), operator, Operand::value(right.into())).with_right_is_key(true)
    }

    /// Compare a key with each of the values (typically with `IN`/`NOT IN`).
    pub fn list<T: Into<SQLParam>>(
        left: impl Into<String>,
        operator: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        Self::new(Operand::key(left), operator, Operand::list(values))
    }

    /// A predicate without an operator, rendered as just the left side (a boolean column, for
    /// example).
    pub fn bare(left: Operand) -> Self {
        Self {
            left,
            operator: None,
            right: Operand::Value(SQLParam::Null),
            right_is_key: false,
        }
    }

    pub fn with_right_is_key(mut self, right_is_key: bool) -> Self {
        self.right_is_key = right_is_key;
        self
    }

    /// The operator in canonical form (upper case, single spaces). Fails for operators outside the
    /// supported set.
    pub fn normalized_operator(&self) -> SqlResult<Option<String>> {
        self.operator
            .as_deref()
            .map(|operator| {
                let normalized = operator
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_uppercase();

                if SUPPORTED_OPERATORS.contains(&normalized.as_str()) {
                    Ok(normalized)
                } else {
                    Err(SqlError::UnsupportedParameter(format!(
                        "Unsupported operator '{operator}'"
                    )))
                }
            })
            .transpose()
    }

    /// The right side as a key name, if it is to be rendered as an identifier.
    pub fn right_key(&self) -> SqlResult<Option<&str>> {
        match (&self.right, self.right_is_key) {
            (Operand::Key(name), _) => Ok(Some(name)),
            (Operand::Value(SQLParam::String(name)), true) => Ok(Some(name)),
            (Operand::Value(value), true) => Err(SqlError::type_mismatch(
                "a key name on the right side",
                value.kind(),
            )),
            (other, true) if !matches!(other, Operand::Expression(_)) => Err(
                SqlError::type_mismatch("a key name on the right side", other.kind()),
            ),
            _ => Ok(None),
        }
    }
}

impl ExpressionBuilder for Predicate {
    /// Build a predicate into a SQL string.
    fn build(&self, builder: &mut SQLBuilder) -> SqlResult<()> {
        let operator = match self.normalized_operator()? {
            Some(operator) => operator,
            None => return build_left(&self.left, builder),
        };

        if operator == "IN" || operator == "NOT IN" {
            return build_in(self, &operator, builder);
        }

        if self.right.is_null() {
            let null_check = match operator.as_str() {
                "=" | "IS" => Some("IS NULL"),
                "!=" | "<>" | "IS NOT" => Some("IS NOT NULL"),
                _ => None,
            };
            if let Some(null_check) = null_check {
                build_left(&self.left, builder)?;
                builder.push_space();
                builder.push_str(null_check);
                return Ok(());
            }
        }

        build_left(&self.left, builder)?;
        builder.push_space();
        builder.push_str(&operator);
        builder.push_space();

        if let Some(key) = self.right_key()? {
            builder.push_identifier(key);
            return Ok(());
        }

        match &self.right {
            Operand::Expression(expression) => expression.build(builder),
            Operand::Value(value) => {
                builder.push_param(value.clone());
                Ok(())
            }
            Operand::List(_) => Err(SqlError::type_mismatch(
                format!("a single value for operator '{operator}'"),
                "list",
            )),
            // Handled by `right_key` above
            Operand::Key(key) => {
                builder.push_identifier(key);
                Ok(())
            }
        }
    }
}

fn build_left(left: &Operand, builder: &mut SQLBuilder) -> SqlResult<()> {
    match left {
        Operand::Key(name) => {
            builder.push_identifier(name);
            Ok(())
        }
        Operand::Expression(expression) => expression.build(builder),
        other => Err(SqlError::type_mismatch(
            "a key or expression on the left side",
            other.kind(),
        )),
    }
}

/// `left IN (?, ?, ...)`, with one binding per element.
fn build_in(predicate: &Predicate, operator: &str, builder: &mut SQLBuilder) -> SqlResult<()> {
    let negated = operator == "NOT IN";

    match &predicate.right {
        Operand::List(values) if values.is_empty() => {
            // `x IN ()` is not valid SQL; an empty set matches nothing (or everything when negated)
            builder.push_str(if negated { "1 = 1" } else { "1 = 0" });
            Ok(())
        }
        Operand::List(values) => {
            build_left(&predicate.left, builder)?;
            builder.push_space();
            builder.push_str(operator);
            builder.push_str(" (");
            builder.push_iter(values.iter(), ", ", |builder, value| {
                builder.push_param(value.clone());
                Ok(())
            })?;
            builder.push(')');
            Ok(())
        }
        Operand::Value(SQLParam::Null) => {
            build_left(&predicate.left, builder)?;
            builder.push_str(if negated { " IS NOT NULL" } else { " IS NULL" });
            Ok(())
        }
        Operand::Value(value) => {
            build_left(&predicate.left, builder)?;
            builder.push_space();
            builder.push_str(operator);
            builder.push_str(" (");
            builder.push_param(value.clone());
            builder.push(')');
            Ok(())
        }
        Operand::Expression(expression) => {
            build_left(&predicate.left, builder)?;
            builder.push_space();
            builder.push_str(operator);
            builder.push_space();

            let parenthesized = match expression {
                Expression::Raw(sql) | Expression::Sql { sql, .. } => sql.starts_with('('),
                Expression::Key { .. } => false,
            };
            if parenthesized {
                expression.build(builder)
            } else {
                builder.push('(');
                expression.build(builder)?;
                builder.push(')');
                Ok(())
            }
        }
        Operand::Key(_) => Err(SqlError::type_mismatch(
            format!("a list of values for operator '{operator}'"),
            "key",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::Postgres;

    #[test]
    fn value_predicate() {
        let predicate = Predicate::value("address.city", "=", "Berlin");
        assert_binding!(
            predicate.to_sql(Some(&Postgres)).unwrap(),
            r#""address"."city" = ?"#,
            "Berlin"
        );
    }

    #[test]
    fn key_predicate() {
        let predicate = Predicate::keys("users.address_id", "=", "address.id");
        assert_binding!(
            predicate.to_sql(Some(&Postgres)).unwrap(),
            r#""users"."address_id" = "address"."id""#
        );
    }

    #[test]
    fn bare_predicate_renders_left_side() {
        let predicate = Predicate::bare(Operand::key("users.active"));
        assert_binding!(predicate.to_sql(Some(&Postgres)).unwrap(), r#""users"."active""#);
    }

    #[test]
    fn null_comparisons_are_rewritten() {
        for (operator, expected) in [
            ("=", r#""users"."deleted_at" IS NULL"#),
            ("in", r#""users"."deleted_at" IS NULL"#),
            ("!=", r#""users"."deleted_at" IS NOT NULL"#),
            ("<>", r#""users"."deleted_at" IS NOT NULL"#),
            ("not in", r#""users"."deleted_at" IS NOT NULL"#),
        ] {
            let predicate = Predicate::value("users.deleted_at", operator, SQLParam::Null);
            assert_binding!(predicate.to_sql(Some(&Postgres)).unwrap(), expected);
        }
    }

    #[test]
    fn null_with_ordering_operator_is_bound() {
        let predicate = Predicate::value("users.age", ">", SQLParam::Null);
        assert_binding!(
            predicate.to_sql(Some(&Postgres)).unwrap(),
            r#""users"."age" > ?"#,
            SQLParam::Null
        );
    }

    #[test]
    fn in_list_has_one_placeholder_per_value() {
        let predicate = Predicate::list("users.id", "in", [3, 1, 2]);
        assert_binding!(
            predicate.to_sql(Some(&Postgres)).unwrap(),
            r#""users"."id" IN (?, ?, ?)"#,
            3,
            1,
            2
        );
    }

    #[test]
    fn empty_in_list() {
        let predicate = Predicate::list("users.id", "IN", Vec::<i64>::new());
        assert_binding!(predicate.to_sql(Some(&Postgres)).unwrap(), "1 = 0");

        let predicate = Predicate::list("users.id", "NOT IN", Vec::<i64>::new());
        assert_binding!(predicate.to_sql(Some(&Postgres)).unwrap(), "1 = 1");
    }

    #[test]
    fn in_subquery() {
        let predicate = Predicate::new(
            Operand::key("users.id"),
            "IN",
            Operand::Expression(Expression::sql(
                "SELECT author_id FROM posts WHERE score > ?",
                vec![SQLParam::from(10)],
            )),
        );
        assert_binding!(
            predicate.to_sql(Some(&Postgres)).unwrap(),
            r#""users"."id" IN (SELECT author_id FROM posts WHERE score > ?)"#,
            10
        );
    }

    #[test]
    fn unsupported_operator() {
        let predicate = Predicate::value("users.id", "; DROP TABLE users", 1);
        assert!(matches!(
            predicate.to_sql(Some(&Postgres)),
            Err(SqlError::UnsupportedParameter(message)) if message.contains("DROP TABLE")
        ));
    }

    #[test]
    fn right_is_key_requires_string() {
        let predicate =
            Predicate::new(Operand::key("users.id"), "=", Operand::value(5)).with_right_is_key(true);
        assert!(matches!(
            predicate.to_sql(Some(&Postgres)),
            Err(SqlError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn list_on_the_left_is_rejected() {
        let predicate = Predicate::new(Operand::list([1, 2]), "=", Operand::value(1));
        assert!(matches!(
            predicate.to_sql(Some(&Postgres)),
            Err(SqlError::TypeMismatch { .. })
        ));
    }
}
