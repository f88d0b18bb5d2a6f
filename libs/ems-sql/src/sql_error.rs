// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SqlError {
    #[error("Relation '{relation}' not found on entity '{entity}' (while resolving '{path}')")]
    RelationNotFound {
        entity: String,
        relation: String,
        path: String,
    },

    #[error("Relation path '{0}' is not part of the relation map")]
    KeyNotFound(String),

    #[error("Unsupported parameter: {0}")]
    UnsupportedParameter(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Entity '{0}' is not known to the schema inspector")]
    EntityNotFound(String),

    #[error("Schema: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Undefined object: {0}")]
    UndefinedObject(String),

    #[error("Native database error ({code:?}): {message}")]
    Native {
        code: Option<String>,
        message: String,
    },

    #[error("{0} {1}")]
    WithContext(String, #[source] Box<SqlError>),
}

pub type SqlResult<T> = Result<T, SqlError>;

impl SqlError {
    pub fn with_context(self, context: String) -> SqlError {
        SqlError::WithContext(context, Box::new(self))
    }

    pub(crate) fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        SqlError::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

pub trait WithContext {
    fn with_context(self, context: String) -> Self;
}

impl<T> WithContext for SqlResult<T> {
    fn with_context(self, context: String) -> SqlResult<T> {
        self.map_err(|e| e.with_context(context))
    }
}
