// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use serde::Serialize;

/// A value bound to a `?` placeholder. The renderer never inlines these into the SQL text (except
/// for debugging, see [`crate::QueryRenderer::interpolate`]), so the execution layer receives them in
/// the same order as the placeholders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SQLParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl SQLParam {
    pub fn is_null(&self) -> bool {
        matches!(self, SQLParam::Null)
    }

    /// Name of the variant (used in error messages)
    pub fn kind(&self) -> &'static str {
        match self {
            SQLParam::Null => "null",
            SQLParam::Bool(_) => "bool",
            SQLParam::Int(_) => "int",
            SQLParam::Float(_) => "float",
            SQLParam::String(_) => "string",
            SQLParam::Bytes(_) => "bytes",
        }
    }
}

impl Display for SQLParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SQLParam::Null => write!(f, "NULL"),
            SQLParam::Bool(b) => write!(f, "{b}"),
            SQLParam::Int(i) => write!(f, "{i}"),
            SQLParam::Float(v) => write!(f, "{v}"),
            SQLParam::String(s) => write!(f, "{s}"),
            SQLParam::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

impl From<bool> for SQLParam {
    fn from(value: bool) -> Self {
        SQLParam::Bool(value)
    }
}

impl From<i32> for SQLParam {
    fn from(value: i32) -> Self {
        SQLParam::Int(value.into())
    }
}

impl From<i64> for SQLParam {
    fn from(value: i64) -> Self {
        SQLParam::Int(value)
    }
}

impl From<u32> for SQLParam {
    fn from(value: u32) -> Self {
        SQLParam::Int(value.into())
    }
}

impl From<f64> for SQLParam {
    fn from(value: f64) -> Self {
        SQLParam::Float(value)
    }
}

impl From<&str> for SQLParam {
    fn from(value: &str) -> Self {
        SQLParam::String(value.to_string())
    }
}

impl From<String> for SQLParam {
    fn from(value: String) -> Self {
        SQLParam::String(value)
    }
}

impl From<Vec<u8>> for SQLParam {
    fn from(value: Vec<u8>) -> Self {
        SQLParam::Bytes(value)
    }
}

impl<T> From<Option<T>> for SQLParam
where
    T: Into<SQLParam>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SQLParam::Null)
    }
}
