// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// The storage description of one entity type: where it lives, its columns, and its named
/// relationships to other entity types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMap {
    /// Table name such as `users`
    pub storage_name: String,
    /// Primary key column(s). May be given as a single string in a schema document.
    #[serde(
        default = "default_primary_key",
        deserialize_with = "deserialize_one_or_many"
    )]
    pub primary_key: Vec<String>,
    /// All attribute columns (including the primary key)
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub relationships: IndexMap<String, Relationship>,
}

impl ClassMap {
    pub fn new(storage_name: impl Into<String>) -> Self {
        Self {
            storage_name: storage_name.into(),
            primary_key: default_primary_key(),
            keys: vec![],
            relationships: IndexMap::new(),
        }
    }

    pub fn with_primary_key<S: Into<String>>(mut self, primary_key: impl IntoIterator<Item = S>) -> Self {
        self.primary_key = primary_key.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_keys<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_relationship(mut self, name: impl Into<String>, relationship: Relationship) -> Self {
        self.relationships.insert(name.into(), relationship);
        self
    }
}

fn default_primary_key() -> Vec<String> {
    vec!["id".to_string()]
}

fn deserialize_one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(key) => vec![key],
        OneOrMany::Many(keys) => keys,
    })
}

/// A named association from an owner entity type to a related one.
///
/// For a to-one relation such as `User.address`, `owner_key` is `users.address_id` and
/// `related_key` is `addresses.id`. For a to-many relation such as `User.posts`, `owner_key` is
/// `users.id` and `related_key` is `posts.author_id`. Many-to-many relations go through a
/// [`Junction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// The related entity type
    pub related: String,
    pub owner_key: String,
    pub related_key: String,
    #[serde(default)]
    pub has_many: bool,
    #[serde(default)]
    pub belongs_to_many: bool,
    #[serde(default)]
    pub junction: Option<Junction>,
}

impl Relationship {
    /// Many-to-one or one-to-one
    pub fn to_one(
        related: impl Into<String>,
        owner_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        Self {
            related: related.into(),
            owner_key: owner_key.into(),
            related_key: related_key.into(),
            has_many: false,
            belongs_to_many: false,
            junction: None,
        }
    }

    pub fn has_many(
        related: impl Into<String>,
        owner_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        Self {
            has_many: true,
            ..Self::to_one(related, owner_key, related_key)
        }
    }

    pub fn belongs_to_many(
        related: impl Into<String>,
        owner_key: impl Into<String>,
        related_key: impl Into<String>,
        junction: Junction,
    ) -> Self {
        Self {
            belongs_to_many: true,
            junction: Some(junction),
            ..Self::to_one(related, owner_key, related_key)
        }
    }

    /// Whether following this relation may yield more than one row per owner row
    pub fn is_to_many(&self) -> bool {
        self.has_many || self.belongs_to_many || self.junction.is_some()
    }
}

/// The intermediate table of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    pub target: JunctionTarget,
    /// Column in the junction referring to the owner's `owner_key`
    pub owner_key: String,
    /// Column in the junction referring to the related entity's `related_key`
    pub related_key: String,
}

impl Junction {
    pub fn new(
        target: JunctionTarget,
        owner_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        Self {
            target,
            owner_key: owner_key.into(),
            related_key: related_key.into(),
        }
    }
}

/// Where the junction is stored: a bare table, or an entity type whose storage name is looked up
/// through the schema inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JunctionTarget {
    Table(String),
    Entity(String),
}
