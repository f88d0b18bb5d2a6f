// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    asql::relation_path::{alias_for, depth, last_segment, parent, prefixes},
    schema::{class_map::Relationship, inspector::SchemaInspector},
    SqlError, SqlResult,
};

/// A relation path resolved against the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationMapEntry {
    /// The relation path such as `address.country`
    pub path: String,
    /// The entity type declaring the relationship (`Address` for `address.country`)
    pub owner: String,
    pub relationship: Relationship,
    /// The table alias for the related entity (`address__country`)
    pub alias: String,
}

impl RelationMapEntry {
    pub fn parent_path(&self) -> Option<&str> {
        parent(&self.path)
    }

    /// The relationship name on the owner entity type
    pub fn name(&self) -> &str {
        last_segment(&self.path)
    }
}

/// Relation path -> resolved relationship, for one compilation.
///
/// Entries are kept in resolution order: every path comes after its parent. Consider the paths
/// referenced by a query on `User`:
/// ```text
/// [ "posts.tags", "address.country", "address" ]
/// ```
/// They (and all their prefixes) resolve in the order:
/// ```text
/// address          (User.address     -> Address, alias "address")
/// posts            (User.posts       -> Post,    alias "posts")
/// address.country  (Address.country  -> Country, alias "address__country")
/// posts.tags       (Post.tags        -> Tag,     alias "posts__tags")
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelationMap {
    entries: IndexMap<String, RelationMapEntry>,
}

impl RelationMap {
    /// Resolve `paths` (and every prefix of them) starting at `root_entity`.
    ///
    /// Paths are processed by depth and then by name, so the relationship for `a.b` is always
    /// looked up on the entity type that `a` resolved to.
    pub fn build<'p>(
        root_entity: &str,
        paths: impl IntoIterator<Item = &'p str>,
        inspector: &dyn SchemaInspector,
    ) -> SqlResult<Self> {
        let mut all_paths: Vec<&str> = paths.into_iter().flat_map(|path| prefixes(path)).collect();
        all_paths.sort_by(|a, b| depth(a).cmp(&depth(b)).then_with(|| a.cmp(b)));
        all_paths.dedup();

        let mut entries: IndexMap<String, RelationMapEntry> = IndexMap::new();

        for path in all_paths {
            let owner = match parent(path) {
                Some(parent_path) => entries
                    .get(parent_path)
                    .map(|parent_entry| parent_entry.relationship.related.clone())
                    .ok_or_else(|| SqlError::KeyNotFound(parent_path.to_string()))?,
                None => root_entity.to_string(),
            };

            let name = last_segment(path);
            let relationship =
                inspector
                    .relationship(&owner, name)?
                    .ok_or_else(|| SqlError::RelationNotFound {
                        entity: owner.clone(),
                        relation: name.to_string(),
                        path: path.to_string(),
                    })?;

            let alias = alias_for(path);
            debug!(
                path,
                alias = alias.as_str(),
                related = relationship.related.as_str(),
                to_many = relationship.is_to_many(),
                "Resolved relation"
            );

            entries.insert(
                path.to_string(),
                RelationMapEntry {
                    path: path.to_string(),
                    owner,
                    relationship,
                    alias,
                },
            );
        }

        Ok(Self { entries })
    }

    pub fn get(&self, path: &str) -> Option<&RelationMapEntry> {
        self.entries.get(path)
    }

    /// Like [`RelationMap::get`], but a missing path is an error
    pub fn entry(&self, path: &str) -> SqlResult<&RelationMapEntry> {
        self.get(path)
            .ok_or_else(|| SqlError::KeyNotFound(path.to_string()))
    }

    pub fn alias(&self, path: &str) -> SqlResult<&str> {
        self.entry(path).map(|entry| entry.alias.as_str())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Entries in resolution order (parents before children)
    pub fn iter(&self) -> impl Iterator<Item = &RelationMapEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
