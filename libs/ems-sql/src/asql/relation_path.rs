// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Dotted relation paths such as `address.country.name`.
//!
//! A column path is a (possibly empty) relation path followed by a column: in
//! `address.country.name`, `address.country` is the relation path and `name` the column. Each
//! relation path gets an alias usable as a SQL identifier (`address__country`).

pub const PATH_SEPARATOR: char = '.';
pub const ALIAS_SEPARATOR: &str = "__";

/// Split a column path into its relation path (empty for a root column) and its column.
pub fn split_column_path(path: &str) -> (&str, &str) {
    path.rsplit_once(PATH_SEPARATOR).unwrap_or(("", path))
}

/// All prefixes of a relation path, shortest first: `a.b.c` yields `a`, `a.b`, `a.b.c`.
pub fn prefixes(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices(PATH_SEPARATOR)
        .map(move |(index, _)| &path[..index])
        .chain(std::iter::once(path))
        .filter(|prefix| !prefix.is_empty())
}

/// The relation path without its last segment (`None` for a single segment path)
pub fn parent(path: &str) -> Option<&str> {
    path.rsplit_once(PATH_SEPARATOR).map(|(parent, _)| parent)
}

/// The last segment: the name of the relationship on the parent's entity type
pub fn last_segment(path: &str) -> &str {
    split_column_path(path).1
}

/// Number of segments
pub fn depth(path: &str) -> usize {
    path.split(PATH_SEPARATOR).count()
}

pub fn alias_for(path: &str) -> String {
    path.replace(PATH_SEPARATOR, ALIAS_SEPARATOR)
}

/// The alias of a column selected through a relation (`address__city`)
pub fn column_alias(relation_alias: &str, column: &str) -> String {
    format!("{relation_alias}{ALIAS_SEPARATOR}{column}")
}
