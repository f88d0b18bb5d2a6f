// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;

use super::class_map::{ClassMap, Relationship};
use crate::{SqlError, SqlResult};

/// Read-only lookup of how entity types map to storage.
pub trait SchemaInspector: Send + Sync {
    fn storage_name(&self, entity: &str) -> SqlResult<String>;

    /// The attribute columns of the entity type
    fn keys(&self, entity: &str) -> SqlResult<Vec<String>>;

    /// The named relationship of the entity type, if it declares one
    fn relationship(&self, entity: &str, name: &str) -> SqlResult<Option<Relationship>>;

    fn primary_key(&self, entity: &str) -> SqlResult<Vec<String>>;
}

/// A [`SchemaInspector`] driven by a map of entity type to [`ClassMap`].
#[derive(Debug, Clone, Default)]
pub struct ClassMapInspector {
    class_maps: IndexMap<String, ClassMap>,
}

impl ClassMapInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, entity: impl Into<String>, class_map: ClassMap) -> Self {
        self.class_maps.insert(entity.into(), class_map);
        self
    }

    /// Load a JSON document of the form `{ "<entity type>": <class map>, ... }`
    pub fn from_json(json: &str) -> SqlResult<Self> {
        let class_maps: IndexMap<String, ClassMap> =
            serde_json::from_str(json).map_err(|e| SqlError::Schema(e.to_string()))?;
        Ok(Self { class_maps })
    }

    pub fn class_map(&self, entity: &str) -> SqlResult<&ClassMap> {
        self.class_maps
            .get(entity)
            .ok_or_else(|| SqlError::EntityNotFound(entity.to_string()))
    }

    pub fn entities(&self) -> impl Iterator<Item = &String> {
        self.class_maps.keys()
    }
}

impl SchemaInspector for ClassMapInspector {
    fn storage_name(&self, entity: &str) -> SqlResult<String> {
        Ok(self.class_map(entity)?.storage_name.clone())
    }

    fn keys(&self, entity: &str) -> SqlResult<Vec<String>> {
        Ok(self.class_map(entity)?.keys.clone())
    }

    fn relationship(&self, entity: &str, name: &str) -> SqlResult<Option<Relationship>> {
        Ok(self.class_map(entity)?.relationships.get(name).cloned())
    }

    fn primary_key(&self, entity: &str) -> SqlResult<Vec<String>> {
        Ok(self.class_map(entity)?.primary_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::test_helper::test_inspector;

    #[test]
    fn lookups() {
        let inspector = test_inspector();

        assert_eq!(inspector.storage_name("User").unwrap(), "users");
        assert_eq!(inspector.primary_key("User").unwrap(), vec!["id"]);
        assert!(inspector.relationship("User", "address").unwrap().is_some());
        assert!(inspector.relationship("User", "nope").unwrap().is_none());
        assert_eq!(
            inspector.storage_name("Unicorn"),
            Err(SqlError::EntityNotFound("Unicorn".to_string()))
        );
    }

    #[test]
    fn from_json() {
        let inspector = ClassMapInspector::from_json(
            r#"{
                "User": { "storage_name": "users", "keys": ["id", "name"] },
                "Country": { "storage_name": "countries", "primary_key": "code", "keys": ["code"] }
            }"#,
        )
        .unwrap();

        assert_eq!(inspector.entities().count(), 2);
        assert_eq!(inspector.keys("User").unwrap(), vec!["id", "name"]);
        assert_eq!(inspector.primary_key("Country").unwrap(), vec!["code"]);
    }

    #[test]
    fn from_invalid_json() {
        assert!(matches!(
            ClassMapInspector::from_json(r#"{ "User": { "keys": [] } }"#),
            Err(SqlError::Schema(_))
        ));
    }
}
