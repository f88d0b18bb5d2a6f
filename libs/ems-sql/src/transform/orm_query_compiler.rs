// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashSet;

use tracing::{debug, instrument};

use super::relation_map::{RelationMap, RelationMapEntry};
use crate::{
    asql::{
        orm_query::OrmQuery,
        relation_path::{column_alias, prefixes, split_column_path},
    },
    schema::{class_map::JunctionTarget, inspector::SchemaInspector},
    sql::{
        expression::Expression,
        join::JoinClause,
        parentheses::{Connective, Parentheses},
        predicate::{Operand, Predicate},
        query::Query,
        SQLParam,
    },
    SqlResult,
};

/// The result of compiling an [`OrmQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledOrmQuery {
    pub query: Query,
    pub relation_map: RelationMap,
    /// To-many relation paths requested for eager loading. Their rows are not part of `query`
    /// and must be loaded by a separate query (keyed by the root's primary key).
    pub deferred_relations: Vec<String>,
}

/// Compile an [`OrmQuery`] into a [`Query`].
///
/// Consider a query on `User` with the condition `address.city = 'Berlin'`, ordered by
/// `address.country.name` and eager-loading `address`. The compiler:
///
/// 1. Selects the root table (`users`) and its columns, primary key first.
/// 2. Resolves every relation path the query mentions (`address`, `address.country`) into a
///    [`RelationMap`].
/// 3. Adds the columns of eager-loaded to-one relations, aliased by path (`address.city AS
///    address__city`). To-many relations are reported in
///    [`CompiledOrmQuery::deferred_relations`] instead, since joining their columns would
///    multiply the root rows.
/// 4. Rewrites column paths to use the relation aliases (`address.country.name` becomes
///    `address__country.name`; a plain `name` becomes `users.name`).
/// 5. Copies the rewritten conditions (keeping their nesting) and order-bys into the query.
/// 6. Adds a `LEFT JOIN` per relation map entry (two for relations through a junction). A join
///    over a to-many relation makes the query `DISTINCT`.
///
/// The result renders (with Postgres) as:
/// ```sql
/// SELECT "users"."id", ..., "address"."city" AS "address__city", ...
/// FROM "users"
/// LEFT JOIN "addresses" AS "address" ON "users"."address_id" = "address"."id"
/// LEFT JOIN "countries" AS "address__country" ON "address"."country_id" = "address__country"."id"
/// WHERE "address"."city" = ?
/// ORDER BY "address__country"."name" ASC
/// ```
pub struct OrmQueryCompiler<'s> {
    inspector: &'s dyn SchemaInspector,
}

impl<'s> OrmQueryCompiler<'s> {
    pub fn new(inspector: &'s dyn SchemaInspector) -> Self {
        Self { inspector }
    }

    /// Compile `orm_query` into a select, extending `existing` if given.
    #[instrument(
        name = "OrmQueryCompiler::to_select",
        skip_all,
        fields(entity = %orm_query.orm_class)
    )]
    pub fn to_select(&self, orm_query: &OrmQuery, existing: Option<Query>) -> SqlResult<Query> {
        self.compile(orm_query, existing)
            .map(|compiled| compiled.query)
    }

    #[instrument(
        name = "OrmQueryCompiler::compile",
        skip_all,
        fields(entity = %orm_query.orm_class)
    )]
    pub fn compile(
        &self,
        orm_query: &OrmQuery,
        existing: Option<Query>,
    ) -> SqlResult<CompiledOrmQuery> {
        let entity = orm_query.orm_class.as_str();
        let root_table = self.inspector.storage_name(entity)?;

        let mut query = existing.unwrap_or_else(|| Query::select(root_table.clone()));
        for column in self.root_columns(entity, &root_table)? {
            query.add_column(column);
        }

        let paths = referenced_paths(orm_query)?;
        let relation_map =
            RelationMap::build(entity, paths.iter().map(String::as_str), self.inspector)?;

        let deferred_relations =
            self.add_eager_loaded_columns(&mut query, &orm_query.withs, &relation_map)?;

        let conditions = orm_query
            .conditions
            .try_map_predicates(&|predicate: &Predicate| {
                translate_predicate(predicate, &root_table, &relation_map)
            })?;
        if !conditions.is_empty() {
            if query.conditions.is_empty() {
                query.conditions = conditions;
            } else if query.conditions.connective == Connective::And {
                query.conditions.push(conditions);
            } else {
                // The compiled conditions must narrow an OR group, not add an alternative to it
                let existing = std::mem::take(&mut query.conditions);
                query.conditions = Parentheses::and().with(existing).with(conditions);
            }
        }

        for (path, ordering) in orm_query.order_bys.iter() {
            query
                .order_bys
                .insert(translate_key(path, &root_table, &relation_map)?, *ordering);
        }

        self.add_joins(&mut query, &root_table, &relation_map)?;

        if orm_query.limit.is_some() {
            query.limit = orm_query.limit;
        }
        if orm_query.offset.is_some() {
            query.offset = orm_query.offset;
        }

        debug!(
            relations = relation_map.len(),
            joins = query.joins.len(),
            distinct = query.distinct,
            deferred = ?deferred_relations,
            "Compiled ORM query"
        );

        Ok(CompiledOrmQuery {
            query,
            relation_map,
            deferred_relations,
        })
    }

    /// Primary key columns first, then the remaining keys. Falls back to `<table>.*` for an
    /// entity without declared keys.
    fn root_columns(&self, entity: &str, root_table: &str) -> SqlResult<Vec<Expression>> {
        let primary_key = self.inspector.primary_key(entity)?;
        let keys = self.inspector.keys(entity)?;

        let mut columns: Vec<&String> = primary_key.iter().collect();
        columns.extend(keys.iter().filter(|key| !primary_key.contains(key)));

        if columns.is_empty() {
            return Ok(vec![Expression::key(format!("{root_table}.*"))]);
        }

        Ok(columns
            .into_iter()
            .map(|column| Expression::key(format!("{root_table}.{column}")))
            .collect())
    }

    /// Select the columns of each to-one relation along the eager-loaded paths. Returns the
    /// to-many paths, which are left for a separate query (along with anything below them).
    fn add_eager_loaded_columns(
        &self,
        query: &mut Query,
        withs: &[String],
        relation_map: &RelationMap,
    ) -> SqlResult<Vec<String>> {
        let mut deferred: Vec<String> = vec![];
        let mut processed: HashSet<&str> = HashSet::new();

        for with in withs {
            for path in prefixes(with) {
                let entry = relation_map.entry(path)?;

                if entry.relationship.is_to_many() {
                    if !deferred.iter().any(|deferred_path| deferred_path == path) {
                        deferred.push(path.to_string());
                    }
                    break;
                }

                if !processed.insert(path) {
                    continue;
                }

                for column in self.inspector.keys(&entry.relationship.related)? {
                    query.add_column(Expression::aliased_key(
                        format!("{}.{column}", entry.alias),
                        column_alias(&entry.alias, &column),
                    ));
                }
            }
        }

        if !deferred.is_empty() {
            debug!(?deferred, "Deferring to-many eager loads");
        }

        Ok(deferred)
    }

    fn add_joins(
        &self,
        query: &mut Query,
        root_table: &str,
        relation_map: &RelationMap,
    ) -> SqlResult<()> {
        for entry in relation_map.iter() {
            let owner_alias = match entry.parent_path() {
                Some(parent_path) => relation_map.alias(parent_path)?,
                None => root_table,
            };

            for join in self.joins_for(entry, owner_alias)? {
                if !query.has_join(join.visible_name()) {
                    query.joins.push(join);
                }
            }

            if entry.relationship.is_to_many() {
                query.distinct = true;
            }
        }

        Ok(())
    }

    /// `owner -> related`, or `owner -> junction -> related` for a many-to-many relation
    fn joins_for(&self, entry: &RelationMapEntry, owner_alias: &str) -> SqlResult<Vec<JoinClause>> {
        let relationship = &entry.relationship;
        let related_table = self.inspector.storage_name(&relationship.related)?;
        let related_alias = entry.alias.as_str();

        let joins = match &relationship.junction {
            Some(junction) => {
                let junction_table = self.junction_storage_name(&junction.target)?;
                let pivot_alias = format!("{related_alias}_pivot");

                vec![
                    JoinClause::left(
                        junction_table.clone(),
                        alias_unless_same(&pivot_alias, &junction_table),
                    )
                    .on(
                        format!("{owner_alias}.{}", relationship.owner_key),
                        format!("{pivot_alias}.{}", junction.owner_key),
                    ),
                    JoinClause::left(
                        related_table.clone(),
                        alias_unless_same(related_alias, &related_table),
                    )
                    .on(
                        format!("{pivot_alias}.{}", junction.related_key),
                        format!("{related_alias}.{}", relationship.related_key),
                    ),
                ]
            }
            None => vec![JoinClause::left(
                related_table.clone(),
                alias_unless_same(related_alias, &related_table),
            )
            .on(
                format!("{owner_alias}.{}", relationship.owner_key),
                format!("{related_alias}.{}", relationship.related_key),
            )],
        };

        Ok(joins)
    }

    fn junction_storage_name(&self, target: &JunctionTarget) -> SqlResult<String> {
        match target {
            JunctionTarget::Table(table) => Ok(table.clone()),
            JunctionTarget::Entity(entity) => self.inspector.storage_name(entity),
        }
    }
}

fn alias_unless_same(alias: &str, table: &str) -> Option<String> {
    (alias != table).then(|| alias.to_string())
}

/// The relation paths mentioned by the query's conditions, order-bys and eager loads
fn referenced_paths(orm_query: &OrmQuery) -> SqlResult<Vec<String>> {
    fn relation_path(key: &str) -> Option<String> {
        let (relation_path, _) = split_column_path(key);
        (!relation_path.is_empty()).then(|| relation_path.to_string())
    }

    let mut paths = vec![];

    for predicate in orm_query.conditions.predicates() {
        if let Operand::Key(key) = &predicate.left {
            paths.extend(relation_path(key));
        }
        if let Some(key) = predicate.right_key()? {
            paths.extend(relation_path(key));
        }
    }

    for (key, _) in orm_query.order_bys.iter() {
        paths.extend(relation_path(key));
    }

    paths.extend(orm_query.withs.iter().cloned());

    Ok(paths)
}

/// `address.city` -> `<alias of address>.city`, `name` -> `<root table>.name`
fn translate_key(key: &str, root_table: &str, relation_map: &RelationMap) -> SqlResult<String> {
    let (relation_path, column) = split_column_path(key);

    if relation_path.is_empty() {
        Ok(format!("{root_table}.{column}"))
    } else {
        Ok(format!("{}.{column}", relation_map.alias(relation_path)?))
    }
}

fn translate_predicate(
    predicate: &Predicate,
    root_table: &str,
    relation_map: &RelationMap,
) -> SqlResult<Predicate> {
    let translate_operand = |operand: &Operand| -> SqlResult<Operand> {
        Ok(match operand {
            Operand::Key(key) => Operand::Key(translate_key(key, root_table, relation_map)?),
            other => other.clone(),
        })
    };

    let left = translate_operand(&predicate.left)?;
    let right = match (&predicate.right, predicate.right_is_key) {
        (Operand::Value(SQLParam::String(key)), true) => Operand::Value(SQLParam::String(
            translate_key(key, root_table, relation_map)?,
        )),
        (right, _) => translate_operand(right)?,
    };

    Ok(Predicate {
        left,
        operator: predicate.operator.clone(),
        right,
        right_is_key: predicate.right_is_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sql::{order::Ordering, parentheses::Condition},
        transform::test_util::TestSetup,
        SqlError,
    };

    #[test_log::test]
    fn simple_select_with_join() {
        TestSetup::with_setup(|TestSetup { inspector, renderer }| {
            let orm_query = OrmQuery::new("User")
                .where_value("address.city", "=", "Berlin")
                .with("address");

            let compiler = OrmQueryCompiler::new(&inspector);
            let query = compiler.to_select(&orm_query, None).unwrap();

            assert!(!query.distinct);
            assert_eq!(query.joins.len(), 1);

            assert_binding!(
                renderer.render(&query).unwrap(),
                concat!(
                    r#"SELECT "users"."id", "users"."name", "users"."email", "users"."address_id", "#,
                    r#""address"."id" AS "address__id", "address"."street" AS "address__street", "#,
                    r#""address"."city" AS "address__city", "address"."country_id" AS "address__country_id""#,
                    "\n",
                    r#"FROM "users""#,
                    "\n",
                    r#"LEFT JOIN "addresses" AS "address" ON "users"."address_id" = "address"."id""#,
                    "\n",
                    r#"WHERE "address"."city" = ?"#
                ),
                "Berlin"
            );
        })
    }

    #[test]
    fn filtering_without_eager_loading_adds_no_columns() {
        TestSetup::with_setup(|TestSetup { inspector, renderer }| {
            let orm_query = OrmQuery::new("User")
                .where_value("address.country.code", "=", "DE")
                .where_value("name", "LIKE", "A%")
                .order_by("address.country.name", Ordering::Desc);

            let query = OrmQueryCompiler::new(&inspector)
                .to_select(&orm_query, None)
                .unwrap();

            assert_binding!(
                renderer.render(&query).unwrap(),
                concat!(
                    r#"SELECT "users"."id", "users"."name", "users"."email", "users"."address_id""#,
                    "\n",
                    r#"FROM "users""#,
                    "\n",
                    r#"LEFT JOIN "addresses" AS "address" ON "users"."address_id" = "address"."id""#,
                    "\n",
                    r#"LEFT JOIN "countries" AS "address__country" ON "address"."country_id" = "address__country"."id""#,
                    "\n",
                    r#"WHERE "address__country"."code" = ? AND "users"."name" LIKE ?"#,
                    "\n",
                    r#"ORDER BY "address__country"."name" DESC"#
                ),
                "DE",
                "A%"
            );
        })
    }

    #[test]
    fn many_to_many_through_table() {
        TestSetup::with_setup(|TestSetup { inspector, renderer }| {
            let orm_query = OrmQuery::new("Post").where_value("tags.name", "=", "rust");

            let compiled = OrmQueryCompiler::new(&inspector)
                .compile(&orm_query, None)
                .unwrap();

            assert!(compiled.query.distinct);
            assert_eq!(compiled.query.joins.len(), 2);
            assert!(compiled.deferred_relations.is_empty());

            assert_binding!(
                renderer.render(&compiled.query).unwrap(),
                concat!(
                    r#"SELECT DISTINCT "posts"."id", "posts"."title", "posts"."author_id""#,
                    "\n",
                    r#"FROM "posts""#,
                    "\n",
                    r#"LEFT JOIN "post_tags" AS "tags_pivot" ON "posts"."id" = "tags_pivot"."post_id""#,
                    "\n",
                    r#"LEFT JOIN "tags" ON "tags_pivot"."tag_id" = "tags"."id""#,
                    "\n",
                    r#"WHERE "tags"."name" = ?"#
                ),
                "rust"
            );
        })
    }

    #[test]
    fn many_to_many_through_entity() {
        TestSetup::with_setup(|TestSetup { inspector, renderer }| {
            let orm_query = OrmQuery::new("User").where_value("groups.name", "=", "admins");

            let query = OrmQueryCompiler::new(&inspector)
                .to_select(&orm_query, None)
                .unwrap();

            let joins = renderer.render_joins(&query.joins, &mut vec![]).unwrap();
            assert_eq!(
                joins,
                concat!(
                    r#"LEFT JOIN "memberships" AS "groups_pivot" ON "users"."id" = "groups_pivot"."user_id""#,
                    "\n",
                    r#"LEFT JOIN "groups" ON "groups_pivot"."group_id" = "groups"."id""#
                )
            );
        })
    }

    #[test]
    fn to_many_eager_loads_are_deferred() {
        TestSetup::with_setup(|TestSetup { inspector, .. }| {
            let orm_query = OrmQuery::new("User")
                .with("posts")
                .with("posts.tags")
                .with("address.country");

            let compiled = OrmQueryCompiler::new(&inspector)
                .compile(&orm_query, None)
                .unwrap();

            assert_eq!(compiled.deferred_relations, vec!["posts".to_string()]);
            assert!(compiled.query.distinct);

            let column_names: Vec<_> = compiled
                .query
                .columns
                .iter()
                .filter_map(|column| match column {
                    Expression::Key { alias, .. } => alias.clone(),
                    _ => None,
                })
                .collect();
            assert_eq!(
                column_names,
                vec![
                    "address__id",
                    "address__street",
                    "address__city",
                    "address__country_id",
                    "address__country__id",
                    "address__country__name",
                    "address__country__code",
                ]
            );
        })
    }

    #[test]
    fn nested_conditions_keep_their_shape() {
        TestSetup::with_setup(|TestSetup { inspector, renderer }| {
            let orm_query = OrmQuery::new("User").filter(
                Parentheses::or()
                    .with(Predicate::value("address.city", "=", "Berlin"))
                    .with(
                        Parentheses::and()
                            .with(Predicate::value("name", "=", "Ada"))
                            .with(Predicate::keys("address.street", "=", "address.city")),
                    ),
            );

            let query = OrmQueryCompiler::new(&inspector)
                .to_select(&orm_query, None)
                .unwrap();

            let mut bindings = vec![];
            let sql = renderer
                .render_conditions(&query.conditions, &mut bindings)
                .unwrap();
            assert_eq!(
                sql,
                r#"("address"."city" = ? OR ("users"."name" = ? AND "address"."street" = "address"."city"))"#
            );
            assert_params!(bindings, "Berlin", "Ada");
        })
    }

    #[test]
    fn raw_conditions_are_kept() {
        TestSetup::with_setup(|TestSetup { inspector, renderer }| {
            let orm_query = OrmQuery::new("Tag").filter(Condition::Raw("length(name) > 3".to_string()));

            let query = OrmQueryCompiler::new(&inspector)
                .to_select(&orm_query, None)
                .unwrap();

            assert_binding!(
                renderer.render(&query).unwrap(),
                "SELECT \"tags\".\"id\", \"tags\".\"name\"\nFROM \"tags\"\nWHERE length(name) > 3"
            );
        })
    }

    #[test]
    fn extends_existing_query() {
        TestSetup::with_setup(|TestSetup { inspector, renderer }| {
            let existing = Query::select("users")
                .column("users.id")
                .filter(Predicate::value("users.active", "=", true))
                .limit(5);

            let orm_query = OrmQuery::new("User")
                .where_value("address.city", "=", "Berlin")
                .offset(10);

            let query = OrmQueryCompiler::new(&inspector)
                .to_select(&orm_query, Some(existing))
                .unwrap();

            assert_eq!(query.columns.len(), 4);
            assert_eq!(query.limit, Some(5));
            assert_eq!(query.offset, Some(10));

            let mut bindings = vec![];
            let sql = renderer
                .render_conditions(&query.conditions, &mut bindings)
                .unwrap();
            assert_eq!(sql, r#""users"."active" = ? AND "address"."city" = ?"#);
            assert_params!(bindings, true, "Berlin");
        })
    }

    #[test]
    fn narrows_existing_or_conditions() {
        TestSetup::with_setup(|TestSetup { inspector, renderer }| {
            let existing = Query::select("users").filter(
                Parentheses::or()
                    .with(Predicate::value("users.role", "=", "admin"))
                    .with(Predicate::value("users.role", "=", "editor")),
            );
            let mut existing_or = existing.clone();
            existing_or.conditions = Parentheses::or()
                .with(Predicate::value("users.role", "=", "admin"))
                .with(Predicate::value("users.role", "=", "editor"));

            let orm_query = OrmQuery::new("User").where_value("name", "=", "Ada");
            let compiler = OrmQueryCompiler::new(&inspector);

            for existing in [existing, existing_or] {
                let query = compiler.to_select(&orm_query, Some(existing)).unwrap();

                let mut bindings = vec![];
                let sql = renderer
                    .render_conditions(&query.conditions, &mut bindings)
                    .unwrap();
                assert_eq!(
                    sql,
                    r#"("users"."role" = ? OR "users"."role" = ?) AND "users"."name" = ?"#
                );
                assert_params!(bindings, "admin", "editor", "Ada");
            }
        })
    }

    #[test]
    fn compiling_twice_is_identical() {
        TestSetup::with_setup(|TestSetup { inspector, .. }| {
            let orm_query = OrmQuery::new("Post")
                .where_value("author.address.city", "=", "Berlin")
                .order_by("title", Ordering::Asc)
                .with("author")
                .with("tags");

            let compiler = OrmQueryCompiler::new(&inspector);
            let first = compiler.compile(&orm_query, None).unwrap();
            let second = compiler.compile(&orm_query, None).unwrap();

            assert_eq!(first, second);
            assert_eq!(first.query.joins.len(), 4);
        })
    }

    #[test]
    fn unknown_relation_aborts() {
        TestSetup::with_setup(|TestSetup { inspector, .. }| {
            let orm_query = OrmQuery::new("User").where_value("address.planet.name", "=", "Mars");

            assert_eq!(
                OrmQueryCompiler::new(&inspector).to_select(&orm_query, None),
                Err(SqlError::RelationNotFound {
                    entity: "Address".to_string(),
                    relation: "planet".to_string(),
                    path: "address.planet".to_string(),
                })
            );
        })
    }

    #[test]
    fn unknown_entity_aborts() {
        TestSetup::with_setup(|TestSetup { inspector, .. }| {
            assert_eq!(
                OrmQueryCompiler::new(&inspector).to_select(&OrmQuery::new("Unicorn"), None),
                Err(SqlError::EntityNotFound("Unicorn".to_string()))
            );
        })
    }

    #[test]
    fn untranslatable_key_is_reported() {
        let relation_map = RelationMap::default();
        assert_eq!(
            translate_key("address.city", "users", &relation_map),
            Err(SqlError::KeyNotFound("address".to_string()))
        );
        assert_eq!(
            translate_key("name", "users", &relation_map),
            Ok("users.name".to_string())
        );
    }
}
