// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#![cfg(test)]

use super::{
    class_map::{ClassMap, Junction, JunctionTarget, Relationship},
    inspector::ClassMapInspector,
};

/// `User -> Address -> Country`, `User -> [Post] -> [Tag]` (via the `post_tags` table) and
/// `User <-> Group` (via the `Membership` entity).
pub fn test_inspector() -> ClassMapInspector {
    ClassMapInspector::new()
        .with_class(
            "User",
            ClassMap::new("users")
                .with_keys(["id", "name", "email", "address_id"])
                .with_relationship("address", Relationship::to_one("Address", "address_id", "id"))
                .with_relationship("posts", Relationship::has_many("Post", "id", "author_id"))
                .with_relationship(
                    "groups",
                    Relationship::belongs_to_many(
                        "Group",
                        "id",
                        "id",
                        Junction::new(
                            JunctionTarget::Entity("Membership".to_string()),
                            "user_id",
                            "group_id",
                        ),
                    ),
                ),
        )
        .with_class(
            "Address",
            ClassMap::new("addresses")
                .with_keys(["id", "street", "city", "country_id"])
                .with_relationship("country", Relationship::to_one("Country", "country_id", "id")),
        )
        .with_class(
            "Country",
            ClassMap::new("countries").with_keys(["id", "name", "code"]),
        )
        .with_class(
            "Post",
            ClassMap::new("posts")
                .with_keys(["id", "title", "author_id"])
                .with_relationship("author", Relationship::to_one("User", "author_id", "id"))
                .with_relationship(
                    "tags",
                    Relationship::belongs_to_many(
                        "Tag",
                        "id",
                        "id",
                        Junction::new(
                            JunctionTarget::Table("post_tags".to_string()),
                            "post_id",
                            "tag_id",
                        ),
                    ),
                ),
        )
        .with_class("Tag", ClassMap::new("tags").with_keys(["id", "name"]))
        .with_class("Group", ClassMap::new("groups").with_keys(["id", "name"]))
        .with_class(
            "Membership",
            ClassMap::new("memberships")
                .with_primary_key(["user_id", "group_id"])
                .with_keys(["user_id", "group_id"]),
        )
}
