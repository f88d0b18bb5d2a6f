// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#![cfg(test)]

use std::sync::Arc;

use crate::schema::{inspector::ClassMapInspector, test_helper::test_inspector};
use crate::sql::{dialect::Postgres, query_renderer::QueryRenderer};

pub struct TestSetup {
    pub inspector: ClassMapInspector,
    pub renderer: QueryRenderer,
}

impl TestSetup {
    pub fn with_setup(test_fn: impl Fn(TestSetup)) {
        test_fn(TestSetup {
            inspector: test_inspector(),
            renderer: QueryRenderer::with_dialect(Arc::new(Postgres)),
        })
    }
}
