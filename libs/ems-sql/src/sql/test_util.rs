// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#![cfg(test)]

//! Test assertion to check SQL statements and parameters.

/// Assert that the given parameters match the expected ones. Each expected parameter may be
/// anything that converts into an `SQLParam`.
///
/// # Usage:
/// ```no_run
/// assert_params!(actual_params, expected_param1, expected_param2, ...);
/// ```
macro_rules! assert_params {
    ($actual_params:expr) => {
        assert!(
            $actual_params.is_empty(),
            "Extra actual parameters: {:?}",
            $actual_params
        );
    };
    ($actual_params:expr, $($expected_param:expr),+) => {
        let expected_params: Vec<$crate::SQLParam> =
            vec![$($crate::SQLParam::from($expected_param)),+];
        assert_eq!($actual_params, expected_params, "Parameter mismatch");
    };
}

macro_rules! assert_binding {
    ($actual:expr, $expected_stmt:expr) => {
        let (actual_stmt, actual_params) = $actual;
        assert_eq!(actual_stmt, $expected_stmt);
        assert_params!(actual_params);
    };
    ($actual:expr, $expected_stmt:expr, $($rest:expr),+) => {
        let (actual_stmt, actual_params) = $actual;
        assert_eq!(actual_stmt, $expected_stmt);
        assert_params!(actual_params, $($rest),+);
    };
}
