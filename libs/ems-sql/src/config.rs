// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Renderer configuration from environment variables.

use std::collections::HashMap;

use crate::{
    sql::{dialect::DialectKind, query_renderer::QueryRenderer},
    SqlError, SqlResult,
};

/// `postgres` (or `postgresql`, `pg`), `mysql`, `sqlite` or `none` (the default)
pub const EMS_SQL_DIALECT: &str = "EMS_SQL_DIALECT";
/// Log rendered SQL with the bindings interpolated (default: false)
pub const EMS_SQL_LOG_INTERPOLATED: &str = "EMS_SQL_LOG_INTERPOLATED";

/// Where [`RendererConfig::from_env`] reads its settings from.
pub trait Environment {
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed settings, for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment(HashMap<String, String>);

impl Environment for MapEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for MapEnvironment {
    fn from(values: [(&str, &str); N]) -> Self {
        Self(
            values
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RendererConfig {
    /// `None` renders identifiers unquoted
    pub dialect: Option<DialectKind>,
    pub log_interpolated: bool,
}

impl RendererConfig {
    pub fn from_env(env: &dyn Environment) -> SqlResult<Self> {
        let dialect = match env.get(EMS_SQL_DIALECT).unwrap_or_default().trim() {
            "" => None,
            name if name.eq_ignore_ascii_case("none") => None,
            name => Some(name.parse::<DialectKind>().map_err(|_| {
                SqlError::Config(format!(
                    "Invalid env value {name} for {EMS_SQL_DIALECT}: Must be one of 'postgres', 'mysql', 'sqlite', or 'none'"
                ))
            })?),
        };

        Ok(Self {
            dialect,
            log_interpolated: flag(env, EMS_SQL_LOG_INTERPOLATED)?,
        })
    }

    pub fn renderer(&self) -> QueryRenderer {
        QueryRenderer::new(self.dialect.map(DialectKind::dialect))
            .log_interpolated(self.log_interpolated)
    }
}

/// An unset flag is off
fn flag(env: &dyn Environment, key: &str) -> SqlResult<bool> {
    match env.get(key).as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(value) if ["true", "1", "yes", "on"].iter().any(|v| value.eq_ignore_ascii_case(v)) => {
            Ok(true)
        }
        Some(value) if ["false", "0", "no", "off"].iter().any(|v| value.eq_ignore_ascii_case(v)) => {
            Ok(false)
        }
        Some(value) => Err(SqlError::Config(format!(
            "Invalid value '{value}' for {key}: expected true/false, 1/0, yes/no or on/off"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RendererConfig::from_env(&MapEnvironment::default()).unwrap();
        assert_eq!(config, RendererConfig::default());
        assert!(config.renderer().dialect().is_none());
    }

    #[test]
    fn dialect_names() {
        for (name, expected) in [
            ("postgres", Some(DialectKind::Postgres)),
            ("PG", Some(DialectKind::Postgres)),
            ("postgresql", Some(DialectKind::Postgres)),
            ("mysql", Some(DialectKind::MySql)),
            ("sqlite", Some(DialectKind::Sqlite)),
            ("None", None),
        ] {
            let env = MapEnvironment::from([(EMS_SQL_DIALECT, name)]);
            assert_eq!(RendererConfig::from_env(&env).unwrap().dialect, expected);
        }
    }

    #[test]
    fn renderer_uses_dialect() {
        let env = MapEnvironment::from([(EMS_SQL_DIALECT, "mysql"), (EMS_SQL_LOG_INTERPOLATED, "yes")]);
        let config = RendererConfig::from_env(&env).unwrap();
        assert!(config.log_interpolated);

        let renderer = config.renderer();
        assert_eq!(renderer.dialect().map(|dialect| dialect.name()), Some("mysql"));
        assert_eq!(renderer.quote_name("users.id"), "`users`.`id`");
    }

    #[test]
    fn invalid_values() {
        let env = MapEnvironment::from([(EMS_SQL_DIALECT, "oracle")]);
        assert!(matches!(
            RendererConfig::from_env(&env),
            Err(SqlError::Config(message)) if message.contains("oracle")
        ));

        let env = MapEnvironment::from([(EMS_SQL_LOG_INTERPOLATED, "maybe")]);
        assert!(matches!(
            RendererConfig::from_env(&env),
            Err(SqlError::Config(message)) if message.contains(EMS_SQL_LOG_INTERPOLATED)
        ));
    }

    #[test]
    fn flag_values() {
        for (value, expected) in [("TRUE", true), (" on ", true), ("0", false), ("", false)] {
            let env = MapEnvironment::from([(EMS_SQL_LOG_INTERPOLATED, value)]);
            assert_eq!(flag(&env, EMS_SQL_LOG_INTERPOLATED).unwrap(), expected);
        }
        assert!(!flag(&MapEnvironment::default(), EMS_SQL_LOG_INTERPOLATED).unwrap());
    }
}
