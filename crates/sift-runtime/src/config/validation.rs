//! Configuration validation utilities.
//!
//! Every route query is parsed here, so a configuration that passes
//! validation can be routed without further query errors.

use std::collections::HashSet;

use sift_core::Filter;

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, RouteConfig, SiftConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &SiftConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_routes(&config.routes)?;
    Ok(())
}

/// Parses a route's queries into a filter.
pub fn compile_route(route: &RouteConfig) -> ConfigResult<Filter> {
    Filter::new(&route.queries).map_err(|e| ConfigError::invalid_query(&route.name, e))
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.max_files == 0 {
        return Err(ConfigError::validation("logging.max_files must be greater than 0"));
    }

    if logging.filters.keys().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation("logging.filters has an empty module name"));
    }

    Ok(())
}

fn validate_routes(routes: &[RouteConfig]) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for route in routes {
        if route.name.is_empty() {
            return Err(ConfigError::missing_field("routes.name"));
        }

        if route.name.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Route name '{}' cannot contain whitespace",
                route.name
            )));
        }

        if !seen.insert(route.name.as_str()) {
            return Err(ConfigError::DuplicateRoute(route.name.clone()));
        }

        compile_route(route)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::QueryError;

    #[test]
    fn test_validate_empty_config() {
        assert!(validate_config(&SiftConfig::default()).is_ok());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = SiftConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));

        config.logging.file_path = Some("sift.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_duplicate_route_name() {
        let route = RouteConfig::new("links", ["message:entities:url"]);
        let config = SiftConfig {
            routes: vec![route.clone(), route],
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::DuplicateRoute(name)) if name == "links"
        ));
    }

    #[test]
    fn test_invalid_query_names_route() {
        let config = SiftConfig {
            routes: vec![
                RouteConfig::new("ok", ["message"]),
                RouteConfig::new("typo", ["mesage:text"]),
            ],
            ..Default::default()
        };

        match validate_config(&config) {
            Err(ConfigError::InvalidQuery { route, source }) => {
                assert_eq!(route, "typo");
                assert!(matches!(source, QueryError::UnknownDiscriminator { .. }));
            }
            other => panic!("expected invalid query, got {other:?}"),
        }
    }

    #[test]
    fn test_disabled_routes_are_still_validated() {
        let mut route = RouteConfig::new("off", ["message:a:b:c"]);
        route.enabled = false;
        let config = SiftConfig {
            routes: vec![route],
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_route_without_queries() {
        let route = RouteConfig::new("empty", Vec::<String>::new());
        assert!(matches!(
            compile_route(&route),
            Err(ConfigError::InvalidQuery {
                source: QueryError::NoQueries,
                ..
            })
        ));
    }
}
