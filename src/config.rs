use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use log::LevelFilter;
use thiserror::Error;

use crate::auth::hash::{DEFAULT_MAX_ITERATIONS, ITERATION_CEILING};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database: PathBuf,
    /// Upper bound on password hash iterations, at most
    /// [`ITERATION_CEILING`]. Every record in the database was written with
    /// this bound, so changing it can lock existing users out.
    pub max_iterations: u32,
    /// How many posts the HTML feed shows.
    pub feed_limit: i64,
    pub templates: String,
    pub static_dir: PathBuf,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            addr: SocketAddr::from(([127, 0, 0, 1], 7878)),
            database: PathBuf::from("./db.sqlite3"),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            feed_limit: 100,
            templates: "templates/**/*".to_string(),
            static_dir: PathBuf::from("public"),
            log_level: LevelFilter::Debug,
        }
    }
}

impl Config {
    /// Read the configuration from `WARBLE_*` environment variables,
    /// loading a `.env` file first if there is one.
    pub fn from_env() -> Result<Config, ConfigError> {
        dotenvy::dotenv().ok();
        Config::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let defaults = Config::default();

        let max_iterations = match parse::<u32>(&lookup, "WARBLE_MAX_ITERATIONS")? {
            Some(iterations) if iterations == 0 || iterations > ITERATION_CEILING => {
                return Err(ConfigError::Invalid {
                    name: "WARBLE_MAX_ITERATIONS",
                    value: iterations.to_string(),
                })
            }
            Some(iterations) => iterations,
            None => defaults.max_iterations,
        };

        Ok(Config {
            addr: parse(&lookup, "WARBLE_ADDR")?.unwrap_or(defaults.addr),
            database: lookup("WARBLE_DATABASE")
                .map(PathBuf::from)
                .unwrap_or(defaults.database),
            max_iterations,
            feed_limit: parse(&lookup, "WARBLE_FEED_LIMIT")?.unwrap_or(defaults.feed_limit),
            templates: lookup("WARBLE_TEMPLATES").unwrap_or(defaults.templates),
            static_dir: lookup("WARBLE_STATIC")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            log_level: parse(&lookup, "WARBLE_LOG")?.unwrap_or(defaults.log_level),
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.addr, "127.0.0.1:7878".parse().unwrap());
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.feed_limit, 100);
        assert_eq!(config.log_level, LevelFilter::Debug);
    }

    #[test]
    fn values_are_read() {
        let config = Config::from_lookup(lookup(&[
            ("WARBLE_ADDR", "0.0.0.0:8080"),
            ("WARBLE_DATABASE", "/tmp/w.sqlite3"),
            ("WARBLE_MAX_ITERATIONS", "50"),
            ("WARBLE_FEED_LIMIT", "-1"),
            ("WARBLE_LOG", "warn"),
        ]))
        .unwrap();

        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.database, PathBuf::from("/tmp/w.sqlite3"));
        assert_eq!(config.max_iterations, 50);
        assert_eq!(config.feed_limit, -1);
        assert_eq!(config.log_level, LevelFilter::Warn);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(Config::from_lookup(lookup(&[("WARBLE_ADDR", "nowhere")])).is_err());
        assert!(Config::from_lookup(lookup(&[("WARBLE_MAX_ITERATIONS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("WARBLE_MAX_ITERATIONS", "-3")])).is_err());
        assert!(Config::from_lookup(lookup(&[("WARBLE_LOG", "loud")])).is_err());
    }

    #[test]
    fn iteration_bound_has_a_ceiling() {
        let at_ceiling = Config::from_lookup(lookup(&[("WARBLE_MAX_ITERATIONS", "10000")]));
        assert_eq!(at_ceiling.unwrap().max_iterations, ITERATION_CEILING);

        for value in ["10001", "4294967295"] {
            let result = Config::from_lookup(lookup(&[("WARBLE_MAX_ITERATIONS", value)]));
            let err = result.unwrap_err();
            assert!(matches!(
                err,
                ConfigError::Invalid { name: "WARBLE_MAX_ITERATIONS", .. }
            ));
        }
    }
}
