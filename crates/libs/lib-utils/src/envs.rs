//! # Environment Variables
//!
//! Utilities for reading and parsing environment variables.

use std::env;
use std::str::FromStr;

/// Get an environment variable by name.
pub fn get_env(name: &'static str) -> Result<String, Error> {
    env::var(name).map_err(|_| Error::MissingEnv(name))
}

/// Get an environment variable, falling back to `default` when it is unset.
pub fn get_env_or(name: &'static str, default: &str) -> String {
    get_env(name).unwrap_or_else(|_| default.to_string())
}

/// Get and parse an environment variable.
pub fn get_env_parse<T: FromStr>(name: &'static str) -> Result<T, Error> {
    let val = get_env(name)?;
    val.parse::<T>().map_err(|_| Error::WrongFormat(name))
}

/// Get and parse an environment variable, using `default` when it is unset.
///
/// A variable that is set but unparsable is still an error.
pub fn get_env_parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, Error> {
    match get_env_parse(name) {
        Ok(val) => Ok(val),
        Err(Error::MissingEnv(_)) => Ok(default),
        Err(e) => Err(e),
    }
}

// region:    --- Error
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    MissingEnv(&'static str),
    WrongFormat(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::MissingEnv(name) => write!(fmt, "{name} must be set in environment"),
            Error::WrongFormat(name) => write!(fmt, "{name} has an invalid format"),
        }
    }
}

impl std::error::Error for Error {}
// endregion: --- Error

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_uses_default() {
        let value: u64 = get_env_parse_or("LIB_UTILS_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
        assert_eq!(get_env_or("LIB_UTILS_TEST_SURELY_UNSET_VAR", "fallback"), "fallback");
    }

    #[test]
    fn test_wrong_format_is_error() {
        env::set_var("LIB_UTILS_TEST_BAD_NUMBER", "not-a-number");
        let result: Result<u64, Error> = get_env_parse_or("LIB_UTILS_TEST_BAD_NUMBER", 1);
        assert_eq!(result, Err(Error::WrongFormat("LIB_UTILS_TEST_BAD_NUMBER")));
        env::remove_var("LIB_UTILS_TEST_BAD_NUMBER");
    }
}
