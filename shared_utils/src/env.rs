use std::str::FromStr;

use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// An environment variable is set but its value does not parse.
#[derive(Debug, Error)]
#[error("Invalid value for environment variable {name}: {value:?}")]
pub struct InvalidEnvVarError {
    /// Name of the variable.
    pub name: String,
    /// The raw value that failed to parse.
    pub value: String,
}

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    std::env::var(name).map_err(|_| MissingEnvVarError(name.to_string()))
}

/// Reads and parses an optional environment variable.
///
/// Unset or blank variables yield `Ok(None)`; a value that fails to parse is an error
/// rather than being silently replaced by a default.
pub fn parse_env_var<T: FromStr>(name: &str) -> Result<Option<T>, InvalidEnvVarError> {
    let Ok(raw) = get_env_var(name) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<T>().map(Some).map_err(|_| InvalidEnvVarError {
        name: name.to_string(),
        value: raw.clone(),
    })
}

/// Reads and parses an environment variable, falling back to `default` when unset.
pub fn env_or<T: FromStr>(name: &str, default: T) -> Result<T, InvalidEnvVarError> {
    Ok(parse_env_var(name)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn env_or_uses_default_when_unset() {
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_YEARS") };
        assert_eq!(env_or("SHARED_UTILS_TEST_YEARS", 5u32).unwrap(), 5);
    }

    #[test]
    #[serial]
    fn env_or_parses_value() {
        unsafe { std::env::set_var("SHARED_UTILS_TEST_YEARS", " 7 ") };
        assert_eq!(env_or("SHARED_UTILS_TEST_YEARS", 5u32).unwrap(), 7);
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_YEARS") };
    }

    #[test]
    #[serial]
    fn invalid_value_is_an_error() {
        unsafe { std::env::set_var("SHARED_UTILS_TEST_YEARS", "five") };
        let err = env_or("SHARED_UTILS_TEST_YEARS", 5u32).unwrap_err();
        assert_eq!(err.name, "SHARED_UTILS_TEST_YEARS");
        assert_eq!(err.value, "five");
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_YEARS") };
    }

    #[test]
    #[serial]
    fn missing_var_is_reported_by_name() {
        unsafe { std::env::remove_var("SHARED_UTILS_TEST_MISSING") };
        let err = get_env_var("SHARED_UTILS_TEST_MISSING").unwrap_err();
        assert_eq!(err.0, "SHARED_UTILS_TEST_MISSING");
    }
}
