use std::{env, path::Path};

/// Loads `.env` files before any variable is read.
///
/// The crate-local `.env` wins over one found from the working directory.
pub fn init() {
    let _ = dotenvy::from_path(Path::new(
        format!("{}/.env", env!("CARGO_MANIFEST_DIR")).as_str(),
    ));
    dotenvy::dotenv().ok();
}

/// Reads and parses an environment variable, falling back to `default` when
/// the variable is unset or does not parse.
pub fn get_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::error!(key, %raw, "failed to parse environment variable");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_falls_back_to_default() {
        let port: u16 = get_env_or("INTAKE_TEST_UNSET_PORT", 8080);
        assert_eq!(port, 8080);
    }
}
