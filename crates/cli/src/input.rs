//! Loading of JSON list arguments.

use crate::errors::CliError;
use cubx_resolver::DependencyExclude;
use serde_json::Value;
use std::path::Path;

/// Read a JSON array given inline or as a path to a file containing one.
pub fn load_json_array(argument: &str, value: &str) -> Result<Value, CliError> {
    let path = Path::new(value);
    let text = if path.is_file() {
        std::fs::read_to_string(path).map_err(|source| CliError::FileError {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        value.to_string()
    };

    let json: Value = serde_json::from_str(&text).map_err(|source| CliError::InvalidJson {
        argument: argument.to_string(),
        source,
    })?;
    if !json.is_array() {
        return Err(CliError::invalid_argument(argument, "expected a JSON array"));
    }
    Ok(json)
}

/// Read a list of exclude rules.
pub fn load_excludes(value: &str) -> Result<Vec<DependencyExclude>, CliError> {
    let json = load_json_array("excludes", value)?;
    serde_json::from_value(json).map_err(|source| CliError::InvalidJson {
        argument: "excludes".to_string(),
        source,
    })
}
