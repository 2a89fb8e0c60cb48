//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (ARTISAN_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parmeter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the "<sw_root>/params" directory
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    load_from(&param_path(param_file_path)?)
}

/// Load a parameter file if it exists.
///
/// Returns `Ok(None)` if there is no such file in the params directory, which allows optional
/// override files to be used.
pub fn load_optional<P>(param_file_path: &str) -> Result<Option<P>, LoadError>
where
    P: DeserializeOwned
{
    let path = param_path(param_file_path)?;

    if !path.exists() {
        return Ok(None)
    }

    load_from(&path).map(Some)
}

/// Load a parameter file from an explicit path.
pub fn load_from<P>(path: &Path) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    // Load the file into a string
    let params_str = match read_to_string(path) {
        Ok(s) => s,
        Err(e) => return Err(LoadError::FileLoadError(e))
    };

    // Parse the string into the parameter struct
    match toml::from_str(params_str.as_str()) {
        Ok(p) => Ok(p),
        Err(e) => Err(LoadError::DeserialiseError(e))
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn param_path(param_file_path: &str) -> Result<PathBuf, LoadError> {
    let mut path = crate::host::get_sw_root()
        .map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    Ok(path)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Dummy {
        port: String,
        baud_rate: u32,
    }

    #[test]
    fn test_load_from() {
        let path = std::env::temp_dir().join("util_params_test_load_from.toml");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            writeln!(f, "port = \"/dev/ttyAMA0\"\nbaud_rate = 115200").unwrap();
        }

        let dummy: Dummy = load_from(&path).unwrap();
        assert_eq!(dummy, Dummy { port: "/dev/ttyAMA0".into(), baud_rate: 115200 });

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_from_bad_file() {
        let path = std::env::temp_dir().join("util_params_test_missing_file.toml");
        match load_from::<Dummy>(&path) {
            Err(LoadError::FileLoadError(_)) => (),
            r => panic!("Expected a file load error, got {:?}", r)
        }
    }
}
