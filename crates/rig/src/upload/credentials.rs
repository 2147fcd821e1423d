use crate::error::{Error, Result};
use crate::pipeline::EnvLookup;
use std::collections::HashMap;
use std::path::Path;

pub const API_KEY: &str = "ROBLOX_API_KEY";
pub const CREATOR_ID: &str = "ROBLOX_CREATOR_ID";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub creator_id: String,
}

/// Parse a dotenv file into a map. Later duplicates win.
fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let env_file_error = |source| Error::EnvFile {
        path: path.to_path_buf(),
        source,
    };

    dotenvy::from_path_iter(path)
        .map_err(env_file_error)?
        .map(|item| item.map_err(env_file_error))
        .collect()
}

impl Credentials {
    /// Resolve credentials. The process environment wins over the env file;
    /// the creator id may also come from config.
    pub fn load(
        env_file: &Path,
        shown_as: &Path,
        env: EnvLookup,
        configured_creator: Option<&str>,
    ) -> Result<Self> {
        let file = read_env_file(env_file)?;
        let present = |value: &String| !value.trim().is_empty();
        let lookup = |key: &str| {
            env(key)
                .filter(present)
                .or_else(|| file.get(key).cloned().filter(present))
        };

        let api_key = lookup(API_KEY).ok_or_else(|| Error::MissingCredential {
            name: API_KEY,
            env_file: shown_as.to_path_buf(),
        })?;

        let creator_id = lookup(CREATOR_ID)
            .or_else(|| configured_creator.map(str::to_string))
            .ok_or_else(|| Error::MissingCredential {
                name: CREATOR_ID,
                env_file: shown_as.to_path_buf(),
            })?;

        Ok(Self {
            api_key,
            creator_id,
        })
    }
}
