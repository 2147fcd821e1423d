use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can stop a pipeline step. All of these are fatal to the run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{what} not found: {}", path.display())]
    MissingFile { what: &'static str, path: PathBuf },

    #[error("{} already exists (pass --force to overwrite)", path.display())]
    SceneExists { path: PathBuf },

    #[error("no frames found in {}", dir.display())]
    NoFrames { dir: PathBuf },

    #[error("{what} was not produced at {}", path.display())]
    MissingOutput { what: &'static str, path: PathBuf },

    #[error("{tool} failed ({})", describe_exit(*code))]
    ToolFailed { tool: String, code: Option<i32> },

    #[error("{tool} is not available. Install it or set its path in rig.toml")]
    ToolUnavailable { tool: String },

    #[error("{name} is not set in {} or the environment", env_file.display())]
    MissingCredential {
        name: &'static str,
        env_file: PathBuf,
    },

    #[error("invalid scene name {0:?}")]
    InvalidScene(String),

    #[error("invalid frame range: start {start} is after end {end}")]
    InvalidFrameRange { start: u32, end: u32 },

    #[error("frame step must be at least 1")]
    InvalidStep,

    #[error("failed to read {}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl Error {
    pub(crate) fn missing(what: &'static str, path: impl Into<PathBuf>) -> Self {
        Error::MissingFile {
            what,
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_path() {
        let err = Error::missing("scene file", "assets/baby_camel.blend");
        assert_eq!(err.to_string(), "scene file not found: assets/baby_camel.blend");

        let err = Error::ToolFailed {
            tool: "blender".into(),
            code: Some(1),
        };
        assert_eq!(err.to_string(), "blender failed (exit code 1)");
    }
}
