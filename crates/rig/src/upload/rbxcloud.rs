//! Thin wrapper over the `rbxcloud assets` subcommands

use crate::error::Result;
use crate::runner::{Invocation, Runner};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Asset ids come back as strings from Open Cloud, but older tooling emits
/// plain numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetId {
    Text(String),
    Number(u64),
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Text(id) => f.write_str(id),
            AssetId::Number(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub asset_id: AssetId,
}

/// A long-running Open Cloud operation
#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    pub path: Option<String>,
    #[serde(default)]
    pub done: bool,
    pub response: Option<OperationResponse>,
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Ready(AssetId),
    Failed(String),
}

impl Operation {
    pub fn status(&self) -> OperationStatus {
        if !self.done {
            return OperationStatus::Pending;
        }
        match (&self.response, &self.error) {
            (Some(response), _) => OperationStatus::Ready(response.asset_id.clone()),
            (None, Some(error)) => OperationStatus::Failed(error.to_string()),
            (None, None) => {
                OperationStatus::Failed("operation finished without a response".to_string())
            }
        }
    }
}

/// What to upload and how it should be labelled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    /// Key in the manifest
    pub key: String,
    pub asset_type: &'static str,
    pub file: PathBuf,
    pub display_name: String,
    pub description: String,
}

pub struct RbxCloud<'a, R: Runner> {
    runner: &'a R,
    program: PathBuf,
    cwd: &'a Path,
    api_key: &'a str,
}

impl<'a, R: Runner> RbxCloud<'a, R> {
    pub fn new(runner: &'a R, program: PathBuf, cwd: &'a Path, api_key: &'a str) -> Self {
        Self {
            runner,
            program,
            cwd,
            api_key,
        }
    }

    fn assets(&self, subcommand: &str) -> Invocation {
        Invocation::new(&self.program, self.cwd)
            .args(["assets", subcommand])
            .captured()
    }

    fn finish(&self, invocation: Invocation) -> Result<Operation> {
        let invocation = invocation
            .arg("--api-key")
            .secret(self.api_key)
            .arg("--pretty");
        let output = self.runner.execute(&invocation)?;
        Ok(serde_json::from_str(&output.stdout)?)
    }

    pub fn create(&self, request: &AssetRequest, creator_id: &str, creator_type: &str) -> Result<Operation> {
        let invocation = self
            .assets("create")
            .args(["--asset-type", request.asset_type])
            .args(["--display-name", request.display_name.as_str()])
            .args(["--description", request.description.as_str()])
            .args(["--creator-id", creator_id])
            .args(["--creator-type", creator_type])
            .arg("--filepath")
            .arg(&request.file);
        self.finish(invocation)
    }

    pub fn operation(&self, operation_path: &str) -> Result<Operation> {
        let invocation = self
            .assets("get-operation")
            .args(["--operation-id", operation_path]);
        self.finish(invocation)
    }
}
