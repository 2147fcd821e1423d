use super::rbxcloud::AssetId;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Record of the asset ids assigned to one scene's uploads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub scene: String,
    pub version: String,
    pub assets: BTreeMap<String, AssetId>,
}

impl Manifest {
    pub fn new(scene: &str) -> Self {
        Self {
            scene: scene.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            assets: BTreeMap::new(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs_err::write(path, json + "\n")?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    #[test]
    fn writes_pretty_json() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("exports/baby_camel_assets.json");

        let mut manifest = Manifest::new("baby_camel");
        manifest
            .assets
            .insert("model".into(), AssetId::Text("111".into()));
        manifest
            .assets
            .insert("ColorMap".into(), AssetId::Number(222));
        manifest.write(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["scene"], "baby_camel");
        assert_eq!(json["assets"]["model"], "111");
        assert_eq!(json["assets"]["ColorMap"], 222);
        assert_eq!(Manifest::read(&path).unwrap(), manifest);
    }
}
