use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const FILE_NAME: &str = "rig.toml";

/// Project configuration, read from `rig.toml` at the project root.
///
/// Every table is optional. Anything left out falls back to the layout the
/// pipeline scripts expect.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RigConfig {
    pub paths: PathsConfig,
    pub scripts: ScriptsConfig,
    pub tools: ToolsConfig,
    pub render: RenderConfig,
    pub video: VideoConfig,
    pub bake: BakeConfig,
    pub upload: UploadConfig,
}

/// Directories, relative to the project root
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub assets: PathBuf,
    pub scripts: PathBuf,
    pub renders: PathBuf,
    pub exports: PathBuf,
    /// Where baked PBR maps are written
    pub textures: PathBuf,
    /// Local secrets file holding the Open Cloud credential
    pub env_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            assets: PathBuf::from("assets"),
            scripts: PathBuf::from("scripts"),
            renders: PathBuf::from("renders"),
            exports: PathBuf::from("exports"),
            textures: PathBuf::from("exports/textures"),
            env_file: PathBuf::from(".env"),
        }
    }
}

/// Blender script file names inside `paths.scripts`. `{scene}` is substituted.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScriptsConfig {
    pub create: String,
    pub walk: String,
    pub render: String,
    pub export: String,
    pub bake: String,
    pub colors: String,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            create: "create_{scene}.py".into(),
            walk: "animate_{scene}_walk.py".into(),
            render: "batch_render.py".into(),
            export: "export_fbx.py".into(),
            bake: "bake_pbr.py".into(),
            colors: "fix_color_management.py".into(),
        }
    }
}

impl ScriptsConfig {
    /// Expand a script name template for the given scene
    pub fn expand(template: &str, scene: &str) -> String {
        template.replace("{scene}", scene)
    }
}

/// External programs. Bare names are looked up on `PATH`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ToolsConfig {
    pub blender: PathBuf,
    pub ffmpeg: PathBuf,
    pub rbxcloud: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            blender: PathBuf::from("blender"),
            ffmpeg: PathBuf::from("ffmpeg"),
            rbxcloud: PathBuf::from("rbxcloud"),
        }
    }
}

/// Blender render engine
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Engine {
    Cycles,
    #[default]
    #[serde(alias = "BLENDER_EEVEE")]
    Eevee,
    #[serde(alias = "BLENDER_WORKBENCH")]
    Workbench,
}

impl Engine {
    /// Name understood by the render script's `--engine` flag
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Cycles => "CYCLES",
            Engine::Eevee => "EEVEE",
            Engine::Workbench => "WORKBENCH",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CYCLES" => Ok(Engine::Cycles),
            "EEVEE" | "BLENDER_EEVEE" => Ok(Engine::Eevee),
            "WORKBENCH" | "BLENDER_WORKBENCH" => Ok(Engine::Workbench),
            other => Err(format!(
                "unknown render engine '{other}' (expected CYCLES, EEVEE or WORKBENCH)"
            )),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub engine: Engine,
    pub samples: u32,
    pub fps: u32,
    /// Output size as `[width, height]`
    pub resolution: [u32; 2],
    /// Default interval used by `verify`
    pub verify_step: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            engine: Engine::Eevee,
            samples: 64,
            fps: 24,
            resolution: [1920, 1080],
            verify_step: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct VideoConfig {
    pub codec: String,
    pub crf: u8,
    pub pixel_format: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            codec: "libx264".into(),
            crf: 18,
            pixel_format: "yuv420p".into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct BakeConfig {
    /// Mesh object whose materials are baked
    pub object: String,
    pub resolution: u32,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            object: "Body".into(),
            resolution: 2048,
        }
    }
}

pub const BAKE_RESOLUTIONS: [u32; 3] = [1024, 2048, 4096];

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    /// Fallback when `ROBLOX_CREATOR_ID` is not set
    pub creator_id: Option<String>,
    pub creator_type: String,
    pub timeout_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            creator_id: None,
            creator_type: "user".into(),
            timeout_secs: 120,
            poll_interval_secs: 2,
        }
    }
}

impl UploadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl RigConfig {
    /// Read rig.toml from the given project directory.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn read_from(project: &Path) -> Result<Self> {
        let path = project.join(FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_str = fs_err::read_to_string(&path).context("Failed to read rig.toml")?;
        Self::parse(&config_str)
    }

    pub fn parse(config_str: &str) -> Result<Self> {
        let config: RigConfig = toml::from_str(config_str).context("Failed to parse rig.toml")?;

        if !BAKE_RESOLUTIONS.contains(&config.bake.resolution) {
            anyhow::bail!(
                "bake.resolution must be one of {:?}, got {}",
                BAKE_RESOLUTIONS,
                config.bake.resolution
            );
        }
        if config.render.verify_step == 0 {
            anyhow::bail!("render.verify_step must be at least 1");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = RigConfig::parse("").unwrap();
        assert_eq!(config, RigConfig::default());
        assert_eq!(config.render.engine, Engine::Eevee);
        assert_eq!(config.paths.env_file, PathBuf::from(".env"));
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let config = RigConfig::parse(
            r#"
[render]
engine = "CYCLES"
samples = 128

[tools]
blender = "/Applications/Blender.app/Contents/MacOS/Blender"

[upload]
creator_id = "42"
"#,
        )
        .unwrap();

        assert_eq!(config.render.engine, Engine::Cycles);
        assert_eq!(config.render.samples, 128);
        assert_eq!(config.render.fps, 24);
        assert_eq!(
            config.tools.blender,
            PathBuf::from("/Applications/Blender.app/Contents/MacOS/Blender")
        );
        assert_eq!(config.tools.ffmpeg, PathBuf::from("ffmpeg"));
        assert_eq!(config.upload.creator_id.as_deref(), Some("42"));
        assert_eq!(config.upload.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn engine_accepts_blender_names() {
        let config = RigConfig::parse("[render]\nengine = \"BLENDER_EEVEE\"\n").unwrap();
        assert_eq!(config.render.engine, Engine::Eevee);

        assert_eq!("cycles".parse::<Engine>(), Ok(Engine::Cycles));
        assert_eq!("blender_workbench".parse::<Engine>(), Ok(Engine::Workbench));
        assert!("octane".parse::<Engine>().is_err());
    }

    #[test]
    fn rejects_unsupported_bake_resolution() {
        let err = RigConfig::parse("[bake]\nresolution = 512\n").unwrap_err();
        assert!(err.to_string().contains("bake.resolution"));
    }

    #[test]
    fn rejects_zero_verify_step() {
        assert!(RigConfig::parse("[render]\nverify_step = 0\n").is_err());
    }

    #[test]
    fn script_templates_expand_scene() {
        let scripts = ScriptsConfig::default();
        assert_eq!(
            ScriptsConfig::expand(&scripts.walk, "baby_camel"),
            "animate_baby_camel_walk.py"
        );
        assert_eq!(ScriptsConfig::expand(&scripts.render, "baby_camel"), "batch_render.py");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = std::env::temp_dir().join("rig-config-missing-file-test");
        let config = RigConfig::read_from(&dir).unwrap();
        assert_eq!(config, RigConfig::default());
    }
}
