use crate::error::{Error, Result};
use rig_config::{RigConfig, ScriptsConfig};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// A named unit of work: one .blend file plus everything derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene(String);

impl Scene {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let mut components = Path::new(&name).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );

        if name.is_empty() || !single_normal || name.contains(['/', '\\']) {
            return Err(Error::InvalidScene(name));
        }

        Ok(Self(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl FromStr for Scene {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Scene::new(s)
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every path a pipeline step reads or writes for one scene, relative to the
/// project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenePaths {
    pub blend: PathBuf,
    pub create_script: PathBuf,
    pub walk_script: PathBuf,
    pub render_script: PathBuf,
    pub export_script: PathBuf,
    pub bake_script: PathBuf,
    pub colors_script: PathBuf,
    pub frames_dir: PathBuf,
    pub video: PathBuf,
    pub fbx: PathBuf,
    pub exports_dir: PathBuf,
    pub textures_dir: PathBuf,
    pub manifest: PathBuf,
    pub env_file: PathBuf,
}

impl ScenePaths {
    pub fn new(scene: &Scene, config: &RigConfig) -> Self {
        let name = scene.name();
        let paths = &config.paths;
        let script = |template: &str| paths.scripts.join(ScriptsConfig::expand(template, name));

        Self {
            blend: paths.assets.join(format!("{name}.blend")),
            create_script: script(&config.scripts.create),
            walk_script: script(&config.scripts.walk),
            render_script: script(&config.scripts.render),
            export_script: script(&config.scripts.export),
            bake_script: script(&config.scripts.bake),
            colors_script: script(&config.scripts.colors),
            frames_dir: paths.renders.join(name),
            video: paths.renders.join(format!("{name}.mp4")),
            fbx: paths.exports.join(format!("{name}.fbx")),
            exports_dir: paths.exports.clone(),
            textures_dir: paths.textures.clone(),
            manifest: paths.exports.join(format!("{name}_assets.json")),
            env_file: paths.env_file.clone(),
        }
    }
}
