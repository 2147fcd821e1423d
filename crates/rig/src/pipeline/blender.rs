use super::Pipeline;
use crate::error::{Error, Result};
use crate::options::{ExportOptions, RunOptions};
use crate::runner::{Invocation, Runner};
use crate::scene::Scene;
use log::{info, warn};
use std::path::Path;

const BAKED_MAPS: [&str; 3] = ["ColorMap", "NormalMap", "RoughnessMap"];

impl<R: Runner> Pipeline<R> {
    /// Blender in background mode. Python errors make it exit non-zero.
    fn blender(&self, blend: Option<&Path>, script: &Path) -> Invocation {
        let invocation = self.tool(&self.config.tools.blender).arg("--background");
        let invocation = match blend {
            Some(blend) => invocation.arg(blend),
            None => invocation,
        };
        invocation
            .args(["--python-exit-code", "1", "--python"])
            .arg(script)
    }

    pub fn create(&self, scene: &Scene, options: &RunOptions) -> Result<()> {
        let paths = self.paths(scene);
        self.require_file("creation script", &paths.create_script)?;

        if self.on_disk(&paths.blend).exists() {
            if !options.force {
                return Err(Error::SceneExists { path: paths.blend });
            }
            warn!("Overwriting {}", paths.blend.display());
        }

        info!("Creating {scene} from {}", paths.create_script.display());
        let invocation = self
            .blender(None, &paths.create_script)
            .args(["--", "--output"])
            .arg(&paths.blend);
        self.runner.execute(&invocation)?;

        info!("Created {}", paths.blend.display());
        Ok(())
    }

    pub fn animate(&self, scene: &Scene) -> Result<()> {
        let paths = self.paths(scene);
        self.require_file("scene file", &paths.blend)?;
        self.require_file("walk animation script", &paths.walk_script)?;

        info!("Animating {scene} with {}", paths.walk_script.display());
        self.runner
            .execute(&self.blender(Some(&paths.blend), &paths.walk_script))?;
        Ok(())
    }

    pub fn render(&self, scene: &Scene, options: &RunOptions) -> Result<()> {
        let paths = self.paths(scene);
        self.require_file("scene file", &paths.blend)?;
        self.require_file("render script", &paths.render_script)?;

        let frames_dir = self.on_disk(&paths.frames_dir);
        if options.force && frames_dir.exists() {
            info!("Removing previous frames in {}", paths.frames_dir.display());
            fs_err::remove_dir_all(&frames_dir)?;
        }

        let mut invocation = self
            .blender(Some(&paths.blend), &paths.render_script)
            .args(["--", "--output"])
            .arg(&paths.frames_dir)
            .args(["--engine", options.engine.as_str()])
            .args(["--samples".to_string(), options.samples.to_string()])
            .args([
                "--resolution".to_string(),
                options.resolution.width.to_string(),
                options.resolution.height.to_string(),
            ]);
        let frames = options.frames;
        if let Some(frame) = frames.single {
            invocation = invocation.args(["--frame".to_string(), frame.to_string()]);
        } else {
            if let Some(start) = frames.start {
                invocation = invocation.args(["--start".to_string(), start.to_string()]);
            }
            if let Some(end) = frames.end {
                invocation = invocation.args(["--end".to_string(), end.to_string()]);
            }
            if frames.step != 1 {
                invocation = invocation.args(["--step".to_string(), frames.step.to_string()]);
            }
        }

        info!(
            "Rendering {scene} with {} ({} samples, {})",
            options.engine, options.samples, options.resolution
        );
        self.runner.execute(&invocation)?;

        let count = if frames_dir.is_dir() {
            self.frames(scene)?.len()
        } else {
            0
        };
        info!("Rendered {count} frame(s) to {}", paths.frames_dir.display());
        Ok(())
    }

    pub fn export(&self, scene: &Scene, options: &ExportOptions) -> Result<()> {
        let paths = self.paths(scene);
        self.require_file("scene file", &paths.blend)?;
        self.require_file("export script", &paths.export_script)?;

        info!("Exporting {scene} to {}", paths.fbx.display());
        let mut invocation = self
            .blender(Some(&paths.blend), &paths.export_script)
            .args(["--", "--output"])
            .arg(&paths.fbx);
        if !options.objects.is_empty() {
            invocation = invocation.arg("--objects").args(&options.objects);
        }
        if options.skip_validation {
            invocation = invocation.arg("--skip-validation");
        }
        self.runner.execute(&invocation)?;

        if !self.on_disk(&paths.fbx).is_file() {
            return Err(Error::MissingOutput {
                what: "FBX export",
                path: paths.fbx,
            });
        }

        info!("Exported {}", paths.fbx.display());
        Ok(())
    }

    /// Bake PBR maps for the configured object. Success is the script's exit
    /// status; missing maps are only warned about.
    pub fn bake(&self, scene: &Scene) -> Result<()> {
        let paths = self.paths(scene);
        self.require_file("scene file", &paths.blend)?;
        self.require_file("bake script", &paths.bake_script)?;

        let bake = &self.config.bake;
        info!(
            "Baking PBR maps for '{}' at {}x{}",
            bake.object, bake.resolution, bake.resolution
        );
        let invocation = self
            .blender(Some(&paths.blend), &paths.bake_script)
            .args(["--", "--object", bake.object.as_str(), "--output"])
            .arg(&paths.textures_dir)
            .args(["--resolution".to_string(), bake.resolution.to_string()]);
        self.runner.execute(&invocation)?;

        let base_name = bake.object.replace(' ', "_");
        for map in BAKED_MAPS {
            let file = paths.textures_dir.join(format!("{base_name}_{map}.png"));
            if !self.on_disk(&file).is_file() {
                warn!("Expected baked map {} was not found", file.display());
            }
        }
        Ok(())
    }

    pub fn colors(&self, scene: &Scene) -> Result<()> {
        let paths = self.paths(scene);
        self.require_file("scene file", &paths.blend)?;
        self.require_file("color management script", &paths.colors_script)?;

        info!("Applying color management to {scene}");
        self.runner
            .execute(&self.blender(Some(&paths.blend), &paths.colors_script))?;
        Ok(())
    }
}
