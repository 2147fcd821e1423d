//! Pipeline steps. Each one checks its inputs on disk and then hands the work
//! to an external tool through a [`Runner`].

mod blender;
mod clean;
mod frames;
mod video;

use crate::error::{Error, Result};
use crate::options::{ExportOptions, RunOptions};
use crate::runner::{Invocation, Runner, resolve_tool};
use crate::scene::{Scene, ScenePaths};
use indicatif::MultiProgress;
use log::info;
use rig_config::RigConfig;
use std::path::{Path, PathBuf};

/// The fixed set of things `rig` can do to a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Animate,
    Render,
    Video,
    Full,
    /// List every `step`th frame; `None` uses the configured default
    Verify { step: Option<usize> },
    Clean,
    Export,
    Bake,
    Upload,
    Deploy,
    Colors,
}

/// Looks up a variable in the process environment
pub type EnvLookup = fn(&str) -> Option<String>;

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

pub struct Pipeline<R: Runner> {
    pub(crate) root: PathBuf,
    pub(crate) config: RigConfig,
    pub(crate) runner: R,
    pub(crate) progress: MultiProgress,
    pub(crate) env: EnvLookup,
}

impl<R: Runner> Pipeline<R> {
    pub fn new(root: impl Into<PathBuf>, config: RigConfig, runner: R, progress: MultiProgress) -> Self {
        Self {
            root: root.into(),
            config,
            runner,
            progress,
            env: process_env,
        }
    }

    /// Replace the environment used for credential lookup
    #[cfg(test)]
    pub fn with_env(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }

    #[cfg(test)]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn paths(&self, scene: &Scene) -> ScenePaths {
        ScenePaths::new(scene, &self.config)
    }

    /// Run one action to completion
    pub fn dispatch(&self, action: Action, scene: &Scene, options: &RunOptions) -> Result<()> {
        match action {
            Action::Create => self.create(scene, options),
            Action::Animate => self.animate(scene),
            Action::Render => self.render(scene, options),
            Action::Video => self.video(scene, options),
            Action::Full => self.full(scene, options),
            Action::Verify { step } => {
                let step = step.unwrap_or(self.config.render.verify_step);
                for frame in self.verify(scene, step)? {
                    println!("{}", frame.display());
                }
                Ok(())
            }
            Action::Clean => self.clean(scene),
            Action::Export => self.export(scene, &options.export),
            Action::Bake => self.bake(scene),
            Action::Upload => self.upload(scene),
            Action::Deploy => self.deploy(scene, &options.export),
            Action::Colors => self.colors(scene),
        }
    }

    /// create → animate → render → video
    pub fn full(&self, scene: &Scene, options: &RunOptions) -> Result<()> {
        info!("Running full pipeline for {scene}");
        self.create(scene, options)?;
        self.animate(scene)?;
        self.render(scene, options)?;
        if options.video {
            self.video(scene, options)?;
        } else {
            info!("Skipping video (--no-video)");
        }
        info!("Pipeline complete for {scene}");
        Ok(())
    }

    /// export → bake → upload
    pub fn deploy(&self, scene: &Scene, export: &ExportOptions) -> Result<()> {
        info!("Deploying {scene}");
        self.export(scene, export)?;
        self.bake(scene)?;
        self.upload(scene)?;
        info!("Deploy complete for {scene}");
        Ok(())
    }

    pub(crate) fn on_disk(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub(crate) fn require_file(&self, what: &'static str, relative: &Path) -> Result<()> {
        if self.on_disk(relative).is_file() {
            Ok(())
        } else {
            Err(Error::missing(what, relative))
        }
    }

    pub(crate) fn require_dir(&self, what: &'static str, relative: &Path) -> Result<()> {
        if self.on_disk(relative).is_dir() {
            Ok(())
        } else {
            Err(Error::missing(what, relative))
        }
    }

    pub(crate) fn tool(&self, program: &Path) -> Invocation {
        Invocation::new(resolve_tool(&self.root, program), &self.root)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::runner::fake::FakeRunner;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use indicatif::ProgressDrawTarget;

    pub fn scene(name: &str) -> Scene {
        Scene::new(name).unwrap()
    }

    pub fn options() -> RunOptions {
        RunOptions::from_config(&RigConfig::default().render)
    }

    pub fn pipeline(root: &TempDir, runner: FakeRunner) -> Pipeline<FakeRunner> {
        let mut config = RigConfig::default();
        config.upload.poll_interval_secs = 0;
        config.upload.timeout_secs = 5;

        Pipeline::new(
            root.path(),
            config,
            runner,
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        )
        .with_env(|_| None)
    }

    pub fn touch(root: &TempDir, relative: &str) {
        let child = root.child(relative);
        std::fs::create_dir_all(child.path().parent().unwrap()).unwrap();
        child.touch().unwrap();
    }

    /// Scene file plus every Blender script for `scene`
    pub fn seed_project(root: &TempDir, scene: &str) {
        touch(root, &format!("assets/{scene}.blend"));
        touch(root, &format!("scripts/create_{scene}.py"));
        touch(root, &format!("scripts/animate_{scene}_walk.py"));
        for script in [
            "batch_render.py",
            "export_fbx.py",
            "bake_pbr.py",
            "fix_color_management.py",
        ] {
            touch(root, &format!("scripts/{script}"));
        }
    }

    pub fn seed_frames(root: &TempDir, scene: &str, count: u32) {
        root.child(format!("renders/{scene}")).create_dir_all().unwrap();
        for index in 1..=count {
            touch(root, &format!("renders/{scene}/frame_{index:04}.png"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::runner::fake::{FakeRunner, flag_value};
    use crate::runner::{Invocation, ToolOutput};
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    /// Fakes Blender scripts by creating the files they would write
    fn producing_runner() -> FakeRunner {
        FakeRunner::with(|invocation: &Invocation| {
            if let Some(output) = flag_value(invocation, "--output") {
                let target = invocation.cwd.join(&output);
                if output.ends_with(".fbx") || output.ends_with(".blend") {
                    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
                    std::fs::write(&target, b"").unwrap();
                } else if output.starts_with("renders/") {
                    std::fs::create_dir_all(&target).unwrap();
                    std::fs::write(target.join("frame_0001.png"), b"").unwrap();
                    std::fs::write(target.join("frame_0002.png"), b"").unwrap();
                }
            }
            if invocation.tool_name() == "ffmpeg" {
                let target = invocation.cwd.join(invocation.args.last().unwrap());
                std::fs::write(target, b"mp4").unwrap();
            }
            ToolOutput::succeeded("")
        })
    }

    #[test]
    fn every_action_checks_inputs_before_calling_out() {
        let actions = [
            Action::Create,
            Action::Animate,
            Action::Render,
            Action::Video,
            Action::Full,
            Action::Verify { step: None },
            Action::Export,
            Action::Bake,
            Action::Upload,
            Action::Deploy,
            Action::Colors,
        ];

        for action in actions {
            let root = TempDir::new().unwrap();
            let pipeline = pipeline(&root, FakeRunner::ok());

            let result = pipeline.dispatch(action, &scene("baby_camel"), &options());

            assert!(
                matches!(result, Err(Error::MissingFile { .. })),
                "{action:?} should fail on an empty project, got {result:?}"
            );
            assert!(
                pipeline.runner().is_untouched(),
                "{action:?} must not call any tool"
            );
        }
    }

    #[test]
    fn full_runs_all_steps_in_order() {
        let root = TempDir::new().unwrap();
        seed_project(&root, "baby_camel");
        std::fs::remove_file(root.child("assets/baby_camel.blend").path()).unwrap();

        let pipeline = pipeline(&root, producing_runner());
        pipeline
            .dispatch(Action::Full, &scene("baby_camel"), &options())
            .unwrap();

        let calls = pipeline.runner().calls();
        let tools: Vec<_> = calls.iter().map(|c| c.tool_name()).collect();
        assert_eq!(tools, ["blender", "blender", "blender", "ffmpeg"]);
        assert!(calls[0].to_string().contains("create_baby_camel.py"));
        assert!(calls[1].to_string().contains("animate_baby_camel_walk.py"));
        assert!(calls[2].to_string().contains("batch_render.py"));
        root.child("renders/baby_camel.mp4").assert(predicates::path::exists());
    }

    #[test]
    fn full_without_video_stops_after_render() {
        let root = TempDir::new().unwrap();
        seed_project(&root, "baby_camel");

        let mut options = options();
        options.force = true;
        options.video = false;

        let pipeline = pipeline(&root, producing_runner());
        pipeline
            .dispatch(Action::Full, &scene("baby_camel"), &options)
            .unwrap();

        assert_eq!(pipeline.runner().calls().len(), 3);
        root.child("renders/baby_camel.mp4").assert(predicates::path::missing());
    }

    #[test]
    fn full_halts_on_first_failure() {
        let root = TempDir::new().unwrap();
        seed_project(&root, "baby_camel");

        // Scene exists and no --force: create refuses, nothing else runs
        let pipeline = pipeline(&root, FakeRunner::ok());
        let err = pipeline
            .dispatch(Action::Full, &scene("baby_camel"), &options())
            .unwrap_err();
        assert!(matches!(err, Error::SceneExists { .. }));
        assert!(pipeline.runner().is_untouched());

        // Animate fails: render and video never start
        let failing = FakeRunner::with(|invocation: &Invocation| {
            if invocation.to_string().contains("animate_") {
                ToolOutput::failed(1, "Python script failed")
            } else {
                ToolOutput::succeeded("")
            }
        });
        let mut forced = options();
        forced.force = true;

        let pipeline = super::testing::pipeline(&root, failing);
        let err = pipeline
            .dispatch(Action::Full, &scene("baby_camel"), &forced)
            .unwrap_err();
        assert!(matches!(err, Error::ToolFailed { .. }));
        assert_eq!(pipeline.runner().calls().len(), 2);
    }

    #[test]
    fn deploy_halts_when_export_produces_nothing() {
        let root = TempDir::new().unwrap();
        seed_project(&root, "baby_camel");
        root.child(".env").write_str("ROBLOX_API_KEY=secret\n").unwrap();

        let pipeline = pipeline(&root, FakeRunner::ok());
        let err = pipeline
            .dispatch(Action::Deploy, &scene("baby_camel"), &options())
            .unwrap_err();

        assert!(matches!(err, Error::MissingOutput { what: "FBX export", .. }));
        assert_eq!(pipeline.runner().calls().len(), 1);
    }

    #[test]
    fn deploy_halts_when_bake_fails() {
        let root = TempDir::new().unwrap();
        seed_project(&root, "baby_camel");
        root.child(".env").write_str("ROBLOX_API_KEY=secret\n").unwrap();

        let runner = FakeRunner::with(|invocation: &Invocation| {
            let line = invocation.to_string();
            if line.contains("bake_pbr.py") {
                return ToolOutput::failed(1, "Object 'Body' has no UV map");
            }
            if let Some(output) = flag_value(invocation, "--output") {
                std::fs::create_dir_all(invocation.cwd.join("exports")).unwrap();
                std::fs::write(invocation.cwd.join(output), b"").unwrap();
            }
            ToolOutput::succeeded("")
        });

        let pipeline = pipeline(&root, runner);
        let err = pipeline
            .dispatch(Action::Deploy, &scene("baby_camel"), &options())
            .unwrap_err();

        assert!(matches!(err, Error::ToolFailed { .. }));
        // export + bake, no rbxcloud
        let tools: Vec<_> = pipeline
            .runner()
            .calls()
            .iter()
            .map(|c| c.tool_name())
            .collect();
        assert_eq!(tools, ["blender", "blender"]);
        root.child("exports/baby_camel_assets.json")
            .assert(predicates::path::missing());
    }
}
