use crate::error::Result;
use crate::options::{ExportOptions, FrameRange, Resolution, RunOptions};
use crate::scene::Scene;
use clap::Args;
use rig_config::{Engine, RenderConfig};

#[derive(Args, Debug, Clone)]
pub struct SceneArgs {
    /// Scene name, e.g. `baby_camel` for assets/baby_camel.blend
    #[arg(value_name = "SCENE")]
    pub scene: Scene,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Scene name
    #[arg(value_name = "SCENE")]
    pub scene: Scene,

    /// List every Nth frame (defaults to render.verify_step in rig.toml)
    #[arg(value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub every: Option<u64>,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Flags shared by every command. Unset values fall back to rig.toml.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Render engine: CYCLES, EEVEE or WORKBENCH
    #[arg(long, value_name = "ENGINE")]
    pub engine: Option<Engine>,

    /// Render samples per pixel
    #[arg(long)]
    pub samples: Option<u32>,

    /// Frame rate of the encoded video
    #[arg(long)]
    pub fps: Option<u32>,

    /// First frame to render (default: scene setting)
    #[arg(long)]
    pub start: Option<u32>,

    /// Last frame to render (default: scene setting)
    #[arg(long)]
    pub end: Option<u32>,

    /// Render every Nth frame
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub step: Option<u32>,

    /// Render only this frame
    #[arg(long, value_name = "N", conflicts_with_all = ["start", "end", "step"])]
    pub frame: Option<u32>,

    /// Output resolution
    #[arg(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
    pub resolution: Option<Vec<u32>>,

    /// Skip video encoding in `full`
    #[arg(long)]
    pub no_video: bool,

    /// Overwrite an existing scene file or frame directory
    #[arg(long)]
    pub force: bool,

    /// Objects to export to FBX (default: every mesh)
    #[arg(long, num_args = 1.., value_name = "NAME")]
    pub objects: Vec<String>,

    /// Export without validating the scene or applying transforms
    #[arg(long)]
    pub skip_validation: bool,
}

impl RunArgs {
    pub fn resolve(&self, render: &RenderConfig) -> Result<RunOptions> {
        let mut options = RunOptions::from_config(render);

        if let Some(engine) = self.engine {
            options.engine = engine;
        }
        if let Some(samples) = self.samples {
            options.samples = samples;
        }
        if let Some(fps) = self.fps {
            options.fps = fps;
        }
        if let Some([width, height]) = self.resolution.as_deref() {
            options.resolution = Resolution {
                width: *width,
                height: *height,
            };
        }

        options.frames = match self.frame {
            Some(frame) => FrameRange::single(frame),
            None => FrameRange::new(self.start, self.end, self.step.unwrap_or(1))?,
        };
        options.force = self.force;
        options.video = !self.no_video;
        options.export = ExportOptions {
            objects: self.objects.clone(),
            skip_validation: self.skip_validation,
        };
        Ok(options)
    }
}
