use super::Pipeline;
use super::frames::gaps;
use crate::error::{Error, Result};
use crate::options::RunOptions;
use crate::runner::Runner;
use crate::scene::Scene;
use indicatif::HumanBytes;
use log::{info, warn};

/// printf-style input pattern matching `frame_0001.png`
const FRAME_PATTERN: &str = "frame_%04d.png";

impl<R: Runner> Pipeline<R> {
    /// Encode the rendered frames into a single video at `options.fps`
    pub fn video(&self, scene: &Scene, options: &RunOptions) -> Result<()> {
        let paths = self.paths(scene);
        self.require_dir("render output directory", &paths.frames_dir)?;

        let frames = self.frames(scene)?;
        let Some(first) = frames.first() else {
            return Err(Error::NoFrames {
                dir: paths.frames_dir,
            });
        };

        let missing = gaps(&frames);
        if !missing.is_empty() {
            warn!(
                "{} frame(s) missing from the sequence; the video will stop at frame {}",
                missing.len(),
                missing[0] - 1
            );
        }

        let video = &self.config.video;
        let invocation = self
            .tool(&self.config.tools.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-framerate".to_string(), options.fps.to_string()])
            .args(["-start_number".to_string(), first.index.to_string()])
            .arg("-i")
            .arg(paths.frames_dir.join(FRAME_PATTERN))
            .args(["-c:v", video.codec.as_str()])
            .args(["-crf".to_string(), video.crf.to_string()])
            .args(["-pix_fmt", video.pixel_format.as_str()])
            .arg(&paths.video);

        info!(
            "Encoding {} frame(s) at {} fps into {}",
            frames.len(),
            options.fps,
            paths.video.display()
        );
        self.runner.execute(&invocation)?;

        let metadata = match fs_err::metadata(self.on_disk(&paths.video)) {
            Ok(metadata) => metadata,
            Err(_) => {
                return Err(Error::MissingOutput {
                    what: "video",
                    path: paths.video,
                });
            }
        };

        info!(
            "Wrote {} ({})",
            paths.video.display(),
            HumanBytes(metadata.len())
        );
        Ok(())
    }
}
