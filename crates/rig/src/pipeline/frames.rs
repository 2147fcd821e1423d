use super::Pipeline;
use crate::error::{Error, Result};
use crate::runner::Runner;
use crate::scene::Scene;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Names `frame_%04d.png` can produce: four digits, or more without a leading zero
static FRAME_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^frame_(\d{4}|[1-9]\d{4,})\.png$").expect("valid frame pattern"));

/// One rendered still in a numbered sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub index: u32,
    pub name: String,
}

impl Frame {
    fn parse(name: &str) -> Option<Self> {
        let captures = FRAME_NAME.captures(name)?;
        let index = captures[1].parse().ok()?;
        Some(Self {
            index,
            name: name.to_string(),
        })
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(&self.name)
    }
}

/// Frames in `dir`, ordered by index. Unrelated files are ignored.
pub fn collect_frames(dir: &Path) -> Result<Vec<Frame>> {
    let mut frames: Vec<Frame> = fs_err::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .filter_map(|e| e.file_name().to_str().and_then(Frame::parse))
        .collect();

    frames.sort_by_key(|f| f.index);
    Ok(frames)
}

/// Indices missing between the first and last frame
pub(crate) fn gaps(frames: &[Frame]) -> Vec<u32> {
    frames
        .windows(2)
        .flat_map(|pair| pair[0].index.saturating_add(1)..pair[1].index)
        .collect()
}

impl<R: Runner> Pipeline<R> {
    /// Paths of every `step`th frame, starting with the first. Paths include
    /// the project root so they open from the caller's directory.
    pub fn verify(&self, scene: &Scene, step: usize) -> Result<Vec<PathBuf>> {
        if step == 0 {
            return Err(Error::InvalidStep);
        }

        let paths = self.paths(scene);
        self.require_dir("render output directory", &paths.frames_dir)?;

        let frames_dir = self.on_disk(&paths.frames_dir);
        let frames = collect_frames(&frames_dir)?;
        Ok(frames
            .iter()
            .step_by(step)
            .map(|f| f.path_in(&frames_dir))
            .collect())
    }

    pub(crate) fn frames(&self, scene: &Scene) -> Result<Vec<Frame>> {
        collect_frames(&self.on_disk(&self.paths(scene).frames_dir))
    }
}
