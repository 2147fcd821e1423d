use crate::error::{Error, Result};
use rig_config::{Engine, RenderConfig};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl From<[u32; 2]> for Resolution {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Frames to render. Unset bounds keep whatever the scene file says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    pub start: Option<u32>,
    pub end: Option<u32>,
    pub step: u32,
    /// Render just this frame instead of the animation
    pub single: Option<u32>,
}

impl FrameRange {
    pub fn new(start: Option<u32>, end: Option<u32>, step: u32) -> Result<Self> {
        if step == 0 {
            return Err(Error::InvalidStep);
        }
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(Error::InvalidFrameRange { start, end });
            }
        }
        Ok(Self {
            start,
            end,
            step,
            single: None,
        })
    }

    pub fn single(frame: u32) -> Self {
        Self {
            single: Some(frame),
            ..Self::default()
        }
    }
}

impl Default for FrameRange {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            step: 1,
            single: None,
        }
    }
}

/// What the FBX export script writes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Object names to export; empty exports every mesh
    pub objects: Vec<String>,
    /// Export as-is, without validation or applying transforms
    pub skip_validation: bool,
}

/// Settings for a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub engine: Engine,
    pub samples: u32,
    pub fps: u32,
    pub frames: FrameRange,
    pub resolution: Resolution,
    /// Overwrite an existing scene file or frame directory
    pub force: bool,
    /// Encode a video at the end of `full`
    pub video: bool,
    pub export: ExportOptions,
}

impl RunOptions {
    pub fn from_config(render: &RenderConfig) -> Self {
        Self {
            engine: render.engine,
            samples: render.samples,
            fps: render.fps,
            frames: FrameRange::default(),
            resolution: render.resolution.into(),
            force: false,
            video: true,
            export: ExportOptions::default(),
        }
    }
}
