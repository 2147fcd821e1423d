use super::Pipeline;
use crate::error::Result;
use crate::runner::Runner;
use crate::scene::Scene;
use log::info;
use walkdir::WalkDir;

impl<R: Runner> Pipeline<R> {
    /// Remove rendered frames and the encoded video. Absent files are fine.
    pub fn clean(&self, scene: &Scene) -> Result<()> {
        let paths = self.paths(scene);
        let mut removed_anything = false;

        let frames_dir = self.on_disk(&paths.frames_dir);
        if frames_dir.is_dir() {
            let files = WalkDir::new(&frames_dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .count();
            fs_err::remove_dir_all(&frames_dir)?;
            info!(
                "Removed {} ({files} file(s))",
                paths.frames_dir.display()
            );
            removed_anything = true;
        }

        let video = self.on_disk(&paths.video);
        if video.is_file() {
            fs_err::remove_file(&video)?;
            info!("Removed {}", paths.video.display());
            removed_anything = true;
        }

        if !removed_anything {
            info!("Nothing to clean for {scene}");
        }
        Ok(())
    }
}
