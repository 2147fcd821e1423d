//! Upload the exported model and baked textures to Roblox through `rbxcloud`
//! and record the resulting asset ids in a manifest.

pub mod credentials;
pub mod manifest;
pub mod rbxcloud;

pub use credentials::Credentials;
pub use manifest::Manifest;
pub use rbxcloud::{AssetId, AssetRequest, OperationStatus, RbxCloud};

use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::runner::{Runner, resolve_tool};
use crate::scene::{Scene, ScenePaths};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

/// SurfaceAppearance maps, in upload order
pub const TEXTURE_MAPS: [&str; 4] = ["ColorMap", "NormalMap", "RoughnessMap", "MetalnessMap"];

/// `name: rbxassetid://id` for each uploaded asset, in upload order
fn asset_lines(requests: &[AssetRequest], manifest: &Manifest) -> Vec<String> {
    requests
        .iter()
        .filter_map(|request| {
            let asset_id = manifest.assets.get(&request.key)?;
            Some(format!("{}: rbxassetid://{asset_id}", request.key))
        })
        .collect()
}

impl<R: Runner> Pipeline<R> {
    pub fn upload(&self, scene: &Scene) -> Result<()> {
        let paths = self.paths(scene);
        self.require_file("environment file", &paths.env_file)?;

        let credentials = Credentials::load(
            &self.on_disk(&paths.env_file),
            &paths.env_file,
            self.env,
            self.config.upload.creator_id.as_deref(),
        )?;

        let requests = self.upload_requests(scene, &paths);
        if requests.is_empty() {
            warn!(
                "Nothing to upload for {scene}: no FBX or textures under {}",
                paths.exports_dir.display()
            );
        }

        let cloud = RbxCloud::new(
            &self.runner,
            resolve_tool(&self.root, &self.config.tools.rbxcloud),
            &self.root,
            &credentials.api_key,
        );

        let mut manifest = Manifest::new(scene.name());
        for request in &requests {
            if let Some(asset_id) = self.upload_one(&cloud, request, &credentials)? {
                manifest.assets.insert(request.key.clone(), asset_id);
            }
        }

        let manifest_path = self.on_disk(&paths.manifest);
        manifest.write(&manifest_path)?;
        if !manifest_path.is_file() {
            return Err(Error::MissingOutput {
                what: "upload manifest",
                path: paths.manifest,
            });
        }

        let written = Manifest::read(&manifest_path)?;
        if written.assets.is_empty() {
            warn!("No assets were uploaded for {scene}");
        } else {
            info!(
                "Uploaded {}/{} asset(s); ids saved to {}",
                written.assets.len(),
                requests.len(),
                paths.manifest.display()
            );
            for line in asset_lines(&requests, &written) {
                println!("{line}");
            }
        }
        Ok(())
    }

    /// The model and whichever texture maps exist on disk
    fn upload_requests(&self, scene: &Scene, paths: &ScenePaths) -> Vec<AssetRequest> {
        let name = scene.name();
        let mut requests = Vec::new();

        if self.on_disk(&paths.fbx).is_file() {
            requests.push(AssetRequest {
                key: "model".to_string(),
                asset_type: "model-fbx",
                file: paths.fbx.clone(),
                display_name: format!("{name} Model"),
                description: format!("Animated {name} from Blender"),
            });
        } else {
            info!("No FBX found at {}", paths.fbx.display());
        }

        for map in TEXTURE_MAPS {
            match self.find_texture(scene, paths, map) {
                Some(file) => requests.push(AssetRequest {
                    key: map.to_string(),
                    asset_type: "decal-png",
                    file,
                    display_name: format!("{name} {map}"),
                    description: format!("{map} texture for {name}"),
                }),
                None => debug!("No {map} texture found for {scene}"),
            }
        }

        requests
    }

    fn find_texture(&self, scene: &Scene, paths: &ScenePaths, map: &str) -> Option<PathBuf> {
        let name = scene.name();
        let baked = self.config.bake.object.replace(' ', "_");
        let candidates = [
            format!("{name}_{map}.png"),
            format!("{}_{map}.png", name.replace('_', "")),
            format!("{baked}_{map}.png"),
        ];

        candidates.iter().find_map(|file_name| {
            [&paths.textures_dir, &paths.exports_dir]
                .into_iter()
                .map(|dir| dir.join(file_name))
                .find(|candidate| self.on_disk(candidate).is_file())
        })
    }

    /// Upload a single asset and wait for its id. Per-asset failures are
    /// logged and skipped; a missing `rbxcloud` aborts the upload.
    fn upload_one(
        &self,
        cloud: &RbxCloud<'_, R>,
        request: &AssetRequest,
        credentials: &Credentials,
    ) -> Result<Option<AssetId>> {
        info!(
            "Uploading {} as {}: {}",
            request.key,
            request.asset_type,
            request.file.display()
        );

        let upload = &self.config.upload;
        let operation = match cloud.create(request, &credentials.creator_id, &upload.creator_type) {
            Ok(operation) => operation,
            Err(err @ Error::ToolUnavailable { .. }) => return Err(err),
            Err(err) => {
                warn!("Upload of {} failed: {err}", request.key);
                return Ok(None);
            }
        };

        match operation.status() {
            OperationStatus::Ready(asset_id) => return Ok(Some(asset_id)),
            OperationStatus::Failed(reason) => {
                warn!("Upload of {} failed: {reason}", request.key);
                return Ok(None);
            }
            OperationStatus::Pending => {}
        }

        let Some(operation_path) = operation.path else {
            warn!(
                "Upload of {} returned no operation to wait on",
                request.key
            );
            return Ok(None);
        };

        self.wait_for_asset(cloud, &request.key, &operation_path)
    }

    fn wait_for_asset(
        &self,
        cloud: &RbxCloud<'_, R>,
        key: &str,
        operation_path: &str,
    ) -> Result<Option<AssetId>> {
        let upload = &self.config.upload;
        let spinner = self.progress.add(ProgressBar::new_spinner());
        spinner.set_style(ProgressStyle::default_spinner());
        spinner.set_message(format!("Waiting for {key} to finish processing"));
        spinner.enable_steady_tick(Duration::from_millis(100));

        let started = Instant::now();
        let result = loop {
            match cloud.operation(operation_path) {
                Ok(operation) => match operation.status() {
                    OperationStatus::Ready(asset_id) => {
                        info!("{key} ready: {asset_id}");
                        break Some(asset_id);
                    }
                    OperationStatus::Failed(reason) => {
                        warn!("Processing of {key} failed: {reason}");
                        break None;
                    }
                    OperationStatus::Pending => {}
                },
                Err(err @ Error::ToolUnavailable { .. }) => {
                    spinner.finish_and_clear();
                    return Err(err);
                }
                Err(err) => debug!("Polling {operation_path} failed: {err}"),
            }

            if started.elapsed() >= upload.timeout() {
                warn!(
                    "Timed out after {}s waiting for {key}",
                    upload.timeout_secs
                );
                break None;
            }
            thread::sleep(upload.poll_interval());
        };

        spinner.finish_and_clear();
        Ok(result)
    }
}
