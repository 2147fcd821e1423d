pub mod args;

pub use args::{RunArgs, SceneArgs, VerifyArgs};

use crate::pipeline::Action;
use crate::scene::Scene;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Build the scene file by running its creation script
    Create(SceneArgs),
    /// Add the walk cycle to an existing scene
    Animate(SceneArgs),
    /// Render animation frames to renders/<scene>/
    Render(SceneArgs),
    /// Encode rendered frames into renders/<scene>.mp4
    Video(SceneArgs),
    /// Run create, animate, render and video in order
    Full(SceneArgs),
    /// Print every Nth rendered frame for a quick visual check
    Verify(VerifyArgs),
    /// Delete rendered frames and the encoded video
    Clean(SceneArgs),
    /// Export the scene to FBX for Roblox Studio
    Export(SceneArgs),
    /// Bake PBR texture maps for the configured object
    Bake(SceneArgs),
    /// Upload the FBX and baked textures to Roblox
    Upload(SceneArgs),
    /// Run export, bake and upload in order
    Deploy(SceneArgs),
    /// Switch the scene to standard color management
    Colors(SceneArgs),
}

impl Commands {
    /// Split into the pipeline action, its scene and the shared flags
    pub fn into_parts(self) -> (Action, Scene, RunArgs) {
        let (action, args) = match self {
            Commands::Verify(args) => {
                let step = args.every.map(|n| n as usize);
                return (Action::Verify { step }, args.scene, args.run);
            }
            Commands::Create(args) => (Action::Create, args),
            Commands::Animate(args) => (Action::Animate, args),
            Commands::Render(args) => (Action::Render, args),
            Commands::Video(args) => (Action::Video, args),
            Commands::Full(args) => (Action::Full, args),
            Commands::Clean(args) => (Action::Clean, args),
            Commands::Export(args) => (Action::Export, args),
            Commands::Bake(args) => (Action::Bake, args),
            Commands::Upload(args) => (Action::Upload, args),
            Commands::Deploy(args) => (Action::Deploy, args),
            Commands::Colors(args) => (Action::Colors, args),
        };
        (action, args.scene, args.run)
    }
}
