//! spm-inspect - SPM mesh inspection tool
//!
//! Prints the structure of SPM files, evaluates armature poses and validates
//! batches of meshes.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use spm_mesh::{LoaderConfig, PoseArena, SkeletalMesh, TextureCache, attr_flags, load_spm};

#[derive(Parser)]
#[command(name = "spm-inspect")]
#[command(about = "SPM mesh inspection tool")]
#[command(version)]
struct Cli {
    /// Loader configuration (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print header, buffers, materials and armatures
    Info {
        /// Input .spm file
        input: PathBuf,
    },

    /// Print joint world positions at a frame
    Pose {
        /// Input .spm file
        input: PathBuf,

        /// Frame to evaluate (fractional frames interpolate)
        #[arg(short, long)]
        frame: f32,

        /// Armature index
        #[arg(short, long, default_value_t = 0)]
        armature: usize,
    },

    /// Parse files and report failures
    Check {
        /// Input .spm files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LoaderConfig::load(path)
            .with_context(|| format!("Failed to load config: {:?}", path))?,
        None => LoaderConfig::default(),
    };
    let mut textures = TextureCache::new(&config);

    match cli.command {
        Commands::Info { input } => {
            let mesh = load(&input, &mut textures)?;
            print_info(&input, &mesh, &textures);
        }

        Commands::Pose {
            input,
            frame,
            armature,
        } => {
            let mesh = load(&input, &mut textures)?;
            print_pose(&input, &mesh, frame, armature)?;
        }

        Commands::Check { inputs } => {
            let mut failed = 0;
            for input in &inputs {
                // Failures are logged by the loader
                if load_spm(input, &mut textures).is_ok() {
                    tracing::info!("{:?}: ok", input);
                } else {
                    failed += 1;
                }
            }
            if failed > 0 {
                anyhow::bail!("{} of {} files failed to load", failed, inputs.len());
            }
            tracing::info!("All {} files loaded", inputs.len());
        }
    }

    Ok(())
}

fn load(input: &Path, textures: &mut TextureCache) -> Result<SkeletalMesh> {
    load_spm(input, textures).with_context(|| format!("Failed to load mesh: {:?}", input))
}

fn describe_flags(flags: u8) -> String {
    let names: Vec<&str> = [
        (attr_flags::NORMAL, "normal"),
        (attr_flags::VERTEX_COLOR, "color"),
        (attr_flags::TANGENT, "tangent"),
    ]
    .into_iter()
    .filter(|(bit, _)| flags & bit != 0)
    .map(|(_, name)| name)
    .collect();

    if names.is_empty() {
        "none".to_string()
    } else {
        names.join("|")
    }
}

fn print_info(input: &Path, mesh: &SkeletalMesh, textures: &TextureCache) {
    tracing::info!(
        "{:?}: {:?} mesh, attributes {}",
        input,
        mesh.kind,
        describe_flags(mesh.flags)
    );

    for material in &mesh.materials {
        for (slot, name) in material.texture_names.iter().enumerate() {
            if name.is_empty() {
                continue;
            }
            let resolved = material.textures[slot]
                .and_then(|handle| textures.path(handle))
                .map(|path| format!("{:?}", path))
                .unwrap_or_else(|| "unresolved".to_string());
            tracing::info!(
                "  material [{}] texture {}: '{}' -> {}",
                material.id,
                slot + 1,
                name,
                resolved
            );
        }
    }

    for (i, buffer) in mesh.buffers.iter().enumerate() {
        tracing::info!(
            "  buffer [{}]: {} vertices, {} indices, material {}",
            i,
            buffer.vertex_count(),
            buffer.index_count(),
            buffer.material_id
        );
    }
    tracing::info!(
        "  total: {} vertices, {} indices",
        mesh.vertex_count(),
        mesh.index_count()
    );

    let declared = mesh.declared_bounds;
    tracing::info!("  declared bounds: {} .. {}", declared.min, declared.max);
    if let Some(bounds) = mesh.bounds {
        tracing::info!("  vertex bounds: {} .. {}", bounds.min, bounds.max);
    }

    if let Some(rig) = &mesh.rig {
        tracing::info!(
            "  rig: {} armatures, {} skin slots, bind frame {}, {} frames",
            rig.armatures().len(),
            rig.slot_count(),
            rig.bind_frame(),
            rig.frame_count()
        );
        for (i, armature) in rig.armatures().iter().enumerate() {
            let (first, last) = armature.frame_range().unwrap_or_default();
            tracing::info!(
                "  armature [{}]: {} joints ({} used), {} keyframes ({}..={})",
                i,
                armature.joint_count(),
                armature.joint_used(),
                armature.keyframes.len(),
                first,
                last
            );
        }
    }
}

fn print_pose(input: &Path, mesh: &SkeletalMesh, frame: f32, index: usize) -> Result<()> {
    let Some(rig) = &mesh.rig else {
        anyhow::bail!("{:?} is a static mesh without armatures", input);
    };
    let Some(armature) = rig.armatures().get(index) else {
        anyhow::bail!(
            "Armature {} not found ({} armatures in {:?})",
            index,
            rig.armatures().len(),
            input
        );
    };

    let mut arena = PoseArena::new();
    let world = armature.world_pose(frame, &mut arena);

    tracing::info!("Armature [{}] of {:?} at frame {}:", index, input, frame);
    for (joint, matrix) in world.iter().enumerate() {
        let position = matrix.transform_point3(glam::Vec3::ZERO);
        tracing::info!(
            "  [{}] '{}': ({:.3}, {:.3}, {:.3})",
            joint,
            armature.joint_names[joint],
            position.x,
            position.y,
            position.z
        );
    }
    Ok(())
}
