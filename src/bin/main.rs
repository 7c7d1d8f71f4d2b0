//! Schematic Voxelizer CLI
//!
//! Convert meshes into Minecraft block placements.

use clap::{Parser, Subcommand, ValueEnum};
use schematic_voxelizer::export::json::write_json;
use schematic_voxelizer::{
    export_commands, load_atlas, load_obj, Axis, CommandOrigin, MatchMode, Pipeline, PipelineConfig,
};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "schematic-voxelizer")]
#[command(author, version, about = "Convert meshes into Minecraft block placements", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Voxelize an OBJ mesh and assign blocks
    Voxelize {
        /// Input Wavefront OBJ file
        #[arg(short, long)]
        input: PathBuf,

        /// Texture image for the mesh's UVs
        #[arg(short, long)]
        texture: Option<PathBuf>,

        /// Block atlas JSON file
        #[arg(short, long)]
        atlas: PathBuf,

        /// Pipeline configuration JSON file (partial configs allowed)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Voxels along the constrained axis (overrides the config file)
        #[arg(long)]
        size: Option<u32>,

        /// Constrained axis: x, y or z (overrides the config file)
        #[arg(long, value_parser = parse_axis)]
        axis: Option<Axis>,

        /// Use the parallel batched matcher
        #[arg(long)]
        batched: bool,

        /// Absolute origin for commands as x,y,z; relative to the player if omitted
        #[arg(long, value_parser = parse_origin)]
        origin: Option<[i32; 3]>,
    },

    /// Show information about a block atlas
    AtlasInfo {
        /// Block atlas JSON file
        #[arg(short, long)]
        atlas: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Block list as JSON
    Json,
    /// One placement command per line
    Commands,
}

fn parse_axis(s: &str) -> Result<Axis, String> {
    Axis::from_str(s).ok_or_else(|| format!("Invalid axis: '{}'. Use x, y or z", s))
}

fn parse_origin(s: &str) -> Result<[i32; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("Invalid origin format: '{}'. Use x,y,z", s));
    }
    let mut origin = [0; 3];
    for (slot, part) in origin.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("Invalid origin coordinate: '{}'", part))?;
    }
    Ok(origin)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match cli.command {
        Commands::Voxelize {
            input,
            texture,
            atlas,
            config,
            output,
            format,
            size,
            axis,
            batched,
            origin,
        } => {
            let mut pipeline_config = match &config {
                Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
                None => PipelineConfig::default(),
            };
            if let Some(size) = size {
                pipeline_config.voxelizer.target_size = size;
            }
            if let Some(axis) = axis {
                pipeline_config.voxelizer.axis = axis;
            }
            if batched {
                pipeline_config.assigner.mode = MatchMode::Batched;
            }

            voxelize(&input, texture.as_ref(), &atlas, pipeline_config, &output, format, origin)?;
        }
        Commands::AtlasInfo { atlas } => {
            show_atlas_info(&atlas)?;
        }
    }

    Ok(())
}

fn voxelize(
    input_path: &PathBuf,
    texture_path: Option<&PathBuf>,
    atlas_path: &PathBuf,
    config: PipelineConfig,
    output_path: &PathBuf,
    format: OutputFormat,
    origin: Option<[i32; 3]>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading atlas from {:?}...", atlas_path);
    let atlas = load_atlas(atlas_path)?;
    println!("  Found {} blocks", atlas.len());

    println!("Loading mesh from {:?}...", input_path);
    let mesh = load_obj(input_path, texture_path.map(|p| p.as_path()))?;
    println!(
        "  Loaded {} vertices, {} triangles ({} colors)",
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.color_source().name()
    );

    println!("Voxelizing with config:");
    println!("  - Target size: {} along {}", config.voxelizer.target_size, config.voxelizer.axis);
    println!("  - Overlap rule: {:?}", config.voxelizer.overlap_rule);
    println!(
        "  - Dithering: {:?} ({})",
        config.assigner.dithering, config.assigner.dither_magnitude
    );
    println!("  - Matching: {:?}", config.assigner.mode);

    let mut last_percent = 0;
    let mut report = |p: f32| {
        let percent = (p * 100.0) as u32;
        if percent >= last_percent + 10 || (p >= 1.0 && percent > last_percent) {
            last_percent = percent;
            log::info!("progress {}%", percent);
        }
    };

    let pipeline = Pipeline::new(config);
    let blocks = pipeline.run(&mesh, &atlas, Some(&mut report))?;
    println!("  Assigned {} blocks", blocks.len());

    match format {
        OutputFormat::Json => {
            write_json(&blocks, output_path)?;
            println!("Exported JSON to {:?}", output_path);
        }
        OutputFormat::Commands => {
            let origin = origin.map_or(CommandOrigin::Relative, CommandOrigin::Absolute);
            let commands = export_commands(&blocks, origin);
            fs::write(output_path, commands.join("\n"))?;
            println!("Exported {} commands to {:?}", commands.len(), output_path);
        }
    }

    Ok(())
}

fn show_atlas_info(atlas_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading atlas from {:?}...", atlas_path);
    let atlas = load_atlas(atlas_path)?;

    let mut names = atlas.all_names();
    names.sort_unstable();

    println!("\nAtlas Info:");
    println!("  Blocks: {}", atlas.len());
    println!("  Sample:");
    for name in names.iter().take(10) {
        println!("    {}", name);
    }

    Ok(())
}
