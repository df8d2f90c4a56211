use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use vramc_core::logging::{log, LogCategory, LogConfig, LogLevel};
use vramc_core::ppu::palette::{DMG_GREEN, GRAYSCALE};
use vramc_core::ppu::{IndexedPalette, ShadePalette};
use vramc_core::types::Frame;
use vramc_gb::report::AllocationReport;
use vramc_gb::{codegen, preview, setup_tiles_for_scene, CompiledAssets, Manifest, SceneId, Vram};

#[derive(Parser)]
#[command(name = "vramc", version, about = "Compile tile graphics into fixed tile-memory layouts")]
struct Args {
    /// Log level for every category: off, error, warn, info, debug, trace
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Per-category override such as `allocation=trace` (repeatable)
    #[arg(long = "log", value_name = "CATEGORY=LEVEL", global = true)]
    log_categories: Vec<String>,

    /// Also append log messages to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate Rust source with tile data and per-scene index constants
    Build {
        manifest: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Materialize one scene and write the 8 KiB VRAM image
    Dump {
        manifest: PathBuf,
        /// Scene name or numeric id
        #[arg(long)]
        scene: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print where every tile of every scene was placed
    Inspect {
        manifest: PathBuf,
        /// Emit the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Render one scene's tile memory as a PNG tile sheet
    Preview {
        manifest: PathBuf,
        /// Scene name or numeric id
        #[arg(long)]
        scene: String,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = PaletteChoice::Green)]
        palette: PaletteChoice,
        /// Palette register mapping color ids to shades, e.g. 0xE4 (identity)
        #[arg(long, value_parser = parse_register)]
        bgp: Option<u8>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PaletteChoice {
    Green,
    Gray,
}

impl PaletteChoice {
    fn palette(self) -> ShadePalette {
        match self {
            PaletteChoice::Green => ShadePalette::new(DMG_GREEN),
            PaletteChoice::Gray => ShadePalette::new(GRAYSCALE),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    // All output goes through LogConfig, which filters per category before
    // handing records to env_logger for formatting.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn,vramc=trace"))
        .init();
    configure_logging(&args)?;

    match args.command {
        Command::Build { manifest, output } => {
            let assets = load(&manifest)?;
            let source = codegen::generate(&assets)?;
            match output {
                Some(path) => {
                    fs::write(&path, source)
                        .with_context(|| format!("writing {}", path.display()))?;
                    log(LogCategory::CodeGen, LogLevel::Info, || {
                        format!("wrote {}", path.display())
                    });
                }
                None => print!("{}", source),
            }
        }
        Command::Dump {
            manifest,
            scene,
            output,
        } => {
            let assets = load(&manifest)?;
            let vram = materialize(&assets, &scene)?;
            fs::write(&output, vram.as_bytes())
                .with_context(|| format!("writing {}", output.display()))?;
            log(LogCategory::Materialize, LogLevel::Info, || {
                format!("wrote VRAM image {}", output.display())
            });
        }
        Command::Inspect { manifest, json } => {
            let assets = load(&manifest)?;
            let report = AllocationReport::build(&assets)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
        }
        Command::Preview {
            manifest,
            scene,
            output,
            palette,
            bgp,
        } => {
            let assets = load(&manifest)?;
            let vram = materialize(&assets, &scene)?;
            let palette = preview_palette(palette, bgp);
            let frame = preview::render_tile_sheet(&vram, &palette);
            let png = encode_png(&frame)?;
            fs::write(&output, png).with_context(|| format!("writing {}", output.display()))?;
            log(LogCategory::Materialize, LogLevel::Info, || {
                format!(
                    "wrote preview {} ({} shades, register 0x{:02X})",
                    output.display(),
                    palette.len(),
                    palette.register()
                )
            });
        }
    }

    Ok(())
}

fn configure_logging(args: &Args) -> Result<()> {
    let config = LogConfig::global();
    let level = LogLevel::from_str(&args.log_level)
        .ok_or_else(|| anyhow!("unknown log level '{}'", args.log_level))?;
    config.set_global_level(level);

    for spec in &args.log_categories {
        let (category, level) = parse_category_level(spec)?;
        config.set_level(category, level);
    }

    if let Some(path) = &args.log_file {
        config
            .set_log_file(path.clone())
            .with_context(|| format!("opening log file {}", path.display()))?;
    }
    Ok(())
}

fn parse_register(value: &str) -> Result<u8> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|_| anyhow!("'{}' is not a palette register (0-255 or 0x00-0xFF)", value))
}

fn preview_palette(choice: PaletteChoice, bgp: Option<u8>) -> ShadePalette {
    let palette = choice.palette();
    match bgp {
        Some(register) => palette.with_register(register),
        None => palette,
    }
}

fn parse_category_level(spec: &str) -> Result<(LogCategory, LogLevel)> {
    let Some((category, level)) = spec.split_once('=') else {
        bail!("expected CATEGORY=LEVEL, got '{}'", spec);
    };
    let category = LogCategory::from_str(category)
        .ok_or_else(|| anyhow!("unknown log category '{}'", category))?;
    let level =
        LogLevel::from_str(level).ok_or_else(|| anyhow!("unknown log level '{}'", level))?;
    Ok((category, level))
}

fn load(path: &Path) -> Result<CompiledAssets> {
    let manifest =
        Manifest::from_path(path).with_context(|| format!("loading {}", path.display()))?;
    manifest
        .compile()
        .with_context(|| format!("allocating tiles for {}", path.display()))
}

fn resolve_scene(assets: &CompiledAssets, key: &str) -> Result<SceneId> {
    match assets.find_scene(key) {
        Some(id) => Ok(id),
        None => {
            let names: Vec<&str> = assets.scene_names().collect();
            bail!("no scene '{}' (available: {})", key, names.join(", "))
        }
    }
}

fn materialize(assets: &CompiledAssets, scene: &str) -> Result<Vram> {
    let id = resolve_scene(assets, scene)?;
    let mut vram = Vram::new();
    let written = setup_tiles_for_scene(assets.set(), id, &mut vram)?;
    log(LogCategory::Materialize, LogLevel::Info, || {
        format!("scene {} ({}): {} tiles materialized", id, scene, written)
    });
    Ok(vram)
}

fn encode_png(frame: &Frame) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut encoder = png::Encoder::new(&mut bytes, frame.width, frame.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&frame.to_rgba())?;
    writer.finish()?;
    Ok(bytes)
}
