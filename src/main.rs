//! Veles CLI - command-line tool for car model containers and color patches.
//!
//! This is the main entry point for the Veles command-line application.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use veles_car::{CarFile, Slot, CAR_MAGIC};
use veles_pat::{append_duplicate_paint, PatFile, Rgba, PAT_MAGIC};

/// Veles - car model container and color patch tool
#[derive(Parser)]
#[command(name = "veles")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the contents of a model container or color patch
    Info {
        /// Path to a CAR4 or Pat0 file
        #[arg(short, long, env = "INPUT_FILE")]
        input: PathBuf,
    },

    /// Extract slot payloads from a model container
    Extract {
        /// Path to the model container
        #[arg(short, long, env = "INPUT_MODEL")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: PathBuf,

        /// Only extract the named slots (default: all present)
        #[arg(short, long)]
        slot: Vec<String>,
    },

    /// Rebuild a model container with payloads from an asset directory
    Rebuild {
        /// Path to the template model container
        #[arg(short, long, env = "INPUT_MODEL")]
        input: PathBuf,

        /// Directory scanned for {SlotName}.bin / {SlotName}.pat files
        #[arg(short, long)]
        assets: PathBuf,

        /// Output model file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Append a duplicate of the last paint entry to a color patch
    AddPaint {
        /// Input .pat file
        #[arg(short, long)]
        input: PathBuf,

        /// Output .pat file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Export one paint's colors as a single-row PNG
    ExportColors {
        /// Input .pat file
        #[arg(short, long)]
        input: PathBuf,

        /// Paint index
        #[arg(short, long, default_value_t = 0)]
        paint: usize,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import a paint's colors from a PNG
    ImportColors {
        /// Input .pat file
        #[arg(short, long)]
        input: PathBuf,

        /// Paint index
        #[arg(short, long, default_value_t = 0)]
        paint: usize,

        /// PNG with exactly one pixel per color
        #[arg(long)]
        image: PathBuf,

        /// Output .pat file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { input } => cmd_info(&input),
        Commands::Extract { input, output, slot } => cmd_extract(&input, &output, &slot),
        Commands::Rebuild { input, assets, output } => cmd_rebuild(&input, &assets, &output),
        Commands::AddPaint { input, output } => cmd_add_paint(&input, &output),
        Commands::ExportColors { input, paint, output } => cmd_export_colors(&input, paint, &output),
        Commands::ImportColors { input, paint, image, output } => {
            cmd_import_colors(&input, paint, &image, &output)
        }
    }
}

fn cmd_info(input: &Path) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;

    if data.starts_with(CAR_MAGIC) {
        let car = CarFile::parse(&data)?;
        println!(
            "Model container: {} bytes ({} declared)",
            data.len(),
            car.total_size()
        );
        for slot in Slot::all() {
            match car.extent(slot) {
                Some((start, end)) => {
                    println!("{:>20}  {:#010x}  {} bytes", slot.name(), start, end - start)
                }
                None => println!("{:>20}  (absent)", slot.name()),
            }
        }
    } else if data.starts_with(PAT_MAGIC) {
        let pat = PatFile::parse(&data)?;
        println!(
            "Color patch: {} paints, {} patches per paint",
            pat.color_count(),
            pat.offsets_per_color()
        );
        for (index, paint) in pat.paints().iter().enumerate() {
            println!(
                "Paint {:>2}: {} colors across {} patches",
                index,
                paint.flat_len(),
                paint.patches().len()
            );
        }
    } else {
        bail!("unrecognized file format (expected CAR4 or Pat0 magic)");
    }

    Ok(())
}

fn cmd_extract(input: &Path, output: &Path, slots: &[String]) -> Result<()> {
    let car = CarFile::from_path(input).context("Failed to load model container")?;

    let selected: Vec<Slot> = if slots.is_empty() {
        car.present_slots().collect()
    } else {
        slots
            .iter()
            .map(|name| parse_slot_name(name))
            .collect::<Result<_>>()?
    };

    fs::create_dir_all(output).context("Failed to create output directory")?;

    let mut written = 0;
    for slot in selected {
        let Some(bytes) = car.slot_bytes(slot) else {
            println!("{}: absent, skipped", slot.name());
            continue;
        };
        let path = output.join(slot.file_name());
        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{} -> {} ({} bytes)", slot.name(), path.display(), bytes.len());
        written += 1;
    }

    println!("Extracted {} slots", written);
    Ok(())
}

fn cmd_rebuild(input: &Path, assets: &Path, output: &Path) -> Result<()> {
    let car = CarFile::from_path(input).context("Failed to load template container")?;

    // Replacement assets are picked up by their fixed file names,
    // {SlotName}.bin or {SlotName}.pat for the color patch slots.
    let mut replacements = BTreeMap::new();
    for slot in Slot::all() {
        let path = assets.join(slot.file_name());
        if path.is_file() {
            let bytes =
                fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            println!("Replacing {} ({} bytes)", slot.name(), bytes.len());
            replacements.insert(slot, bytes);
        }
    }
    if replacements.is_empty() {
        println!("No replacement assets found in {}", assets.display());
    }

    let rebuilt = car.rebuild(&replacements);
    fs::write(output, &rebuilt).context("Failed to write output model")?;
    println!("Wrote {} ({} bytes)", output.display(), rebuilt.len());
    Ok(())
}

fn cmd_add_paint(input: &Path, output: &Path) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;
    let grown = append_duplicate_paint(&data).context("Failed to append paint entry")?;
    let paint_count = PatFile::parse(&grown)?.color_count();

    fs::write(output, &grown).context("Failed to write output file")?;

    println!("Paint count: {}", paint_count);
    println!(
        "Size: {} -> {} bytes (+{})",
        data.len(),
        grown.len(),
        grown.len() - data.len()
    );
    println!(
        "Menu model offsets referencing this patch must grow by {} bytes.",
        grown.len() - data.len()
    );
    Ok(())
}

fn cmd_export_colors(input: &Path, paint: usize, output: &Path) -> Result<()> {
    let pat = PatFile::from_path(input).context("Failed to load color patch")?;
    let colors = pat
        .flat_colors(paint)
        .with_context(|| format!("no paint at index {paint}"))?;
    if colors.is_empty() {
        bail!("paint {paint} has no colors");
    }

    let mut row = image::RgbaImage::new(colors.len() as u32, 1);
    for (x, color) in colors.iter().enumerate() {
        row.put_pixel(x as u32, 0, image::Rgba(color.to_bytes()));
    }
    row.save(output).context("Failed to save PNG")?;

    println!("Exported {} colors to {}", colors.len(), output.display());
    Ok(())
}

fn cmd_import_colors(input: &Path, paint: usize, png: &Path, output: &Path) -> Result<()> {
    let mut pat = PatFile::from_path(input).context("Failed to load color patch")?;
    let pixels = image::open(png).context("Failed to open PNG")?.into_rgba8();

    let colors: Vec<Rgba> = pixels.pixels().map(|p| Rgba::from_bytes(p.0)).collect();
    pat.replace_flat_colors(paint, &colors)
        .context("Color import rejected")?;
    pat.write_to(output).context("Failed to write color patch")?;

    println!("Imported {} colors into paint {}", colors.len(), paint);
    Ok(())
}

fn parse_slot_name(name: &str) -> Result<Slot> {
    Slot::all()
        .into_iter()
        .find(|slot| slot.name().eq_ignore_ascii_case(name))
        .with_context(|| format!("unknown slot name: {name}"))
}
