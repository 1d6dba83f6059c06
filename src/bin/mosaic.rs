use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

use image_to_mosaic_wasm::{
    DEFAULT_CELL_PIXEL_SIZE, DEFAULT_CHUNK_SIZE, QuantizeOptions, TransparencyPolicy, mosaic_bytes,
    palette::palette,
};

/// Convert images into block mosaics using the Rust WASM library (native wrapper).
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Rendered size of one cell in pixels
    #[arg(short = 's', long, default_value_t = DEFAULT_CELL_PIXEL_SIZE)]
    cell_size: u32,

    /// Pixels processed between progress reports
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Skip the grid-line overlay
    #[arg(long)]
    no_grid: bool,

    /// Skip shade labels in the assignment output
    #[arg(long)]
    no_labels: bool,

    /// Map transparent pixels to the palette's transparent entry instead of white
    #[arg(long)]
    keep_transparent: bool,

    /// Also write the cell assignments as JSON next to each output image
    #[arg(long)]
    json: bool,

    /// Output directory
    #[arg(short = 'd', long)]
    out_dir: Option<PathBuf>,

    /// Output filename prefix (ignored when --out-dir supplied)
    #[arg(short = 'p', long, default_value = "mosaic_")]
    prefix: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let options = QuantizeOptions {
        policy: if args.keep_transparent {
            TransparencyPolicy::ToPaletteTransparent
        } else {
            TransparencyPolicy::ToWhite
        },
        chunk_size: args.chunk_size,
        cell_pixel_size: args.cell_size,
        emit_overlay: !args.no_grid,
        emit_labels: !args.no_labels,
    };

    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;

        let (png, result) = mosaic_bytes(&bytes, &options, |pct| {
            eprint!("\r{}: {pct:3}%", input.display());
        })
        .context("mosaic processing failed")?;
        eprintln!();

        let out_path = if let Some(dir) = &args.out_dir {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            dir.join(format!("{stem}.png"))
        } else {
            let stem = input.file_name().unwrap_or_default().to_string_lossy();
            PathBuf::from(format!("{}{}", args.prefix, stem))
        };

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out_path, png)?;
        println!("Saved → {}", out_path.display());

        if args.json {
            let pal = palette();
            let cells: Vec<_> = result
                .assignments
                .iter()
                .map(|c| {
                    let entry = &pal[c.entry as usize];
                    json!({
                        "x": c.x,
                        "y": c.y,
                        "color": entry.hex(),
                        "texture": entry.texture,
                        "label": c.label,
                    })
                })
                .collect();
            let doc = json!({
                "width": result.width,
                "height": result.height,
                "cellSize": result.cell_pixel_size,
                "cells": cells,
            });
            let json_path = out_path.with_extension("json");
            fs::write(&json_path, serde_json::to_string_pretty(&doc)?)?;
            println!("Saved → {}", json_path.display());
        }
    }

    Ok(())
}
