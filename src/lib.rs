use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use js_sys::{Array, Function, Object, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;

#[cfg(all(not(target_arch = "wasm32"), feature = "native-bin"))]
use anyhow::{Context, Result};

pub mod error;
pub mod palette;
pub mod pipeline;
pub mod resolver;

pub use error::MosaicError;
pub use palette::{PaletteEntry, build_exact_index};
pub use pipeline::{
    CellAssignment, DEFAULT_CELL_PIXEL_SIZE, DEFAULT_CHUNK_SIZE, GridLine, GridOverlay,
    HEAVY_LINE_STRIDE, MosaicResult, QuantizeOptions, quantize,
};
pub use resolver::{Resolver, TransparencyPolicy};

// ------------------------------------------------------------
// Mosaic PNG renderer (host plumbing, shared by wasm and CLI)
// ------------------------------------------------------------

const GRID_LIGHT: Rgba<u8> = Rgba([0x77, 0x77, 0x77, 0xFF]);
const GRID_HEAVY: Rgba<u8> = Rgba([0x00, 0xFF, 0x00, 0xFF]);
const HEAVY_LINE_WIDTH: u32 = 3;

fn fill_rect(img: &mut RgbaImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgba<u8>) {
    let (iw, ih) = img.dimensions();
    for y in y0..(y0.saturating_add(h)).min(ih) {
        for x in x0..(x0.saturating_add(w)).min(iw) {
            img.put_pixel(x, y, color);
        }
    }
}

/// Paint a completed run onto a fresh surface and PNG-encode it.
///
/// Each cell is a flat fill of its entry color at the run's magnification;
/// cells assigned to a transparent-marker entry stay fully transparent.
/// When the run carries an overlay, light lines are drawn at every cell
/// boundary and heavy lines on top at the heavy stride. Texture tiles and
/// text labels are deliberately not composited here — resolving a
/// `texture` handle and typesetting labels belongs to the display host.
pub fn render_png(
    result: &MosaicResult,
    palette: &[PaletteEntry],
) -> Result<Vec<u8>, image::ImageError> {
    let cell = result.cell_pixel_size.max(1);
    let (w_px, h_px) = (result.width * cell, result.height * cell);
    let mut img = RgbaImage::from_pixel(w_px, h_px, Rgba([0, 0, 0, 0]));

    for c in &result.assignments {
        let entry = &palette[c.entry as usize];
        if entry.is_opaque() {
            let color = Rgba([entry.rgb.red, entry.rgb.green, entry.rgb.blue, 0xFF]);
            fill_rect(&mut img, c.x * cell, c.y * cell, cell, cell, color);
        }
    }

    if let Some(overlay) = &result.overlay {
        // light pass first, heavy lines paint over it
        for line in overlay.verticals.iter().filter(|l| !l.heavy) {
            fill_rect(&mut img, line.offset.min(w_px - 1), 0, 1, h_px, GRID_LIGHT);
        }
        for line in overlay.horizontals.iter().filter(|l| !l.heavy) {
            fill_rect(&mut img, 0, line.offset.min(h_px - 1), w_px, 1, GRID_LIGHT);
        }
        for line in overlay.verticals.iter().filter(|l| l.heavy) {
            fill_rect(&mut img, line.offset.saturating_sub(1), 0, HEAVY_LINE_WIDTH, h_px, GRID_HEAVY);
        }
        for line in overlay.horizontals.iter().filter(|l| l.heavy) {
            fill_rect(&mut img, 0, line.offset.saturating_sub(1), w_px, HEAVY_LINE_WIDTH, GRID_HEAVY);
        }
    }

    let mut buf = Vec::new();
    {
        let mut cursor = std::io::Cursor::new(&mut buf);
        DynamicImage::ImageRgba8(img).write_to(&mut cursor, ImageFormat::Png)?;
    }
    Ok(buf)
}

// ------------------------------------------------------------
// wasm entry point
// ------------------------------------------------------------

/// Convert an uploaded image into a block mosaic.
///
/// Steps performed:
/// 1. Decode the upload and flatten it to RGBA.
/// 2. Quantize every pixel against the compiled palette, reporting an
///    integer percentage into `on_progress` at each chunk boundary.
/// 3. Paint the enlarged cell grid (plus grid lines) and PNG-encode it.
///
/// The returned object carries `image` (a PNG `Uint8Array`), the cell-grid
/// `width`/`height`, and — when `show_labels` is set — a row-major `labels`
/// array for the host to typeset over the cells.
#[wasm_bindgen]
pub fn mosaic(
    input: Vec<u8>,
    cell_size: Option<u32>,
    show_labels: bool,
    transparent_as_white: bool,
    on_progress: Option<Function>,
) -> Result<Object, JsValue> {
    let img = image::load_from_memory(&input)
        .map_err(|e| JsValue::from_str(&format!("Unable to decode image: {e}")))?;
    let (width, height) = img.dimensions();
    let raw = img.to_rgba8().into_raw();

    let options = QuantizeOptions {
        policy: if transparent_as_white {
            TransparencyPolicy::ToWhite
        } else {
            TransparencyPolicy::ToPaletteTransparent
        },
        cell_pixel_size: cell_size.unwrap_or(DEFAULT_CELL_PIXEL_SIZE),
        emit_labels: show_labels,
        ..QuantizeOptions::default()
    };

    let pal = palette::palette();
    let result = quantize(&raw, width, height, pal, &options, |pct| {
        if let Some(cb) = &on_progress {
            let _ = cb.call1(&JsValue::NULL, &JsValue::from(pct as u32));
        }
    })
    .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let png = render_png(&result, pal)
        .map_err(|e| JsValue::from_str(&format!("PNG encode error: {e}")))?;

    let out = Object::new();
    Reflect::set(&out, &JsValue::from_str("image"), &Uint8Array::from(png.as_slice()))?;
    Reflect::set(&out, &JsValue::from_str("width"), &JsValue::from(result.width))?;
    Reflect::set(&out, &JsValue::from_str("height"), &JsValue::from(result.height))?;
    if show_labels {
        let labels = Array::new();
        for c in &result.assignments {
            labels.push(&JsValue::from_str(c.label.unwrap_or("")));
        }
        Reflect::set(&out, &JsValue::from_str("labels"), &labels)?;
    }

    Ok(out)
}

// ------------------------------------------------------------
// Native helper (CLI wrapper entry point)
// ------------------------------------------------------------

/// Native analogue of [`mosaic`]: decode, quantize against the compiled
/// palette, and render. Returns the encoded PNG together with the raw run
/// result so callers can export the assignment sequence.
#[cfg(all(not(target_arch = "wasm32"), feature = "native-bin"))]
pub fn mosaic_bytes<F>(
    input: &[u8],
    options: &QuantizeOptions,
    on_progress: F,
) -> Result<(Vec<u8>, MosaicResult)>
where
    F: FnMut(u8),
{
    let img = image::load_from_memory(input).context("unable to decode image")?;
    let (width, height) = img.dimensions();
    let raw = img.to_rgba8().into_raw();

    let pal = palette::palette();
    let result = quantize(&raw, width, height, pal, options, on_progress)?;
    let png = render_png(&result, pal).context("PNG encode failed")?;
    Ok((png, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::entry;

    #[test]
    fn renders_cells_and_transparency() {
        let pal = vec![
            entry("#ff0000", "red.png", "0"),
            entry("#00000000", "clear.png", "t"),
        ];
        let result = MosaicResult {
            width: 2,
            height: 1,
            cell_pixel_size: 8,
            assignments: vec![
                CellAssignment { x: 0, y: 0, entry: 0, label: None },
                CellAssignment { x: 1, y: 0, entry: 1, label: None },
            ],
            overlay: None,
        };
        let png = render_png(&result, &pal).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!(img.dimensions(), (16, 8));
        assert_eq!(img.get_pixel(3, 3), Rgba([255, 0, 0, 255]));
        // transparent-marker cell stays clear
        assert_eq!(img.get_pixel(12, 3).0[3], 0);
    }

    #[test]
    fn renders_grid_lines_when_overlay_present() {
        let pal = vec![entry("#ffffff", "snow.png", "w")];
        let opts = QuantizeOptions { cell_pixel_size: 4, ..QuantizeOptions::default() };
        let buffer = vec![255u8; 3 * 2 * 4];
        let result = quantize(&buffer, 3, 2, &pal, &opts, |_| {}).unwrap();
        let png = render_png(&result, &pal).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        // boundary 0 is heavy (green), interior boundary at x=4 is light,
        // and off-boundary pixels keep the cell fill
        assert_eq!(img.get_pixel(0, 3), Rgba([0, 255, 0, 255]));
        assert_eq!(img.get_pixel(4, 3), Rgba([0x77, 0x77, 0x77, 255]));
        assert_eq!(img.get_pixel(3, 3), Rgba([255, 255, 255, 255]));
    }
}
