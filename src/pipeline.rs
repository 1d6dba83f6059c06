//! The chunked quantization pipeline.
//!
//! One call scans every pixel of an RGBA buffer in row-major order, resolves
//! each against the palette, and returns the full assignment sequence plus
//! optional grid-overlay geometry. Pixels are processed in bounded chunks and
//! a progress percentage is reported after each chunk; on an interactive host
//! the chunk boundary is the cooperative yield point, on a batch host it is
//! just a callback inside a straight loop. Chunking never reorders output —
//! assignments are emitted in strictly ascending flat index order.

use crate::error::MosaicError;
use crate::palette::PaletteEntry;
use crate::resolver::{Resolver, TransparencyPolicy};

/// Pixels resolved between progress reports.
pub const DEFAULT_CHUNK_SIZE: usize = 100;
/// Output magnification: one source pixel becomes one cell this many pixels
/// on a side.
pub const DEFAULT_CELL_PIXEL_SIZE: u32 = 32;
/// Every this-many cell boundaries the grid overlay uses a heavy line to
/// mark the larger structural grouping.
pub const HEAVY_LINE_STRIDE: u32 = 32;

#[derive(Clone, Copy, Debug)]
pub struct QuantizeOptions {
    pub policy: TransparencyPolicy,
    pub chunk_size: usize,
    pub cell_pixel_size: u32,
    /// Produce grid-line geometry alongside the assignments.
    pub emit_overlay: bool,
    /// Attach each cell's shade label to its assignment.
    pub emit_labels: bool,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            policy: TransparencyPolicy::ToWhite,
            chunk_size: DEFAULT_CHUNK_SIZE,
            cell_pixel_size: DEFAULT_CELL_PIXEL_SIZE,
            emit_overlay: true,
            emit_labels: true,
        }
    }
}

/// One output cell: the source pixel coordinate and the palette entry it
/// quantized to. Exactly one per source pixel, in row-major order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellAssignment {
    pub x: u32,
    pub y: u32,
    /// Index into the palette the pipeline ran against.
    pub entry: u16,
    pub label: Option<&'static str>,
}

/// One grid line at `offset` device pixels from the surface origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLine {
    pub offset: u32,
    pub heavy: bool,
}

/// Grid geometry for the render host: a line at every cell boundary
/// (both edges inclusive), heavy every [`HEAVY_LINE_STRIDE`] cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridOverlay {
    pub cell_pixel_size: u32,
    pub heavy_stride: u32,
    pub verticals: Vec<GridLine>,
    pub horizontals: Vec<GridLine>,
}

impl GridOverlay {
    fn new(width: u32, height: u32, cell_pixel_size: u32) -> Self {
        Self {
            cell_pixel_size,
            heavy_stride: HEAVY_LINE_STRIDE,
            verticals: grid_lines(width, cell_pixel_size),
            horizontals: grid_lines(height, cell_pixel_size),
        }
    }
}

fn grid_lines(cells: u32, cell_pixel_size: u32) -> Vec<GridLine> {
    (0..=cells)
        .map(|i| GridLine {
            offset: i * cell_pixel_size,
            heavy: i % HEAVY_LINE_STRIDE == 0,
        })
        .collect()
}

/// Everything one run produces.
#[derive(Clone, Debug)]
pub struct MosaicResult {
    /// Source dimensions, which are also the cell-grid dimensions.
    pub width: u32,
    pub height: u32,
    pub cell_pixel_size: u32,
    pub assignments: Vec<CellAssignment>,
    pub overlay: Option<GridOverlay>,
}

/// Quantize a `width`×`height` RGBA buffer against `palette`.
///
/// `on_progress` receives an integer percentage after each chunk —
/// monotonically non-decreasing, exactly 100 on the final chunk. The whole
/// run either completes or fails before any assignment is produced; there is
/// no partial output.
pub fn quantize<F>(
    buffer: &[u8],
    width: u32,
    height: u32,
    palette: &[PaletteEntry],
    options: &QuantizeOptions,
    mut on_progress: F,
) -> Result<MosaicResult, MosaicError>
where
    F: FnMut(u8),
{
    let total = width as usize * height as usize;
    let expected = total * 4;
    if width == 0 || height == 0 || buffer.len() != expected {
        return Err(MosaicError::MalformedInput {
            width,
            height,
            expected,
            actual: buffer.len(),
        });
    }

    let mut resolver = Resolver::new(palette, options.policy)?;
    let chunk_size = options.chunk_size.max(1);
    let cell_pixel_size = options.cell_pixel_size.max(1);

    let mut assignments = Vec::with_capacity(total);
    let mut done = 0usize;
    while done < total {
        let end = (done + chunk_size).min(total);
        for idx in done..end {
            let x = (idx % width as usize) as u32;
            let y = (idx / width as usize) as u32;
            let i = idx * 4;
            let entry = resolver.resolve([buffer[i], buffer[i + 1], buffer[i + 2], buffer[i + 3]]);
            assignments.push(CellAssignment {
                x,
                y,
                entry,
                label: options
                    .emit_labels
                    .then(|| palette[entry as usize].label),
            });
        }
        done = end;
        on_progress((done * 100 / total) as u8);
    }

    let overlay = options
        .emit_overlay
        .then(|| GridOverlay::new(width, height, cell_pixel_size));

    Ok(MosaicResult {
        width,
        height,
        cell_pixel_size,
        assignments,
        overlay,
    })
}
