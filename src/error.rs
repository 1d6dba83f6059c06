use thiserror::Error;

/// Errors produced by the quantization core.
///
/// All of these are fatal to the run that raised them: the pipeline never
/// emits a partial assignment sequence, and there is nothing transient to
/// retry against — every input is already in memory.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MosaicError {
    /// The pixel buffer does not agree with the declared dimensions
    /// (`width * height * 4` RGBA bytes), or a dimension is zero.
    #[error("pixel buffer of {actual} bytes does not match {width}x{height} RGBA image ({expected} bytes expected)")]
    MalformedInput {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// The palette lacks the entry the configured transparency policy
    /// resolves transparent pixels to. Detected at resolver setup, before
    /// any pixel is processed.
    #[error("palette misconfigured: {0}")]
    PaletteMisconfigured(&'static str),

    /// The palette contains no opaque entry, so no sample can ever be
    /// matched. Like `PaletteMisconfigured` this is a setup-time error.
    #[error("palette has no opaque entries to match against")]
    NoMatch,
}
