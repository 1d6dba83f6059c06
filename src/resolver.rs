//! Nearest-color resolution against the fixed palette.
//!
//! Resolution order: transparency rule, then the per-run memo cache, then the
//! exact-match index, then an exhaustive squared-distance scan whose result is
//! memoized. Flat-color regions of real images repeat heavily, so the cached
//! path dominates runtime in practice.

use std::collections::HashMap;

use crate::error::MosaicError;
use crate::palette::{PaletteEntry, build_exact_index};

/// What to do with pixels whose alpha is below 128.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransparencyPolicy {
    /// Map transparent pixels to the opaque `#ffffff` palette entry.
    #[default]
    ToWhite,
    /// Map transparent pixels to the palette's designated transparent
    /// entry (an entry declared with a zero alpha marker).
    ToPaletteTransparent,
}

/// Resolves RGBA samples to palette indices.
///
/// Construction validates the palette against the chosen policy, so a
/// misconfiguration surfaces before the first pixel is processed and
/// [`resolve`](Resolver::resolve) itself is total.
#[derive(Debug)]
pub struct Resolver<'p> {
    palette: &'p [PaletteEntry],
    exact: HashMap<[u8; 3], u16>,
    cache: HashMap<[u8; 3], u16>,
    fallback: u16,
}

impl<'p> Resolver<'p> {
    pub fn new(
        palette: &'p [PaletteEntry],
        policy: TransparencyPolicy,
    ) -> Result<Self, MosaicError> {
        if !palette.iter().any(|e| e.is_opaque()) {
            return Err(MosaicError::NoMatch);
        }
        let fallback = match policy {
            TransparencyPolicy::ToWhite => palette
                .iter()
                .position(|e| e.is_opaque() && e.key() == [255, 255, 255])
                .ok_or(MosaicError::PaletteMisconfigured(
                    "to-white policy needs an opaque #ffffff entry",
                ))?,
            TransparencyPolicy::ToPaletteTransparent => palette
                .iter()
                .position(|e| e.alpha == 0)
                .ok_or(MosaicError::PaletteMisconfigured(
                    "to-palette-transparent policy needs an entry with a zero alpha marker",
                ))?,
        };
        Ok(Self {
            palette,
            exact: build_exact_index(palette),
            cache: HashMap::new(),
            fallback: fallback as u16,
        })
    }

    /// Map one RGBA sample to the index of its palette entry.
    pub fn resolve(&mut self, sample: [u8; 4]) -> u16 {
        let [r, g, b, a] = sample;
        if a < 128 {
            return self.fallback;
        }
        let key = [r, g, b];
        if let Some(&idx) = self.cache.get(&key) {
            return idx;
        }
        if let Some(&idx) = self.exact.get(&key) {
            return idx;
        }
        let idx = self.nearest(r, g, b);
        self.cache.insert(key, idx);
        idx
    }

    /// Exhaustive scan over opaque entries, minimizing integer squared RGB
    /// distance. Strict `<` keeps the first entry in declaration order on
    /// exact distance ties. Only relative ordering matters, so no sqrt and
    /// no floats.
    pub(crate) fn nearest(&self, r: u8, g: u8, b: u8) -> u16 {
        let (r, g, b) = (r as i32, g as i32, b as i32);
        let mut best = 0u16;
        let mut best_dist = i32::MAX;
        for (i, entry) in self.palette.iter().enumerate() {
            if !entry.is_opaque() {
                continue;
            }
            let dr = r - entry.rgb.red as i32;
            let dg = g - entry.rgb.green as i32;
            let db = b - entry.rgb.blue as i32;
            let dist = dr * dr + dg * dg + db * db;
            if dist < best_dist {
                best_dist = dist;
                best = i as u16;
            }
        }
        best
    }

    pub fn palette(&self) -> &'p [PaletteEntry] {
        self.palette
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{entry, palette};

    fn black_white() -> Vec<PaletteEntry> {
        vec![
            entry("#ffffff", "snow.png", "w"),
            entry("#000000", "ink.png", "b"),
        ]
    }

    #[test]
    fn transparent_maps_to_white_under_to_white() {
        let pal = black_white();
        let mut r = Resolver::new(&pal, TransparencyPolicy::ToWhite).unwrap();
        assert_eq!(r.resolve([0, 0, 0, 0]), 0);
        assert_eq!(r.resolve([200, 10, 30, 127]), 0);
        // 128 is already opaque enough to color-match
        assert_eq!(r.resolve([0, 0, 0, 128]), 1);
    }

    #[test]
    fn transparent_maps_to_marker_under_to_palette_transparent() {
        let pal = vec![
            entry("#ffffff", "snow.png", "w"),
            entry("#00ff0000", "clear.png", "t"),
            entry("#000000", "ink.png", "b"),
        ];
        let mut r = Resolver::new(&pal, TransparencyPolicy::ToPaletteTransparent).unwrap();
        assert_eq!(r.resolve([9, 9, 9, 0]), 1);
        // opaque samples never land on the marker
        assert_eq!(r.resolve([0, 250, 0, 255]), 2);
    }

    #[test]
    fn missing_policy_entry_fails_at_setup() {
        let pal = vec![entry("#000000", "ink.png", "b")];
        assert_eq!(
            Resolver::new(&pal, TransparencyPolicy::ToWhite).unwrap_err(),
            MosaicError::PaletteMisconfigured("to-white policy needs an opaque #ffffff entry"),
        );
        let pal = black_white();
        assert!(matches!(
            Resolver::new(&pal, TransparencyPolicy::ToPaletteTransparent).unwrap_err(),
            MosaicError::PaletteMisconfigured(_),
        ));
    }

    #[test]
    fn opaque_free_palette_fails_at_setup() {
        assert_eq!(
            Resolver::new(&[], TransparencyPolicy::ToWhite).unwrap_err(),
            MosaicError::NoMatch,
        );
        let pal = vec![entry("#00ff0000", "clear.png", "t")];
        assert_eq!(
            Resolver::new(&pal, TransparencyPolicy::ToPaletteTransparent).unwrap_err(),
            MosaicError::NoMatch,
        );
    }

    #[test]
    fn exact_match_returns_first_duplicate() {
        let pal = vec![
            entry("#ffffff", "snow.png", "w"),
            entry("#101010", "a.png", "0"),
            entry("#101010", "b.png", "0"),
        ];
        let mut r = Resolver::new(&pal, TransparencyPolicy::ToWhite).unwrap();
        assert_eq!(r.resolve([0x10, 0x10, 0x10, 255]), 1);
    }

    #[test]
    fn nearest_tie_breaks_on_declaration_order() {
        // (100,0,0) and (104,0,0) are equidistant from (102,0,0)
        let pal = vec![
            entry("#ffffff", "snow.png", "w"),
            entry("#640000", "a.png", "0"),
            entry("#680000", "b.png", "0"),
        ];
        let mut r = Resolver::new(&pal, TransparencyPolicy::ToWhite).unwrap();
        assert_eq!(r.resolve([102, 0, 0, 255]), 1);
    }

    #[test]
    fn near_black_resolves_to_black() {
        let pal = black_white();
        let mut r = Resolver::new(&pal, TransparencyPolicy::ToWhite).unwrap();
        // distance 300 to black vs 3*245^2 to white
        assert_eq!(r.resolve([10, 10, 10, 255]), 1);
    }

    #[test]
    fn cache_is_pure_memoization() {
        let pal = palette();
        let mut warm = Resolver::new(pal, TransparencyPolicy::ToWhite).unwrap();
        let cold = Resolver::new(pal, TransparencyPolicy::ToWhite).unwrap();
        // deterministic pseudo-random sample sweep
        let mut seed: u32 = 0x2545_F491;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let [r, g, b, _] = seed.to_le_bytes();
            let via_cache = warm.resolve([r, g, b, 255]);
            let repeat = warm.resolve([r, g, b, 255]);
            assert_eq!(via_cache, repeat);
            // the memoized answer always agrees with an uncached scan,
            // modulo the exact-match shortcut
            let expected = cold
                .exact
                .get(&[r, g, b])
                .copied()
                .unwrap_or_else(|| cold.nearest(r, g, b));
            assert_eq!(via_cache, expected);
        }
    }

    #[test]
    fn compiled_palette_exact_hits_return_declared_entry() {
        let pal = palette();
        let mut r = Resolver::new(pal, TransparencyPolicy::ToWhite).unwrap();
        for (i, e) in pal.iter().enumerate() {
            let [pr, pg, pb] = e.key();
            let hit = r.resolve([pr, pg, pb, 255]) as usize;
            // duplicates collapse onto the first declared occurrence
            assert_eq!(pal[hit].rgb, e.rgb);
            assert!(hit <= i);
        }
    }
}
