//! The compiled block palette and its exact-match index.
//!
//! The palette is a fixed, ordered table: 22 texture groups of 4 shades each,
//! labelled by shade tier ("-1" lightest through "2" darkest). Declaration
//! order is load-bearing — several groups share RGB values, and both the
//! exact-match index and the nearest-color search break ties in favour of the
//! entry declared first.

use std::collections::HashMap;
use std::sync::OnceLock;

use palette::Srgb;

/// One quantization target: a color, an opaque handle to the texture tile
/// drawn over cells of this color, and the shade-tier label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaletteEntry {
    pub rgb: Srgb<u8>,
    /// 0xFF for ordinary opaque entries; 0 marks the designated
    /// transparent entry (declared as a `#RRGGBBAA` color with `AA == 00`).
    pub alpha: u8,
    /// Never dereferenced by the core; the display host resolves it.
    pub texture: &'static str,
    pub label: &'static str,
}

impl PaletteEntry {
    pub fn is_opaque(&self) -> bool {
        self.alpha == 0xFF
    }

    pub(crate) fn key(&self) -> [u8; 3] {
        [self.rgb.red, self.rgb.green, self.rgb.blue]
    }

    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.rgb.red, self.rgb.green, self.rgb.blue)
    }
}

/// The table as declared: (color, texture tile, shade label).
const PALETTE_SPEC: &[(&str, &str, &str)] = &[
    ("#191919", "ink.png", "-1"),
    ("#161616", "ink.png", "0"),
    ("#131313", "ink.png", "1"),
    ("#101010", "ink.png", "2"),

    ("#FD1A1E", "red.png", "-1"),
    ("#D6161A", "red.png", "0"),
    ("#AB1114", "red.png", "1"),
    ("#7D0B0E", "red.png", "2"),

    ("#5D7532", "green.png", "-1"),
    ("#50642B", "green.png", "0"),
    ("#415024", "green.png", "1"),
    ("#313C1C", "green.png", "2"),

    ("#5D4530", "brown.png", "-1"),
    ("#4F3B2A", "brown.png", "0"),
    ("#413023", "brown.png", "1"),
    ("#31251B", "brown.png", "2"),

    ("#2F44A8", "blue.png", "-1"),
    ("#293A8E", "blue.png", "0"),
    ("#223072", "blue.png", "1"),
    ("#1B2554", "blue.png", "2"),

    ("#753AA8", "purple.png", "-1"),
    ("#63328E", "purple.png", "0"),
    ("#502972", "purple.png", "1"),
    ("#3C2054", "purple.png", "2"),

    ("#46758F", "cyan.png", "-1"),
    ("#3C6379", "cyan.png", "0"),
    ("#315062", "cyan.png", "1"),
    ("#263C48", "cyan.png", "2"),

    ("#9F9F9F", "lightgray.png", "-1"),
    ("#878787", "lightgray.png", "0"),
    ("#6C6C6C", "lightgray.png", "1"),
    ("#505050", "lightgray.png", "2"),

    ("#9CA0B0", "gray.png", "-1"),
    ("#848795", "gray.png", "0"),
    ("#6A6D77", "gray.png", "1"),
    ("#4E5058", "gray.png", "2"),

    ("#EF779D", "pink.png", "-1"),
    ("#C96585", "pink.png", "0"),
    ("#A1526B", "pink.png", "1"),
    ("#763D4F", "pink.png", "2"),

    ("#77C528", "lime.png", "-1"),
    ("#65A723", "lime.png", "0"),
    ("#52861D", "lime.png", "1"),
    ("#3D6217", "lime.png", "2"),

    ("#E1E23E", "yellow.png", "-1"),
    ("#BEBF35", "yellow.png", "0"),
    ("#98982C", "yellow.png", "1"),
    ("#6F7022", "yellow.png", "2"),

    ("#5E90D1", "lightblue.png", "-1"),
    ("#517AB1", "lightblue.png", "0"),
    ("#42628D", "lightblue.png", "1"),
    ("#324967", "lightblue.png", "2"),

    ("#A946D1", "magenta.png", "-1"),
    ("#8F3CB1", "magenta.png", "0"),
    ("#73318D", "magenta.png", "1"),
    ("#552667", "magenta.png", "2"),

    ("#D27737", "orange.png", "-1"),
    ("#B2652F", "orange.png", "0"),
    ("#8E5227", "orange.png", "1"),
    ("#683D1E", "orange.png", "2"),

    ("#FFFCF4", "bone.png", "-1"),
    ("#D8D4CE", "bone.png", "0"),
    ("#ACA9A4", "bone.png", "1"),
    ("#7D7C78", "bone.png", "2"),

    ("#F6E69E", "pumpkin.png", "-1"),
    ("#D0C386", "pumpkin.png", "0"),
    ("#A69B6C", "pumpkin.png", "1"),
    ("#78724F", "pumpkin.png", "2"),

    ("#8D6448", "melon.png", "-1"),
    ("#78563D", "melon.png", "0"),
    ("#604532", "melon.png", "1"),
    ("#473426", "melon.png", "2"),

    ("#454545", "flint.png", "-1"),
    ("#3B3B3B", "flint.png", "0"),
    ("#303030", "flint.png", "1"),
    ("#252525", "flint.png", "2"),

    ("#909090", "gunpowder.png", "-1"),
    ("#7A7A7A", "gunpowder.png", "0"),
    ("#636363", "gunpowder.png", "1"),
    ("#494949", "gunpowder.png", "2"),

    ("#4576FB", "lapisore.png", "-1"),
    ("#3B64D5", "lapisore.png", "0"),
    ("#3151AA", "lapisore.png", "1"),
    ("#253C7C", "lapisore.png", "2"),

    ("#ffffff", "snow.png", "-1"),
    ("#D8D8D8", "snow.png", "0"),
    ("#ACACAC", "snow.png", "1"),
    ("#7E7E7E", "snow.png", "2"),
];

static PALETTE: OnceLock<Vec<PaletteEntry>> = OnceLock::new();

/// The compiled palette, parsed once on first use.
pub fn palette() -> &'static [PaletteEntry] {
    PALETTE.get_or_init(|| {
        PALETTE_SPEC
            .iter()
            .map(|&(color, texture, label)| entry(color, texture, label))
            .collect()
    })
}

/// Parse `#RRGGBB` or `#RRGGBBAA` into channels. Palette colors are compiled
/// constants, so a malformed string is a programming error and panics at
/// first use rather than surfacing as a runtime Result.
fn parse_color(hex: &str) -> (Srgb<u8>, u8) {
    let s = hex.trim_start_matches('#');
    assert!(
        s.len() == 6 || s.len() == 8,
        "palette color {hex:?} must be #RRGGBB or #RRGGBBAA"
    );
    let byte = |i: usize| {
        u8::from_str_radix(&s[i..i + 2], 16)
            .unwrap_or_else(|_| panic!("palette color {hex:?} has invalid hex digits"))
    };
    let alpha = if s.len() == 8 { byte(6) } else { 0xFF };
    (Srgb::new(byte(0), byte(2), byte(4)), alpha)
}

pub(crate) fn entry(color: &str, texture: &'static str, label: &'static str) -> PaletteEntry {
    let (rgb, alpha) = parse_color(color);
    PaletteEntry { rgb, alpha, texture, label }
}

/// Build the RGB → palette-index shortcut for exact color hits.
///
/// Transparent-marker entries are skipped (transparent pixels never reach a
/// color lookup), and on duplicate RGB values the first entry in declaration
/// order keeps the slot.
pub fn build_exact_index(palette: &[PaletteEntry]) -> HashMap<[u8; 3], u16> {
    let mut index = HashMap::with_capacity(palette.len());
    for (i, entry) in palette.iter().enumerate() {
        if !entry.is_opaque() {
            continue;
        }
        index.entry(entry.key()).or_insert(i as u16);
    }
    index
}
