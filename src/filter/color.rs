use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Degrees between two consecutively allocated hues.
const HUE_STEP: f32 = 137.5;
const SATURATION: f32 = 0.65;
const NORMAL_LIGHTNESS: f32 = 0.45;
const INVERTED_LIGHTNESS: f32 = 0.80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let h = hue.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = lightness - c / 2.0;
        let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Self {
            r: to_u8(r),
            g: to_u8(g),
            b: to_u8(b),
        }
    }

    fn hue(self) -> f32 {
        let r = f32::from(self.r) / 255.0;
        let g = f32::from(self.g) / 255.0;
        let b = f32::from(self.b) / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;
        if delta == 0.0 {
            return 0.0;
        }
        let hue = if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        hue.rem_euclid(360.0)
    }
}

/// Display colors of a filter, both derived from one hue
///
/// The normal color decorates included lines; the inverted color is what an
/// exclude filter displays. Flipping `exclude` switches between the two
/// without touching the hue.
#[derive(Debug, Clone, Copy)]
pub struct FilterColor {
    hue: f32,
}

/// Two colors are equal when they render the same.
impl PartialEq for FilterColor {
    fn eq(&self, other: &Self) -> bool {
        self.normal() == other.normal()
    }
}

impl FilterColor {
    pub fn from_hue(hue: f32) -> Self {
        Self {
            hue: hue.rem_euclid(360.0),
        }
    }

    /// Derive the pair from a seed color such as `#c0392b`
    pub fn from_seed(seed: &str) -> Option<Self> {
        Rgb::from_hex(seed).map(|rgb| Self::from_hue(rgb.hue()))
    }

    pub fn hue(&self) -> f32 {
        self.hue
    }

    pub fn normal(&self) -> Rgb {
        Rgb::from_hsl(self.hue, SATURATION, NORMAL_LIGHTNESS)
    }

    pub fn inverted(&self) -> Rgb {
        Rgb::from_hsl(self.hue, SATURATION, INVERTED_LIGHTNESS)
    }
}

impl fmt::Display for FilterColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normal().to_hex())
    }
}

impl Serialize for FilterColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.normal().to_hex())
    }
}

impl<'de> Deserialize<'de> for FilterColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FilterColor::from_seed(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{raw}'")))
    }
}

/// Hands out well-separated hues to new filters
///
/// Carries the last allocated hue as its own state, so every owner of an
/// allocator gets an independent rotation.
#[derive(Debug, Clone, Default)]
pub struct ColorAllocator {
    last_hue: Option<f32>,
}

impl ColorAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue the rotation after an existing color (e.g. a loaded filter)
    pub fn starting_after(color: FilterColor) -> Self {
        Self {
            last_hue: Some(color.hue()),
        }
    }

    pub fn next_color(&mut self) -> FilterColor {
        let hue = match self.last_hue {
            Some(last) => (last + HUE_STEP).rem_euclid(360.0),
            None => 0.0,
        };
        self.last_hue = Some(hue);
        FilterColor::from_hue(hue)
    }
}
