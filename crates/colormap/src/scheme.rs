//! Palettes and multi-stop interpolation engine.
//!
//! Stops are the five-class ColorBrewer definitions; other class counts are
//! interpolated between them.

use serde::{Deserialize, Serialize};

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const WHITE: Self = Self::new(255, 255, 255);

    /// `#rrggbb` form
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb::new(r, g, b),
        }
    }
}

/// Named sequential and diverging palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Palette {
    Blues,
    Oranges,
    YlOrRd,
    YlOrBr,
    YlGnBu,
    RdYlGn,
    Spectral,
}

impl Palette {
    pub const ALL: &[Palette] = &[
        Self::Blues,
        Self::Oranges,
        Self::YlOrRd,
        Self::YlOrBr,
        Self::YlGnBu,
        Self::RdYlGn,
        Self::Spectral,
    ];

    /// ColorBrewer name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blues => "Blues",
            Self::Oranges => "Oranges",
            Self::YlOrRd => "YlOrRd",
            Self::YlOrBr => "YlOrBr",
            Self::YlGnBu => "YlGnBu",
            Self::RdYlGn => "RdYlGn",
            Self::Spectral => "Spectral",
        }
    }

    /// Case-insensitive lookup by ColorBrewer name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    pub fn is_diverging(&self) -> bool {
        matches!(self, Self::RdYlGn | Self::Spectral)
    }

    fn stops(&self) -> &'static [ColorStop] {
        match self {
            Self::Blues => BLUES_STOPS,
            Self::Oranges => ORANGES_STOPS,
            Self::YlOrRd => YLORRD_STOPS,
            Self::YlOrBr => YLORBR_STOPS,
            Self::YlGnBu => YLGNBU_STOPS,
            Self::RdYlGn => RDYLGN_STOPS,
            Self::Spectral => SPECTRAL_STOPS,
        }
    }

    /// `count` colors evenly spread from the first to the last stop.
    pub fn colors(&self, count: usize) -> Vec<Rgb> {
        match count {
            0 => Vec::new(),
            1 => vec![evaluate(*self, 0.5)],
            n => (0..n)
                .map(|i| evaluate(*self, i as f64 / (n - 1) as f64))
                .collect(),
        }
    }
}

// ─── Color stop definitions (ColorBrewer, 5 classes) ───────────────────

const BLUES_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 239, 243, 255),
    ColorStop::new(0.25, 189, 215, 231),
    ColorStop::new(0.50, 107, 174, 214),
    ColorStop::new(0.75, 49, 130, 189),
    ColorStop::new(1.00, 8, 81, 156),
];

const ORANGES_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 254, 237, 222),
    ColorStop::new(0.25, 253, 190, 133),
    ColorStop::new(0.50, 253, 141, 60),
    ColorStop::new(0.75, 230, 85, 13),
    ColorStop::new(1.00, 166, 54, 3),
];

const YLORRD_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 255, 255, 178),
    ColorStop::new(0.25, 254, 204, 92),
    ColorStop::new(0.50, 253, 141, 60),
    ColorStop::new(0.75, 240, 59, 32),
    ColorStop::new(1.00, 189, 0, 38),
];

const YLORBR_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 255, 255, 212),
    ColorStop::new(0.25, 254, 217, 142),
    ColorStop::new(0.50, 254, 153, 41),
    ColorStop::new(0.75, 217, 95, 14),
    ColorStop::new(1.00, 153, 52, 4),
];

const YLGNBU_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 255, 255, 204),
    ColorStop::new(0.25, 161, 218, 180),
    ColorStop::new(0.50, 65, 182, 196),
    ColorStop::new(0.75, 44, 127, 184),
    ColorStop::new(1.00, 37, 52, 148),
];

const RDYLGN_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 215, 25, 28),
    ColorStop::new(0.25, 253, 174, 97),
    ColorStop::new(0.50, 255, 255, 191),
    ColorStop::new(0.75, 166, 217, 106),
    ColorStop::new(1.00, 26, 150, 65),
];

const SPECTRAL_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 215, 25, 28),
    ColorStop::new(0.25, 253, 174, 97),
    ColorStop::new(0.50, 255, 255, 191),
    ColorStop::new(0.75, 171, 221, 164),
    ColorStop::new(1.00, 43, 131, 186),
];

// ─── Interpolation engine ──────────────────────────────────────────────

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_color(c1: Rgb, c2: Rgb, t: f64) -> Rgb {
    Rgb::new(
        lerp(c1.r as f64, c2.r as f64, t).round() as u8,
        lerp(c1.g as f64, c2.g as f64, t).round() as u8,
        lerp(c1.b as f64, c2.b as f64, t).round() as u8,
    )
}

fn multi_stop(stops: &[ColorStop], t: f64) -> Rgb {
    if t <= 0.0 {
        return stops[0].color;
    }
    if t >= 1.0 {
        return stops[stops.len() - 1].color;
    }
    for i in 1..stops.len() {
        if t <= stops[i].t {
            let ratio = (t - stops[i - 1].t) / (stops[i].t - stops[i - 1].t);
            return lerp_color(stops[i - 1].color, stops[i].color, ratio);
        }
    }
    stops[stops.len() - 1].color
}

/// Evaluate a palette at normalized position `t` ∈ [0, 1] (clamped).
pub fn evaluate(palette: Palette, t: f64) -> Rgb {
    multi_stop(palette.stops(), t)
}
