use image::Rgb;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
pub const LIGHT_GRAY: Rgb<u8> = Rgb([220, 220, 220]);

/// Line colours assigned to chart series in order.
pub const SERIES_PALETTE: [Rgb<u8>; 6] = [
    Rgb([31, 119, 180]),
    Rgb([255, 127, 14]),
    Rgb([44, 160, 44]),
    Rgb([214, 39, 40]),
    Rgb([148, 103, 189]),
    Rgb([140, 86, 75]),
];

/// Colour of the `index`-th series, cycling through the palette.
pub fn series_color(index: usize) -> Rgb<u8> {
    SERIES_PALETTE[index % SERIES_PALETTE.len()]
}

/// Interpolate between two colors
pub fn interpolate_color(c1: Rgb<u8>, c2: Rgb<u8>, t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| ((1.0 - t) * a as f64 + t * b as f64).round() as u8;
    Rgb([
        mix(c1.0[0], c2.0[0]),
        mix(c1.0[1], c2.0[1]),
        mix(c1.0[2], c2.0[2]),
    ])
}

/// Sequential colour maps for heatmap cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMap {
    /// White to dark blue.
    #[default]
    Blues,
}

const BLUES_STOPS: [Rgb<u8>; 5] = [
    Rgb([247, 251, 255]),
    Rgb([198, 219, 239]),
    Rgb([107, 174, 214]),
    Rgb([33, 113, 181]),
    Rgb([8, 48, 107]),
];

impl ColorMap {
    fn stops(self) -> &'static [Rgb<u8>] {
        match self {
            Self::Blues => &BLUES_STOPS,
        }
    }

    /// Colour for a position `t` in `[0, 1]`; values outside are clamped.
    pub fn at(self, t: f64) -> Rgb<u8> {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let segments = (stops.len() - 1) as f64;
        let pos = t * segments;
        let idx = (pos.floor() as usize).min(stops.len() - 2);
        interpolate_color(stops[idx], stops[idx + 1], pos - idx as f64)
    }

    /// Colour for `value` within the `(min, max)` range.
    pub fn scale(self, value: f64, (min, max): (f64, f64)) -> Rgb<u8> {
        if max > min {
            self.at((value - min) / (max - min))
        } else {
            self.at(0.0)
        }
    }
}
