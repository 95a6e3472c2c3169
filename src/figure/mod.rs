//! In-memory figures and their PNG rasterization.
//!
//! A [`Figure`] is an explicit render context: plotting helpers take one,
//! append an [`Axes`] to it and hand it back. Nothing is drawn until
//! [`Figure::rasterize`] or [`Figure::save`] is called.

pub mod color;
pub mod font;
mod raster;

use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};

use crate::error::Result;
pub use color::ColorMap;

/// A canvas of `width x height` pixels holding axes stacked top to bottom.
#[derive(Debug, Clone)]
pub struct Figure {
    width: u32,
    height: u32,
    axes: Vec<Axes>,
}

impl Default for Figure {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

impl Figure {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            axes: Vec::new(),
        }
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn axes(&self) -> &[Axes] {
        &self.axes
    }

    pub fn push_axes(&mut self, axes: Axes) {
        self.axes.push(axes);
    }

    pub fn with_axes(mut self, axes: Axes) -> Self {
        self.push_axes(axes);
        self
    }

    /// Draw every axes onto a white canvas.
    pub fn rasterize(&self) -> RgbImage {
        raster::rasterize(self)
    }

    /// Rasterize and write the figure as a PNG file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.rasterize().save_with_format(path, ImageFormat::Png)?;
        tracing::debug!(path = %path.display(), "saved figure");
        Ok(())
    }
}

/// One titled plot area inside a figure.
#[derive(Debug, Clone)]
pub struct Axes {
    pub title: String,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    /// Whether to draw the frame, ticks and axis labels.
    pub show_axis: bool,
    pub plot: Plot,
}

impl Axes {
    pub fn new(title: impl Into<String>, plot: Plot) -> Self {
        Self {
            title: title.into(),
            xlabel: None,
            ylabel: None,
            show_axis: true,
            plot,
        }
    }

    pub fn xlabel(mut self, label: impl Into<String>) -> Self {
        self.xlabel = Some(label.into());
        self
    }

    pub fn ylabel(mut self, label: impl Into<String>) -> Self {
        self.ylabel = Some(label.into());
        self
    }

    pub fn hide_axis(mut self) -> Self {
        self.show_axis = false;
        self
    }
}

#[derive(Debug, Clone)]
pub enum Plot {
    Heatmap(Heatmap),
    Lines(LineChart),
    Image(RgbImage),
}

/// Text drawn at the center of a heatmap cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub text: String,
    pub color: Rgb<u8>,
}

/// A colour-mapped grid of values, stored row-major.
#[derive(Debug, Clone)]
pub struct Heatmap {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f64>,
    pub x_ticks: Vec<String>,
    pub y_ticks: Vec<String>,
    /// Cell texts in the same row-major order as `values`, or empty for none.
    pub annotations: Vec<Annotation>,
    pub colormap: ColorMap,
    pub colorbar: bool,
    /// Point size of the annotation text.
    pub text_size: u32,
}

impl Heatmap {
    /// Smallest and largest values, `(0, 0)` for an empty grid.
    pub fn range(&self) -> (f64, f64) {
        if self.values.is_empty() {
            return (0.0, 0.0);
        }
        self.values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    #[inline]
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    /// Colour of a cell within `range`, as returned by [`Heatmap::range`].
    pub fn cell_color(&self, row: usize, col: usize, range: (f64, f64)) -> Rgb<u8> {
        self.colormap.scale(self.value(row, col), range)
    }

    #[inline]
    pub fn annotation(&self, row: usize, col: usize) -> Option<&Annotation> {
        self.annotations.get(row * self.cols + col)
    }
}

/// A named polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub color: Rgb<u8>,
}

impl Series {
    /// A series whose x coordinates are the sample indices.
    pub fn indexed(label: impl Into<String>, values: &[f64], color: Rgb<u8>) -> Self {
        Self {
            label: label.into(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, &v)| (i as f64, v))
                .collect(),
            color,
        }
    }
}

/// A labelled vertical line spanning the whole plot height.
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalMarker {
    pub x: f64,
    pub label: String,
    pub color: Rgb<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegendLoc {
    #[default]
    UpperRight,
    LowerRight,
    UpperLeft,
    LowerLeft,
}

#[derive(Debug, Clone, Default)]
pub struct LineChart {
    pub series: Vec<Series>,
    pub markers: Vec<VerticalMarker>,
    pub legend: Option<LegendLoc>,
}

impl LineChart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn marker(mut self, marker: VerticalMarker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn legend(mut self, loc: LegendLoc) -> Self {
        self.legend = Some(loc);
        self
    }

    /// Data bounds as `((x_min, x_max), (y_min, y_max))`, widened when flat.
    pub fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        let points = self.series.iter().flat_map(|s| s.points.iter());
        let (mut x, y) = points.fold(
            (
                (f64::INFINITY, f64::NEG_INFINITY),
                (f64::INFINITY, f64::NEG_INFINITY),
            ),
            |((x0, x1), (y0, y1)), &(px, py)| {
                ((x0.min(px), x1.max(px)), (y0.min(py), y1.max(py)))
            },
        );
        for m in &self.markers {
            x = (x.0.min(m.x), x.1.max(m.x));
        }

        let widen = |(lo, hi): (f64, f64)| -> (f64, f64) {
            if !lo.is_finite() || !hi.is_finite() {
                (0.0, 1.0)
            } else if hi - lo < f64::EPSILON {
                (lo - 0.5, hi + 0.5)
            } else {
                (lo, hi)
            }
        };
        (widen(x), widen(y))
    }
}
