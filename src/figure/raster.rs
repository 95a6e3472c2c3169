use image::{imageops, Rgb, RgbImage};

use super::{
    color::{BLACK, GRAY, LIGHT_GRAY, WHITE},
    font::{
        draw_text, draw_text_centered, draw_text_vertical, scale_for_size, text_height,
        text_width,
    },
    Axes, Figure, Heatmap, LegendLoc, LineChart, Plot,
};

const TITLE_SCALE: u32 = 2;
const LABEL_SCALE: u32 = 2;
const TICK_SCALE: u32 = 1;
const PAD: i64 = 8;
const COLORBAR_WIDTH: i64 = 16;
const COLORBAR_MARGIN: i64 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rect {
    x: i64,
    y: i64,
    w: i64,
    h: i64,
}

impl Rect {
    #[inline]
    fn right(&self) -> i64 {
        self.x + self.w
    }

    #[inline]
    fn bottom(&self) -> i64 {
        self.y + self.h
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }
}

/// A tick label and its pixel coordinate along the axis.
type Tick = (i64, String);

pub(super) fn rasterize(fig: &Figure) -> RgbImage {
    let (width, height) = fig.size();
    let mut img = RgbImage::from_pixel(width, height, WHITE);

    let n = fig.axes().len() as i64;
    if n == 0 {
        return img;
    }
    let slot = height as i64 / n;
    for (i, axes) in fig.axes().iter().enumerate() {
        let region = Rect {
            x: 0,
            y: i as i64 * slot,
            w: width as i64,
            h: slot,
        };
        draw_axes(&mut img, axes, region);
    }
    img
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && x < img.width() as i64 && y < img.height() as i64 {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn fill_rect(img: &mut RgbImage, r: Rect, color: Rgb<u8>) {
    for y in r.y..r.bottom() {
        for x in r.x..r.right() {
            put(img, x, y, color);
        }
    }
}

fn outline_rect(img: &mut RgbImage, r: Rect, color: Rgb<u8>) {
    for x in r.x..r.right() {
        put(img, x, r.y, color);
        put(img, x, r.bottom() - 1, color);
    }
    for y in r.y..r.bottom() {
        put(img, r.x, y, color);
        put(img, r.right() - 1, y, color);
    }
}

/// Bresenham line between two pixel coordinates.
fn draw_line(img: &mut RgbImage, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: Rgb<u8>) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let (mut x, mut y, mut err) = (x0, y0, dx + dy);

    loop {
        put(img, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn draw_axes(img: &mut RgbImage, axes: &Axes, region: Rect) {
    let title_h = text_height(TITLE_SCALE) as i64;
    draw_text_centered(
        img,
        region.x + region.w / 2,
        region.y + PAD + title_h / 2,
        &axes.title,
        TITLE_SCALE,
        BLACK,
    );
    let top = region.y + 2 * PAD + title_h;

    if !axes.show_axis {
        let area = Rect {
            x: region.x + PAD,
            y: top,
            w: region.w - 2 * PAD,
            h: region.bottom() - PAD - top,
        };
        if !area.is_empty() {
            draw_plot_body(img, &axes.plot, area);
        }
        return;
    }

    let tick_h = text_height(TICK_SCALE) as i64;
    let label_h = text_height(LABEL_SCALE) as i64;
    let y_tick_width = y_tick_labels(&axes.plot)
        .iter()
        .map(|t| text_width(t, TICK_SCALE) as i64)
        .max()
        .unwrap_or(0);

    let mut left = PAD + y_tick_width + PAD;
    if axes.ylabel.is_some() {
        left += label_h + PAD;
    }
    let mut right = 2 * PAD;
    if matches!(&axes.plot, Plot::Heatmap(h) if h.colorbar) {
        right = COLORBAR_MARGIN;
    }
    let mut bottom = PAD + tick_h + PAD;
    if axes.xlabel.is_some() {
        bottom += label_h + PAD;
    }

    let area = Rect {
        x: region.x + left,
        y: top,
        w: region.w - left - right,
        h: region.bottom() - bottom - top,
    };
    if area.is_empty() {
        return;
    }

    let (x_ticks, y_ticks) = draw_plot_body(img, &axes.plot, area);
    outline_rect(img, area, BLACK);

    for (x, label) in &x_ticks {
        draw_line(img, (*x, area.bottom()), (*x, area.bottom() + 3), BLACK);
        draw_text_centered(
            img,
            *x,
            area.bottom() + PAD + tick_h / 2,
            label,
            TICK_SCALE,
            BLACK,
        );
    }
    for (y, label) in &y_ticks {
        draw_line(img, (area.x - 4, *y), (area.x - 1, *y), BLACK);
        let w = text_width(label, TICK_SCALE) as i64;
        draw_text(img, area.x - PAD - w, *y - tick_h / 2, label, TICK_SCALE, BLACK);
    }

    if let Some(xlabel) = &axes.xlabel {
        draw_text_centered(
            img,
            area.x + area.w / 2,
            area.bottom() + 2 * PAD + tick_h + label_h / 2,
            xlabel,
            LABEL_SCALE,
            BLACK,
        );
    }
    if let Some(ylabel) = &axes.ylabel {
        draw_text_vertical(
            img,
            region.x + PAD + label_h / 2,
            area.y + area.h / 2,
            ylabel,
            TICK_SCALE,
            BLACK,
        );
    }
}

fn y_tick_labels(plot: &Plot) -> Vec<String> {
    match plot {
        Plot::Heatmap(h) => h.y_ticks.clone(),
        Plot::Lines(chart) => {
            let (_, y) = padded_bounds(chart);
            linear_ticks(y, 5).into_iter().map(|v| format_tick(v, y)).collect()
        }
        Plot::Image(_) => Vec::new(),
    }
}

/// Draws the plot content into `area`, returning the x and y ticks to label.
fn draw_plot_body(img: &mut RgbImage, plot: &Plot, area: Rect) -> (Vec<Tick>, Vec<Tick>) {
    match plot {
        Plot::Heatmap(h) => draw_heatmap(img, h, area),
        Plot::Lines(chart) => draw_lines(img, chart, area),
        Plot::Image(pic) => {
            draw_image(img, pic, area);
            (Vec::new(), Vec::new())
        }
    }
}

fn draw_heatmap(img: &mut RgbImage, hm: &Heatmap, area: Rect) -> (Vec<Tick>, Vec<Tick>) {
    if hm.rows == 0 || hm.cols == 0 {
        return (Vec::new(), Vec::new());
    }
    let (rows, cols) = (hm.rows as i64, hm.cols as i64);
    let col_edge = |c: i64| area.x + c * area.w / cols;
    let row_edge = |r: i64| area.y + r * area.h / rows;
    let text_scale = scale_for_size(hm.text_size);
    let range = hm.range();

    for row in 0..hm.rows {
        for col in 0..hm.cols {
            let (r, c) = (row as i64, col as i64);
            let cell = Rect {
                x: col_edge(c),
                y: row_edge(r),
                w: col_edge(c + 1) - col_edge(c),
                h: row_edge(r + 1) - row_edge(r),
            };
            fill_rect(img, cell, hm.cell_color(row, col, range));
            if let Some(a) = hm.annotation(row, col) {
                draw_text_centered(
                    img,
                    cell.x + cell.w / 2,
                    cell.y + cell.h / 2,
                    &a.text,
                    text_scale,
                    a.color,
                );
            }
        }
    }

    if hm.colorbar {
        draw_colorbar(img, hm, area);
    }

    let x_ticks = hm
        .x_ticks
        .iter()
        .take(hm.cols)
        .enumerate()
        .map(|(c, label)| {
            let c = c as i64;
            ((col_edge(c) + col_edge(c + 1)) / 2, label.clone())
        })
        .collect();
    let y_ticks = hm
        .y_ticks
        .iter()
        .take(hm.rows)
        .enumerate()
        .map(|(r, label)| {
            let r = r as i64;
            ((row_edge(r) + row_edge(r + 1)) / 2, label.clone())
        })
        .collect();
    (x_ticks, y_ticks)
}

fn draw_colorbar(img: &mut RgbImage, hm: &Heatmap, area: Rect) {
    let bar = Rect {
        x: area.right() + 2 * PAD,
        y: area.y,
        w: COLORBAR_WIDTH,
        h: area.h,
    };
    let span = (bar.h - 1).max(1) as f64;
    for dy in 0..bar.h {
        let color = hm.colormap.at(1.0 - dy as f64 / span);
        for dx in 0..bar.w {
            put(img, bar.x + dx, bar.y + dy, color);
        }
    }
    outline_rect(img, bar, BLACK);

    let (min, max) = hm.range();
    let tick_h = text_height(TICK_SCALE) as i64;
    draw_text(img, bar.right() + 4, bar.y, &format_value(max), TICK_SCALE, BLACK);
    draw_text(
        img,
        bar.right() + 4,
        bar.bottom() - tick_h,
        &format_value(min),
        TICK_SCALE,
        BLACK,
    );
}

/// Line chart bounds with a 5% margin on the y axis.
fn padded_bounds(chart: &LineChart) -> ((f64, f64), (f64, f64)) {
    let (x, (y0, y1)) = chart.bounds();
    let pad = (y1 - y0) * 0.05;
    (x, (y0 - pad, y1 + pad))
}

fn linear_ticks((lo, hi): (f64, f64), count: usize) -> Vec<f64> {
    if count < 2 {
        return vec![lo];
    }
    (0..count)
        .map(|i| lo + (hi - lo) * i as f64 / (count - 1) as f64)
        .collect()
}

/// Whole-number ticks across `(lo, hi)`, at most about six of them.
fn integer_ticks((lo, hi): (f64, f64)) -> Vec<f64> {
    let step = ((hi - lo) / 5.0).ceil().max(1.0);
    let mut ticks = Vec::new();
    let mut v = lo.ceil();
    while v <= hi {
        // normalizes -0.0
        ticks.push(v + 0.0);
        v += step;
    }
    ticks
}

fn format_tick(v: f64, (lo, hi): (f64, f64)) -> String {
    let span = hi - lo;
    if span >= 10.0 {
        format!("{v:.0}")
    } else if span >= 1.0 {
        format!("{v:.1}")
    } else {
        format!("{v:.2}")
    }
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn draw_lines(img: &mut RgbImage, chart: &LineChart, area: Rect) -> (Vec<Tick>, Vec<Tick>) {
    let ((x0, x1), (y0, y1)) = padded_bounds(chart);
    let to_px = |x: f64| area.x + ((x - x0) / (x1 - x0) * (area.w - 1) as f64).round() as i64;
    let to_py =
        |y: f64| area.bottom() - 1 - ((y - y0) / (y1 - y0) * (area.h - 1) as f64).round() as i64;

    for marker in &chart.markers {
        let px = to_px(marker.x);
        // dashed
        let mut y = area.y;
        while y < area.bottom() {
            draw_line(img, (px, y), (px, (y + 5).min(area.bottom() - 1)), marker.color);
            y += 10;
        }
    }

    for series in &chart.series {
        let pixels: Vec<(i64, i64)> = series
            .points
            .iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|&(x, y)| (to_px(x), to_py(y)))
            .collect();
        match pixels.as_slice() {
            [] => {}
            [single] => fill_rect(
                img,
                Rect {
                    x: single.0 - 1,
                    y: single.1 - 1,
                    w: 3,
                    h: 3,
                },
                series.color,
            ),
            _ => {
                for pair in pixels.windows(2) {
                    draw_line(img, pair[0], pair[1], series.color);
                    draw_line(
                        img,
                        (pair[0].0, pair[0].1 + 1),
                        (pair[1].0, pair[1].1 + 1),
                        series.color,
                    );
                }
            }
        }
    }

    if let Some(loc) = chart.legend {
        draw_legend(img, chart, loc, area);
    }

    let x_ticks = integer_ticks((x0, x1))
        .into_iter()
        .map(|v| (to_px(v), format!("{v:.0}")))
        .collect();
    let y_ticks = linear_ticks((y0, y1), 5)
        .into_iter()
        .map(|v| (to_py(v), format_tick(v, (y0, y1))))
        .collect();
    (x_ticks, y_ticks)
}

fn draw_legend(img: &mut RgbImage, chart: &LineChart, loc: LegendLoc, area: Rect) {
    let entries: Vec<(&str, Rgb<u8>)> = chart
        .series
        .iter()
        .map(|s| (s.label.as_str(), s.color))
        .chain(chart.markers.iter().map(|m| (m.label.as_str(), m.color)))
        .collect();
    if entries.is_empty() {
        return;
    }

    let line_h = text_height(TICK_SCALE) as i64 + 6;
    let text_w = entries
        .iter()
        .map(|(label, _)| text_width(label, TICK_SCALE) as i64)
        .max()
        .unwrap_or(0);
    let (w, h) = (text_w + 32, entries.len() as i64 * line_h + PAD);
    let x = match loc {
        LegendLoc::UpperLeft | LegendLoc::LowerLeft => area.x + PAD,
        LegendLoc::UpperRight | LegendLoc::LowerRight => area.right() - PAD - w,
    };
    let y = match loc {
        LegendLoc::UpperLeft | LegendLoc::UpperRight => area.y + PAD,
        LegendLoc::LowerLeft | LegendLoc::LowerRight => area.bottom() - PAD - h,
    };
    let frame = Rect { x, y, w, h };
    fill_rect(img, frame, WHITE);
    outline_rect(img, frame, LIGHT_GRAY);

    for (i, (label, color)) in entries.iter().enumerate() {
        let row_y = y + PAD / 2 + i as i64 * line_h + line_h / 2;
        draw_line(img, (x + 6, row_y), (x + 22, row_y), *color);
        draw_line(img, (x + 6, row_y + 1), (x + 22, row_y + 1), *color);
        draw_text(
            img,
            x + 26,
            row_y - text_height(TICK_SCALE) as i64 / 2,
            label,
            TICK_SCALE,
            GRAY,
        );
    }
}

fn draw_image(img: &mut RgbImage, pic: &RgbImage, area: Rect) {
    if pic.width() == 0 || pic.height() == 0 || area.is_empty() {
        return;
    }
    let scale = (area.w as f64 / pic.width() as f64).min(area.h as f64 / pic.height() as f64);
    let w = ((pic.width() as f64 * scale).floor() as u32).max(1);
    let h = ((pic.height() as f64 * scale).floor() as u32).max(1);
    let resized = imageops::resize(pic, w, h, imageops::FilterType::Nearest);

    let x = area.x + (area.w - w as i64) / 2;
    let y = area.y + (area.h - h as i64) / 2;
    imageops::overlay(img, &resized, x, y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{color::series_color, ColorMap, Series, VerticalMarker};

    #[test]
    fn bresenham_hits_both_endpoints() {
        let mut img = RgbImage::from_pixel(10, 10, WHITE);
        draw_line(&mut img, (1, 8), (8, 2), BLACK);
        assert_eq!(*img.get_pixel(1, 8), BLACK);
        assert_eq!(*img.get_pixel(8, 2), BLACK);
        // clipped lines must not panic
        draw_line(&mut img, (-5, -5), (20, 20), BLACK);
    }

    #[test]
    fn integer_ticks_cover_epochs() {
        assert_eq!(integer_ticks((0.0, 4.0)), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(integer_ticks((0.0, 20.0)), vec![0.0, 4.0, 8.0, 12.0, 16.0, 20.0]);
    }

    #[test]
    fn single_epoch_tick_is_not_negative_zero() {
        // a one-point series widens to (-0.5, 0.5)
        let ticks = integer_ticks((-0.5, 0.5));
        assert_eq!(ticks.len(), 1);
        assert_eq!(format!("{:.0}", ticks[0]), "0");
        assert!(ticks[0].is_sign_positive());
    }

    #[test]
    fn heatmap_cells_are_filled_with_the_colormap() {
        let hm = Heatmap {
            rows: 1,
            cols: 2,
            values: vec![0.0, 10.0],
            x_ticks: vec!["a".into(), "b".into()],
            y_ticks: vec!["a".into()],
            annotations: Vec::new(),
            colormap: ColorMap::Blues,
            colorbar: false,
            text_size: 10,
        };
        let mut img = RgbImage::from_pixel(100, 50, WHITE);
        let area = Rect { x: 0, y: 0, w: 100, h: 50 };
        let (x_ticks, y_ticks) = draw_heatmap(&mut img, &hm, area);

        assert_eq!(*img.get_pixel(5, 5), ColorMap::Blues.at(0.0));
        assert_eq!(*img.get_pixel(95, 45), ColorMap::Blues.at(1.0));
        assert_eq!(x_ticks, vec![(25, "a".to_string()), (75, "b".to_string())]);
        assert_eq!(y_ticks, vec![(25, "a".to_string())]);
    }

    #[test]
    fn line_chart_draws_series_and_marker() {
        let chart = LineChart::new()
            .series(Series::indexed("loss", &[1.0, 0.5, 0.25], series_color(0)))
            .marker(VerticalMarker {
                x: 1.0,
                label: "start".into(),
                color: series_color(2),
            })
            .legend(LegendLoc::UpperRight);
        let mut img = RgbImage::from_pixel(200, 100, WHITE);
        let area = Rect { x: 10, y: 10, w: 180, h: 80 };
        draw_lines(&mut img, &chart, area);

        let has = |c: Rgb<u8>| img.pixels().any(|p| *p == c);
        assert!(has(series_color(0)));
        assert!(has(series_color(2)));
    }
}
