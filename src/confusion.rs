use std::{fmt::Display, hash::Hash, path::PathBuf};

use crate::{
    error::{Error, Result},
    figure::{
        color::{BLACK, WHITE},
        Annotation, Axes, ColorMap, Figure, Heatmap, Plot,
    },
    metrics::{confusion_matrix_from_labels, ConfusionMatrix},
};

/// File name used when a confusion matrix figure is exported.
pub const EXPORT_FILE_NAME: &str = "confusion_matrix.png";

/// Options of [`render_confusion_matrix`].
#[derive(Debug, Clone)]
pub struct ConfusionOptions {
    /// Tick labels, one per distinct label in sorted order. `None` uses the labels themselves.
    pub classes: Option<Vec<String>>,
    /// Annotate each cell with its share of the row as well as the count.
    pub normalize: bool,
    /// Write the figure to [`EXPORT_FILE_NAME`] inside `export_dir`.
    pub export: bool,
    /// Directory the export lands in, the working directory by default.
    pub export_dir: PathBuf,
    /// Figure size in pixels.
    pub figsize: (u32, u32),
    /// Point size of the cell text.
    pub text_size: u32,
}

impl Default for ConfusionOptions {
    fn default() -> Self {
        Self {
            classes: None,
            normalize: false,
            export: false,
            export_dir: PathBuf::from("."),
            figsize: (1000, 1000),
            text_size: 15,
        }
    }
}

impl ConfusionOptions {
    pub fn classes<S: Into<String>>(mut self, classes: impl IntoIterator<Item = S>) -> Self {
        self.classes = Some(classes.into_iter().map(Into::into).collect());
        self
    }

    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn export_to(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export = true;
        self.export_dir = dir.into();
        self
    }
}

/// Text of one matrix cell: the raw count, or `"count (pct%)"` when normalized.
///
/// Rows without samples show `0.0%`.
pub fn cell_text(matrix: &ConfusionMatrix, truth: usize, pred: usize, normalize: bool) -> String {
    let count = matrix.get(truth, pred);
    if !normalize {
        return count.to_string();
    }
    let share = matrix.row_fraction(truth, pred).unwrap_or(0.0);
    format!("{count} ({:.1}%)", share * 100.0)
}

/// Text colour keeping a cell legible: white on cells above the midpoint of
/// the matrix range, black elsewhere.
pub fn text_color(count: usize, (min, max): (usize, usize)) -> image::Rgb<u8> {
    let threshold = (max + min) as f64 / 2.0;
    if count as f64 > threshold {
        WHITE
    } else {
        BLACK
    }
}

/// Build the confusion matrix of `y_true` against `y_pred` and append it to
/// `figure` as a labelled, colour-mapped grid.
///
/// Rows are true classes and columns predicted classes, both in sorted label
/// order. The figure is written to disk once all cells are annotated when
/// `options.export` is set.
pub fn render_confusion_matrix<L>(
    mut figure: Figure,
    y_true: &[L],
    y_pred: &[L],
    options: &ConfusionOptions,
) -> Result<Figure>
where
    L: Hash + Eq + Ord + Display,
{
    let (space, matrix) = confusion_matrix_from_labels(y_true, y_pred)?;
    let n = matrix.num_classes();

    let labels: Vec<String> = match &options.classes {
        Some(classes) if classes.len() != n => {
            return Err(Error::invalid(format!(
                "{} class names were given but {n} distinct labels were observed",
                classes.len()
            )));
        }
        Some(classes) => classes.clone(),
        None => space.labels().map(ToString::to_string).collect(),
    };

    let range = matrix.min_max();
    let mut annotations = Vec::with_capacity(n * n);
    for truth in 0..n {
        for pred in 0..n {
            annotations.push(Annotation {
                text: cell_text(&matrix, truth, pred, options.normalize),
                color: text_color(matrix.get(truth, pred), range),
            });
        }
    }

    let heatmap = Heatmap {
        rows: n,
        cols: n,
        values: matrix.rows().flatten().map(|&v| v as f64).collect(),
        x_ticks: labels.clone(),
        y_ticks: labels,
        annotations,
        colormap: ColorMap::Blues,
        colorbar: true,
        text_size: options.text_size,
    };

    figure.push_axes(
        Axes::new("Confusion Matrix", Plot::Heatmap(heatmap))
            .xlabel("Predicted label")
            .ylabel("True label"),
    );

    if options.export {
        let path = options.export_dir.join(EXPORT_FILE_NAME);
        figure.save(&path)?;
        tracing::info!(path = %path.display(), "exported confusion matrix");
    }

    Ok(figure)
}
