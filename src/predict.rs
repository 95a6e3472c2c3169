use std::path::Path;

use crate::{
    error::{Error, Result},
    figure::{Axes, Figure, Plot},
    preprocess::{load_and_prep_image, ImageTensor, PrepOptions},
};

/// Base trait for models that classify a preprocessed image.
pub trait ImageClassifier {
    /// Returns one score per class, or a single sigmoid output for binary models.
    fn predict_probas(&self, image: &ImageTensor) -> Result<Box<[f32]>>;
}

/// Outcome of classifying a single image.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub class_index: usize,
    pub class_name: String,
    pub probabilities: Box<[f32]>,
}

/// Index of the predicted class: the argmax of a multi-class output, or the
/// rounded value of a single binary output.
pub fn predicted_class(probas: &[f32]) -> Result<usize> {
    match probas {
        [] => Err(Error::invalid("model returned no outputs")),
        [p] if p.is_finite() && *p >= 0.0 => Ok(p.round() as usize),
        [p] => Err(Error::invalid(format!("binary output {p} cannot be rounded to a class"))),
        _ => probas
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(idx, _)| idx)
            .ok_or_else(|| Error::invalid("model returned no outputs")),
    }
}

/// Classifies the image at `path` and plots it titled with the predicted class.
pub fn pred_and_plot<S: AsRef<str>>(
    model: &dyn ImageClassifier,
    path: impl AsRef<Path>,
    class_names: &[S],
) -> Result<(Prediction, Figure)> {
    let image = load_and_prep_image(path, PrepOptions::default())?;
    let probabilities = model.predict_probas(&image)?;
    let class_index = predicted_class(&probabilities)?;

    let class_name = class_names
        .get(class_index)
        .map(|s| s.as_ref().to_owned())
        .ok_or_else(|| {
            Error::invalid(format!(
                "predicted class {class_index} but only {} class names were given",
                class_names.len()
            ))
        })?;
    tracing::info!(class = %class_name, "prediction");

    let figure = Figure::new(480, 520).with_axes(
        Axes::new(
            format!("Prediction: {class_name}"),
            Plot::Image(image.to_rgb_image()),
        )
        .hide_axis(),
    );

    Ok((
        Prediction {
            class_index,
            class_name,
            probabilities,
        },
        figure,
    ))
}
