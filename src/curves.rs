use crate::{
    error::{Error, Result},
    figure::{
        color::series_color, Axes, Figure, LegendLoc, LineChart, Plot, Series, VerticalMarker,
    },
    history::History,
};

/// Separate loss and accuracy figures for one training run.
#[derive(Debug, Clone)]
pub struct LossCurves {
    pub loss: Figure,
    pub accuracy: Figure,
}

fn curve_figure(history: &History, title: &str, keys: [(&str, &str); 2]) -> Result<Figure> {
    let mut chart = LineChart::new().legend(LegendLoc::UpperRight);
    for (i, (key, label)) in keys.into_iter().enumerate() {
        chart = chart.series(Series::indexed(label, history.series(key)?, series_color(i)));
    }
    Ok(Figure::default().with_axes(Axes::new(title, Plot::Lines(chart)).xlabel("Epochs")))
}

/// Plots training against validation loss, and training against validation accuracy.
pub fn plot_loss_curves(history: &History) -> Result<LossCurves> {
    Ok(LossCurves {
        loss: curve_figure(
            history,
            "Loss",
            [("loss", "training_loss"), ("val_loss", "val_loss")],
        )?,
        accuracy: curve_figure(
            history,
            "Accuracy",
            [("accuracy", "training_accuracy"), ("val_accuracy", "val_accuracy")],
        )?,
    })
}

fn fine_tune_marker(initial_epochs: usize) -> VerticalMarker {
    VerticalMarker {
        x: (initial_epochs - 1) as f64,
        label: "Start Fine Tuning".into(),
        color: series_color(2),
    }
}

/// Joins a run with the run that continued it (for example a fine-tuning
/// phase) and plots both accuracy and loss, marking where the second run
/// started.
pub fn compare_histories(
    original: &History,
    new: &History,
    initial_epochs: usize,
) -> Result<Figure> {
    if initial_epochs == 0 {
        return Err(Error::invalid("initial_epochs must be at least 1"));
    }

    let accuracy = LineChart::new()
        .series(Series::indexed(
            "Training Accuracy",
            &original.concat(new, "accuracy")?,
            series_color(0),
        ))
        .series(Series::indexed(
            "Validation Accuracy",
            &original.concat(new, "val_accuracy")?,
            series_color(1),
        ))
        .marker(fine_tune_marker(initial_epochs))
        .legend(LegendLoc::LowerRight);

    let loss = LineChart::new()
        .series(Series::indexed(
            "Training Loss",
            &original.concat(new, "loss")?,
            series_color(0),
        ))
        .series(Series::indexed(
            "Validation Loss",
            &original.concat(new, "val_loss")?,
            series_color(1),
        ))
        .marker(fine_tune_marker(initial_epochs))
        .legend(LegendLoc::UpperRight);

    Ok(Figure::new(800, 800)
        .with_axes(Axes::new("Training and Validation Accuracy", Plot::Lines(accuracy)))
        .with_axes(
            Axes::new("Training and Validation Loss", Plot::Lines(loss)).xlabel("epoch"),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(loss: Vec<f64>, acc: Vec<f64>) -> History {
        History::new()
            .with("loss", loss.clone())
            .with("val_loss", loss)
            .with("accuracy", acc.clone())
            .with("val_accuracy", acc)
    }

    fn chart(fig: &Figure, idx: usize) -> &LineChart {
        match &fig.axes()[idx].plot {
            Plot::Lines(c) => c,
            other => panic!("expected lines, got {other:?}"),
        }
    }

    #[test]
    fn loss_curves_use_named_series() {
        let curves = plot_loss_curves(&run(vec![1.0, 0.5], vec![0.5, 0.7])).unwrap();
        let loss = chart(&curves.loss, 0);
        assert_eq!(loss.series[0].label, "training_loss");
        assert_eq!(loss.series[1].label, "val_loss");
        assert_eq!(loss.series[0].points, vec![(0.0, 1.0), (1.0, 0.5)]);
        assert_eq!(curves.accuracy.axes()[0].title, "Accuracy");
        assert_eq!(curves.accuracy.axes()[0].xlabel.as_deref(), Some("Epochs"));
    }

    #[test]
    fn loss_curves_need_validation_series() {
        let h = History::new().with("loss", vec![1.0]).with("accuracy", vec![0.1]);
        assert!(matches!(plot_loss_curves(&h), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn comparison_concatenates_and_marks_fine_tuning() {
        let original = run(vec![3.0, 2.0, 1.5], vec![0.2, 0.4, 0.5]);
        let new = run(vec![1.0, 0.8], vec![0.7, 0.8]);
        let fig = compare_histories(&original, &new, 3).unwrap();

        assert_eq!(fig.size(), (800, 800));
        let acc = chart(&fig, 0);
        assert_eq!(acc.series[0].points.len(), 5);
        assert_eq!(acc.markers[0].x, 2.0);
        assert_eq!(acc.legend, Some(LegendLoc::LowerRight));
        assert_eq!(chart(&fig, 1).legend, Some(LegendLoc::UpperRight));
        assert_eq!(fig.axes()[1].xlabel.as_deref(), Some("epoch"));
    }

    #[test]
    fn comparison_rejects_zero_initial_epochs() {
        let h = run(vec![1.0], vec![0.5]);
        assert!(matches!(compare_histories(&h, &h, 0), Err(Error::InvalidInput(_))));
    }
}
