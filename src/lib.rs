//! Helpers used alongside image-classification training: evaluation metrics,
//! confusion matrix and training-curve figures, image preprocessing, and a
//! few file utilities.

pub mod archive;
pub mod confusion;
pub mod curves;
pub mod error;
pub mod figure;
pub mod history;
pub mod logdir;
pub mod metrics;
pub mod predict;
pub mod predictions;
pub mod preprocess;
pub mod walk;

pub use archive::unzip_data;
pub use confusion::{render_confusion_matrix, ConfusionOptions};
pub use curves::{compare_histories, plot_loss_curves, LossCurves};
pub use error::{Error, Result};
pub use figure::Figure;
pub use history::History;
pub use logdir::create_experiment_log_dir;
pub use metrics::{
    compute_classification_metrics, confusion_matrix, ConfusionMatrix, MetricsResult,
};
pub use predict::{pred_and_plot, ImageClassifier, Prediction};
pub use predictions::load_predictions;
pub use preprocess::{load_and_prep_image, ImageTensor, PrepOptions};
pub use walk::{walk_through_dir, DirSummary};
