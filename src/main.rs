use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trainkit::{
    compare_histories, compute_classification_metrics, create_experiment_log_dir,
    load_and_prep_image, load_predictions, plot_loss_curves, render_confusion_matrix, unzip_data,
    walk_through_dir, ConfusionOptions, Figure, History, PrepOptions,
};

#[derive(Debug, Parser)]
#[command(name = "trainkit", version, about = "Helpers for image-classification training runs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score predictions stored as (y_true, y_pred) int64 columns of a Parquet file.
    Metrics {
        input: PathBuf,
        /// Comma separated class names, in sorted label order.
        #[arg(long, value_delimiter = ',')]
        classes: Option<Vec<String>>,
        #[arg(long)]
        normalize: bool,
        /// Write confusion_matrix.png to the working directory.
        #[arg(long)]
        export: bool,
        /// Print the metrics as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Plot loss and accuracy curves of a history JSON file.
    Curves {
        history: PathBuf,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Plot a run continued by a second run (e.g. fine tuning).
    Compare {
        original: PathBuf,
        new: PathBuf,
        #[arg(long, default_value_t = 5)]
        initial_epochs: usize,
        #[arg(long, default_value = "history_comparison.png")]
        out: PathBuf,
    },
    /// Create a timestamped log directory for an experiment.
    Logdir { dir: PathBuf, experiment: String },
    /// Extract a zip archive.
    Unzip {
        file: PathBuf,
        #[arg(long, default_value = ".")]
        dest: PathBuf,
    },
    /// Count directories and files below a directory.
    Walk { dir: PathBuf },
    /// Load and preprocess an image the way a model would receive it.
    Prep {
        image: PathBuf,
        #[arg(long, default_value_t = 224)]
        size: u32,
        #[arg(long)]
        no_scale: bool,
    },
}

fn run(command: Command) -> trainkit::Result<()> {
    match command {
        Command::Metrics {
            input,
            classes,
            normalize,
            export,
            json,
        } => {
            let (y_true, y_pred) = load_predictions(&input)?;
            tracing::info!(samples = y_true.len(), "loaded predictions");

            let results = compute_classification_metrics(&y_true, &y_pred)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!("{results}");
            }

            let options = ConfusionOptions {
                classes,
                normalize,
                export,
                ..ConfusionOptions::default()
            };
            let (w, h) = options.figsize;
            render_confusion_matrix(Figure::new(w, h), &y_true, &y_pred, &options)?;
        }
        Command::Curves { history, out_dir } => {
            let curves = plot_loss_curves(&History::load(history)?)?;
            curves.loss.save(out_dir.join("loss.png"))?;
            curves.accuracy.save(out_dir.join("accuracy.png"))?;
        }
        Command::Compare {
            original,
            new,
            initial_epochs,
            out,
        } => {
            let figure =
                compare_histories(&History::load(original)?, &History::load(new)?, initial_epochs)?;
            figure.save(out)?;
        }
        Command::Logdir { dir, experiment } => {
            println!("{}", create_experiment_log_dir(dir, &experiment)?.display());
        }
        Command::Unzip { file, dest } => {
            unzip_data(file, dest)?;
        }
        Command::Walk { dir } => {
            walk_through_dir(dir)?;
        }
        Command::Prep {
            image,
            size,
            no_scale,
        } => {
            let tensor = load_and_prep_image(
                image,
                PrepOptions {
                    img_shape: size,
                    scale: !no_scale,
                },
            )?;
            let (lo, hi) = tensor.value_range();
            println!("shape: {:?}, min: {lo}, max: {hi}", tensor.shape());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
