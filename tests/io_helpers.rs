use std::{fs, io::Write, path::Path, sync::Arc};

use image::{Rgb, RgbImage};
use parquet::{
    data_type::{ByteArray, ByteArrayType, Int64Type},
    file::writer::SerializedFileWriter,
    schema::parser::parse_message_type,
};
use tempfile::tempdir;
use trainkit::{
    confusion::EXPORT_FILE_NAME, create_experiment_log_dir, load_and_prep_image,
    load_predictions, pred_and_plot, render_confusion_matrix, unzip_data, walk_through_dir,
    ConfusionOptions, Error, Figure, ImageClassifier, ImageTensor, PrepOptions,
};

fn write_png(path: &Path, w: u32, h: u32, color: Rgb<u8>) {
    RgbImage::from_pixel(w, h, color).save(path).unwrap();
}

#[test]
fn exports_confusion_matrix_png() {
    let dir = tempdir().unwrap();
    let options = ConfusionOptions::default()
        .classes(["cat", "dog"])
        .normalize(true)
        .export_to(dir.path());

    let fig = render_confusion_matrix(
        Figure::new(300, 300),
        &["cat", "cat", "dog", "dog"],
        &["cat", "dog", "dog", "dog"],
        &options,
    )
    .unwrap();
    assert_eq!(fig.axes().len(), 1);

    let saved = image::open(dir.path().join(EXPORT_FILE_NAME)).unwrap();
    assert_eq!((saved.width(), saved.height()), (300, 300));
}

#[test]
fn no_export_without_flag() {
    let dir = tempdir().unwrap();
    let options = ConfusionOptions {
        export_dir: dir.path().to_path_buf(),
        ..ConfusionOptions::default()
    };
    render_confusion_matrix(Figure::default(), &[1, 2], &[1, 1], &options).unwrap();
    assert!(!dir.path().join(EXPORT_FILE_NAME).exists());
}

#[test]
fn prepares_images_to_square_tensors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("red.png");
    write_png(&path, 12, 8, Rgb([255, 0, 0]));

    let scaled = load_and_prep_image(
        &path,
        PrepOptions {
            img_shape: 4,
            scale: true,
        },
    )
    .unwrap();
    assert_eq!(scaled.shape(), [4, 4, 3]);
    assert!((scaled.get(2, 2, 0) - 1.0).abs() < 1e-6);
    assert_eq!(scaled.get(2, 2, 1), 0.0);

    let raw = load_and_prep_image(
        &path,
        PrepOptions {
            img_shape: 4,
            scale: false,
        },
    )
    .unwrap();
    assert_eq!(raw.value_range(), (0.0, 255.0));
}

#[test]
fn undecodable_image_is_an_image_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.jpg");
    fs::write(&path, b"not an image").unwrap();
    assert!(matches!(
        load_and_prep_image(&path, PrepOptions::default()),
        Err(Error::Image(_))
    ));
}

struct Constant(Vec<f32>);

impl ImageClassifier for Constant {
    fn predict_probas(&self, _image: &ImageTensor) -> trainkit::Result<Box<[f32]>> {
        Ok(self.0.clone().into_boxed_slice())
    }
}

#[test]
fn predicts_and_titles_the_figure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pizza.png");
    write_png(&path, 32, 32, Rgb([200, 120, 40]));

    let (prediction, fig) =
        pred_and_plot(&Constant(vec![0.1, 0.9]), &path, &["steak", "pizza"]).unwrap();
    assert_eq!(prediction.class_name, "pizza");
    assert_eq!(fig.axes()[0].title, "Prediction: pizza");
    assert!(!fig.axes()[0].show_axis);

    let (binary, _) = pred_and_plot(&Constant(vec![0.2]), &path, &["steak", "pizza"]).unwrap();
    assert_eq!(binary.class_index, 0);

    let err = pred_and_plot(&Constant(vec![0.0, 0.0, 1.0]), &path, &["steak", "pizza"]);
    assert!(matches!(err, Err(Error::InvalidInput(_))));
}

#[test]
fn creates_timestamped_log_dir() {
    let dir = tempdir().unwrap();
    let log_dir = create_experiment_log_dir(dir.path(), "baseline").unwrap();

    assert!(log_dir.is_dir());
    assert!(log_dir.starts_with(dir.path().join("baseline")));
    let stamp = log_dir.file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(stamp.len(), "20240101-000000".len());
    assert_eq!(&stamp[8..9], "-");
}

#[test]
fn unzips_nested_entries() {
    let dir = tempdir().unwrap();
    let archive_path = dir.path().join("data.zip");
    {
        let mut zip = zip::ZipWriter::new(fs::File::create(&archive_path).unwrap());
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        zip.add_directory("train/", options).unwrap();
        zip.start_file("train/cat/1.jpg", options).unwrap();
        zip.write_all(b"meow").unwrap();
        zip.start_file("labels.txt", options).unwrap();
        zip.write_all(b"cat\ndog\n").unwrap();
        zip.finish().unwrap();
    }

    let dest = dir.path().join("out");
    let extracted = unzip_data(&archive_path, &dest).unwrap();

    assert_eq!(extracted, 2);
    assert_eq!(fs::read(dest.join("train/cat/1.jpg")).unwrap(), b"meow");
    assert!(dest.join("labels.txt").is_file());
}

#[test]
fn skips_entries_outside_destination() {
    let dir = tempdir().unwrap();
    let archive_path = dir.path().join("evil.zip");
    {
        let mut zip = zip::ZipWriter::new(fs::File::create(&archive_path).unwrap());
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("../escape.txt", options).unwrap();
        zip.write_all(b"outside").unwrap();
        zip.start_file("ok.txt", options).unwrap();
        zip.write_all(b"inside").unwrap();
        zip.finish().unwrap();
    }

    let dest = dir.path().join("out");
    let extracted = unzip_data(&archive_path, &dest).unwrap();

    assert_eq!(extracted, 1);
    assert_eq!(fs::read(dest.join("ok.txt")).unwrap(), b"inside");
    assert!(!dir.path().join("escape.txt").exists());
}

fn write_label_columns(path: &Path, y_true: &[i64], y_pred: &[i64]) {
    let schema = Arc::new(
        parse_message_type("message predictions { REQUIRED INT64 y_true; REQUIRED INT64 y_pred; }")
            .unwrap(),
    );
    let file = fs::File::create(path).unwrap();
    let mut writer = SerializedFileWriter::new(file, schema, Default::default()).unwrap();
    let mut group = writer.next_row_group().unwrap();
    for values in [y_true, y_pred] {
        let mut column = group.next_column().unwrap().unwrap();
        column
            .typed::<Int64Type>()
            .write_batch(values, None, None)
            .unwrap();
        column.close().unwrap();
    }
    group.close().unwrap();
    writer.close().unwrap();
}

#[test]
fn loads_prediction_columns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("preds.parquet");
    write_label_columns(&path, &[0, 1, 1, 2], &[0, 1, 2, 2]);

    let (y_true, y_pred) = load_predictions(&path).unwrap();
    assert_eq!(y_true, [0, 1, 1, 2]);
    assert_eq!(y_pred, [0, 1, 2, 2]);
}

#[test]
fn non_integer_labels_fail_the_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("names.parquet");
    let schema = Arc::new(
        parse_message_type(
            "message predictions { REQUIRED BYTE_ARRAY y_true (UTF8); REQUIRED INT64 y_pred; }",
        )
        .unwrap(),
    );
    let file = fs::File::create(&path).unwrap();
    let mut writer = SerializedFileWriter::new(file, schema, Default::default()).unwrap();
    let mut group = writer.next_row_group().unwrap();

    let mut column = group.next_column().unwrap().unwrap();
    column
        .typed::<ByteArrayType>()
        .write_batch(&[ByteArray::from("cat")], None, None)
        .unwrap();
    column.close().unwrap();
    let mut column = group.next_column().unwrap().unwrap();
    column
        .typed::<Int64Type>()
        .write_batch(&[0], None, None)
        .unwrap();
    column.close().unwrap();

    group.close().unwrap();
    writer.close().unwrap();

    assert!(matches!(load_predictions(&path), Err(Error::Parquet(_))));
}

#[test]
fn corrupt_pages_are_reported_not_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corrupt.parquet");
    write_label_columns(&path, &[0, 1, 1], &[0, 0, 1]);

    // the footer stays intact, the first page header right after the magic does not
    let mut bytes = fs::read(&path).unwrap();
    bytes[4..12].fill(0xFF);
    fs::write(&path, bytes).unwrap();

    assert!(load_predictions(&path).is_err());
}

#[test]
fn walks_directories_in_order() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("train/cat")).unwrap();
    fs::create_dir_all(root.join("train/dog")).unwrap();
    fs::write(root.join("train/cat/a.jpg"), b"").unwrap();
    fs::write(root.join("train/cat/b.png"), b"").unwrap();
    fs::write(root.join("train/dog/c.JPEG"), b"").unwrap();
    fs::write(root.join("train/dog/notes.txt"), b"").unwrap();

    let summaries = walk_through_dir(root).unwrap();
    let paths: Vec<_> = summaries
        .iter()
        .map(|s| s.path.strip_prefix(root).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        paths,
        [
            Path::new(""),
            Path::new("train"),
            Path::new("train/cat"),
            Path::new("train/dog")
        ]
    );

    assert_eq!((summaries[0].dirs, summaries[0].files), (1, 0));
    assert_eq!((summaries[1].dirs, summaries[1].files), (2, 0));
    assert_eq!((summaries[2].files, summaries[2].images), (2, 2));
    assert_eq!((summaries[3].files, summaries[3].images), (2, 1));
}
