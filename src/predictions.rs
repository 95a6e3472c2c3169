use std::{fs::File, path::Path};

use parquet::{
    file::{reader::FileReader, serialized_reader::SerializedFileReader},
    record::RowAccessor,
};

use crate::error::Result;

/// Reads the `(y_true, y_pred)` label columns of a Parquet predictions file.
///
/// The first two columns of every row must be int64. A row that fails to
/// decode fails the whole read.
pub fn load_predictions(path: impl AsRef<Path>) -> Result<(Vec<i64>, Vec<i64>)> {
    let file = File::open(path.as_ref())?;
    let reader: SerializedFileReader<File> = SerializedFileReader::new(file)?;

    let mut y_true = Vec::new();
    let mut y_pred = Vec::new();
    for row in reader.get_row_iter(None)? {
        let row = row?;
        y_true.push(row.get_long(0)?);
        y_pred.push(row.get_long(1)?);
    }
    Ok((y_true, y_pred))
}
