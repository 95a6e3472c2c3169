use std::{fs::File, io, path::Path};

use zip::ZipArchive;

/// Extracts every entry of the zip archive at `filename` into `dest`.
///
/// Entries whose names would land outside `dest` are skipped. Returns the
/// number of files written.
pub fn unzip_data(filename: impl AsRef<Path>, dest: impl AsRef<Path>) -> crate::Result<usize> {
    let filename = filename.as_ref();
    let dest = dest.as_ref();
    let mut archive = ZipArchive::new(File::open(filename)?)?;
    let mut extracted = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(name = entry.name(), "skipping archive entry outside the destination");
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        extracted += 1;
    }

    tracing::info!(
        archive = %filename.display(),
        dest = %dest.display(),
        files = extracted,
        "unzipped data"
    );
    Ok(extracted)
}
