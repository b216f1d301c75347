//! Zip packaging of the working directory.

use std::fs::File;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::harvest::PipelineError;

/// Compresses everything below `source` into the zip file `destination`.
///
/// Entry names are relative to `source` (so `source/u1.txt` becomes
/// `u1.txt`) and are written in file-name order. Returns the archive size in
/// bytes. Blocking; call from `spawn_blocking` in async code.
pub fn zip_directory(source: &Path, destination: &Path) -> Result<u64, PipelineError> {
    let mut writer = ZipWriter::new(File::create(destination)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| PipelineError::Io(e.into()))?;
        let relative =
            entry
                .path()
                .strip_prefix(source)
                .map_err(|_| PipelineError::PathTraversal {
                    attempted: entry.path().display().to_string(),
                })?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            writer.add_directory(name, options)?;
        } else {
            debug!(entry = %name, "Adding to archive");
            writer.start_file(name, options)?;
            let mut file = File::open(entry.path())?;
            std::io::copy(&mut file, &mut writer)?;
        }
    }

    let file = writer.finish()?;
    Ok(file.metadata()?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_zip_directory_stores_relative_entries() {
        let root = tempfile::TempDir::new().unwrap();
        let source = root.path().join("bundle");
        std::fs::create_dir(&source).unwrap();
        std::fs::write(source.join("u1.txt"), [0x54, 0xe9, 0x73, 0x69, 0x73]).unwrap();
        std::fs::write(source.join("metadata.json"), br#"{"u1":{}}"#).unwrap();

        let destination = root.path().join("bundle.zip");
        let size = zip_directory(&source, &destination).unwrap();
        assert_eq!(size, std::fs::metadata(&destination).unwrap().len());

        let mut archive = zip::ZipArchive::new(File::open(&destination).unwrap()).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["metadata.json", "u1.txt"]);

        let mut content = Vec::new();
        archive
            .by_name("u1.txt")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, vec![0x54, 0xe9, 0x73, 0x69, 0x73]);
    }

    #[test]
    fn test_zip_empty_directory() {
        let root = tempfile::TempDir::new().unwrap();
        let source = root.path().join("empty");
        std::fs::create_dir(&source).unwrap();

        let destination = root.path().join("empty.zip");
        zip_directory(&source, &destination).unwrap();

        let archive = zip::ZipArchive::new(File::open(&destination).unwrap()).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
