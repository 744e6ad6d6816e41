use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::annotations::{self, extract_file, Extraction, FileExtraction};
use crate::{err_io, err_msg, OracleError};

/// Extensions scanned for annotations.
pub const SOURCE_EXTENSIONS: &[&str] = &["cpp", "cc", "cxx", "c++", "c", "h", "hh", "hpp", "hxx", "ipp", "inl"];

/// Finds annotated sources under a project tree.
#[derive(Debug)]
pub struct SourceDiscoverer;

impl SourceDiscoverer {
    /// Returns true if the given path has a C or C++ extension.
    fn is_source_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
    }

    /// Recursively scans `root` for source files. A file path is returned as-is.
    ///
    /// The returned list is sorted so that extraction order, and therefore the
    /// report, is deterministic.
    pub fn discover_source_files<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>, OracleError> {
        let root = root.as_ref();
        if root.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }
        if !root.exists() {
            return Err(err_msg!(Io, "source path '{}' does not exist", root.display()));
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|e| err_msg!(Io, "failed to walk directory: {}", e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !Self::is_source_file(path) {
                continue;
            }
            files.push(path.to_path_buf());
        }
        files.sort();
        Ok(files)
    }

    /// Reads and extracts one file.
    pub fn extract_from_file(path: &Path) -> Result<FileExtraction, OracleError> {
        let bytes = std::fs::read(path).map_err(|e| err_io!(path, e))?;
        let content = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %path.display(), "source is not valid UTF-8, decoding lossily");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        Ok(extract_file(path, &content))
    }
}

/// Discovers every source under `root`, extracts them in parallel and merges
/// the results in path order.
pub fn extract_tree<P: AsRef<Path>>(root: P) -> Result<Extraction, OracleError> {
    let files = SourceDiscoverer::discover_source_files(root.as_ref())?;
    info!(root = %root.as_ref().display(), files = files.len(), "scanning sources");
    let extracted = files
        .par_iter()
        .map(|path| SourceDiscoverer::extract_from_file(path))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(files = extracted.len(), "per-file extraction complete");
    Ok(annotations::merge(extracted))
}
