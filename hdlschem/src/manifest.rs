// manifest.rs — Configuration: manifest loading and corpus assembly
//
// A manifest is a plain text file, one source path per line (blank
// lines and `#`-prefixed lines ignored), naming the Verilog files that
// together make up the design. Paths are resolved relative to the
// manifest's own directory, matching how the reference tool is invoked
// from a project root alongside its file list.

use std::path::{Path, PathBuf};

use crate::clean;
use crate::diag::HdlError;

/// Reads `manifest_path`, returning the list of source file paths it
/// names, in order, resolved relative to the manifest's parent
/// directory.
pub fn load(manifest_path: &Path) -> Result<Vec<PathBuf>, HdlError> {
    let text = std::fs::read_to_string(manifest_path)
        .map_err(|_| HdlError::manifest_not_found(manifest_path.to_path_buf()))?;
    let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    let mut out = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        out.push(base.join(trimmed));
    }
    Ok(out)
}

/// Reads and lexically cleans every file named in `paths`, concatenating
/// their cleaned lines in order into one corpus for slicing.
pub fn load_corpus(paths: &[PathBuf]) -> Result<Vec<String>, HdlError> {
    let mut corpus = Vec::new();
    for path in paths {
        let text = std::fs::read_to_string(path)
            .map_err(|_| HdlError::source_not_found(path.clone()))?;
        let raw_lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
        corpus.extend(clean::clean(&raw_lines));
    }
    Ok(corpus)
}
