use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::SourceMode;
use crate::error::{Result, SubgenError};

/// Recognized media containers, matched case-insensitively on the file
/// extension.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "webm", "flv", "mpeg", "mp3", "wav",
];

/// Enumerate candidate media files for a run.
///
/// Single-file mode yields the path itself when it is an existing file.
/// Directory mode walks the tree recursively and keeps files with a
/// recognized extension, in traversal order. A missing path yields an
/// empty list; the caller decides how to surface that.
pub fn find_media_files(source: &Path, mode: SourceMode) -> Vec<PathBuf> {
    find_media_files_with(source, mode, MEDIA_EXTENSIONS)
}

pub fn find_media_files_with(source: &Path, mode: SourceMode, extensions: &[&str]) -> Vec<PathBuf> {
    match mode {
        SourceMode::SingleFile => {
            if source.is_file() {
                vec![source.to_path_buf()]
            } else {
                Vec::new()
            }
        }
        SourceMode::DirectoryBatch => {
            let mut files = Vec::new();
            for entry in WalkDir::new(source).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) {
                    if extensions.contains(&ext.to_lowercase().as_str()) {
                        files.push(entry.path().to_path_buf());
                    }
                }
            }
            files
        }
    }
}

/// One unit of batch work: an input media file and the subtitle path it
/// resolves to. Immutable once created.
#[derive(Debug, Clone)]
pub struct MediaJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl MediaJob {
    /// Resolve the output subtitle path for an input file. The destination
    /// override is honored only when it is an existing directory; otherwise
    /// the subtitle lands next to its source.
    pub fn resolve(input: &Path, destination: Option<&Path>) -> Result<Self> {
        let stem = input
            .file_stem()
            .ok_or_else(|| SubgenError::Config(format!("Invalid media filename: {}", input.display())))?;

        let output_dir = match destination {
            Some(dir) if dir.is_dir() => dir.to_path_buf(),
            _ => input
                .parent()
                .ok_or_else(|| SubgenError::Config("Cannot determine output directory".to_string()))?
                .to_path_buf(),
        };

        let output = output_dir.join(format!("{}.srt", stem.to_string_lossy()));

        Ok(Self {
            input: input.to_path_buf(),
            output,
        })
    }

    pub fn file_name(&self) -> String {
        self.input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input.display().to_string())
    }
}
