//! File IO for the dispatcher: open with line-ending normalization, write
//! back with the original style.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

use core_state::{LineEnding, denormalize, normalize_line_endings};

/// Content and on-disk format of an opened file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedFile {
    /// LF-only text without the final newline.
    pub text: String,
    pub line_ending: LineEnding,
    pub trailing_newline: bool,
    pub mixed_line_endings: bool,
    /// The path did not exist; the document starts empty.
    pub is_new: bool,
}

pub fn open_file(path: &Path) -> io::Result<OpenedFile> {
    match fs::read(path) {
        Ok(bytes) => {
            let content = String::from_utf8_lossy(&bytes);
            let norm = normalize_line_endings(&content);
            tracing::info!(target: "io", path = %path.display(), bytes = bytes.len(), ending = ?norm.ending, mixed = norm.mixed, "opened");
            Ok(OpenedFile {
                text: norm.text,
                line_ending: norm.ending,
                trailing_newline: norm.had_trailing_newline,
                mixed_line_endings: norm.mixed,
                is_new: false,
            })
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(target: "io", path = %path.display(), "new file");
            Ok(OpenedFile {
                text: String::new(),
                line_ending: LineEnding::Lf,
                trailing_newline: true,
                mixed_line_endings: false,
                is_new: true,
            })
        }
        Err(e) => {
            tracing::error!(target: "io", path = %path.display(), error = %e, "file_open_error");
            Err(e)
        }
    }
}

/// Write LF-only `text` using `ending`, appending a final newline when
/// `trailing_newline` is set. Returns bytes written.
pub fn write_file(
    path: &Path,
    text: &str,
    ending: LineEnding,
    trailing_newline: bool,
) -> io::Result<usize> {
    let content = denormalize(text, ending, trailing_newline);
    match fs::write(path, content.as_bytes()) {
        Ok(()) => {
            tracing::info!(target: "io", path = %path.display(), bytes = content.len(), "written");
            Ok(content.len())
        }
        Err(e) => {
            tracing::error!(target: "io", path = %path.display(), error = %e, "file_write_error");
            Err(e)
        }
    }
}
