//! Local scratch files
//!
//! The walkthrough uploads small generated files. They are written into the
//! configured work directory and left in place after the run.

use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Length of the random hex token in front of each file name
const TOKEN_LEN: usize = 6;

/// `<6 random hex chars><suffix>`
pub fn temp_file_name(suffix: &str) -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{suffix}", &token[..TOKEN_LEN])
}

fn write_repeated(path: &Path, size: usize, content: &impl Display) -> Result<()> {
    let unit = content.to_string();
    let mut file = std::fs::File::create(path)?;
    file.write_all(unit.repeat(size).as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Write `content` repeated `size` times to a new file in `dir` named by
/// [`temp_file_name`]
///
/// The path is derived before the write and returned alongside its result,
/// so a caller can still refer to the file when writing it failed. The object
/// key used for it is the file name alone.
pub fn create_temp_file(
    dir: &Path,
    size: usize,
    suffix: &str,
    content: &impl Display,
) -> (PathBuf, Result<()>) {
    let path = dir.join(temp_file_name(suffix));
    let result = write_repeated(&path, size, content);
    if result.is_ok() {
        tracing::debug!(path = %path.display(), size, "created temp file");
    }
    (path, result)
}

/// The file name component of `path`, used as the object key
pub fn file_key(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidArgument(format!("no file name in {}", path.display())))
}
