use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::RenderError;

/// Write `bytes` to `path` without ever exposing a half-written file.
///
/// The data goes to a sibling temporary file first and is renamed over the
/// target once fully flushed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    let tmp = temp_path(path);
    let write_err = |source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    };

    let result = (|| {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e));
    }

    log::info!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.partial", std::process::id()));
    path.with_file_name(name)
}
