use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// I/O utility functions.
pub struct IOUtil;

impl IOUtil {
    /// Serialize a value as pretty JSON and write it to a file.
    ///
    /// The file is replaced atomically: the JSON goes to a sibling temp file
    /// which is then renamed over the target, so readers never observe a
    /// half-written document.
    pub fn save_object<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        Self::replace_file(path, json.as_bytes())
    }

    /// Write `contents` to `path` via a temp file + rename.
    pub fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory '{}'", parent.display())
                })?;
            }
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = Path::new(&tmp_name);

        fs::write(tmp_path, contents)
            .with_context(|| format!("Failed to write '{}'", tmp_path.display()))?;
        fs::rename(tmp_path, path).with_context(|| {
            format!(
                "Failed to move '{}' over '{}'",
                tmp_path.display(),
                path.display()
            )
        })?;
        Ok(())
    }
}
