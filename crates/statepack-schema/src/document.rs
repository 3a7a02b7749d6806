use crate::SchemaError;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Load a JSON document, requiring a top-level object.
pub fn load_document(path: &Path) -> Result<Value, SchemaError> {
    let content = fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| SchemaError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if !value.is_object() {
        return Err(SchemaError::NotAnObject(path.to_path_buf()));
    }
    Ok(value)
}

/// Write `value` as pretty JSON with a trailing newline.
///
/// The write goes through a temp file in the target directory and a rename,
/// so readers never observe a half-written document.
pub fn write_document(path: &Path, value: &impl Serialize) -> Result<(), SchemaError> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');

    let wrap = |source| SchemaError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(wrap)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(wrap)?;
    tmp.write_all(content.as_bytes()).map_err(wrap)?;
    tmp.as_file().sync_all().map_err(wrap)?;
    tmp.persist(path).map_err(|e| wrap(e.error))?;
    // Fsync parent directory to ensure rename durability on power loss.
    if let Ok(f) = fs::File::open(dir) {
        let _ = f.sync_all();
    }
    Ok(())
}
