use std::path::Path;

use tokio::fs;

use crate::error::EngineError;

/// Contents of `path`, or `None` when the file does not exist.
pub(crate) async fn read_optional(path: &Path) -> Result<Option<String>, EngineError> {
    match fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(EngineError::io(path)(e)),
    }
}

/// Replace `path` with `contents` via a sibling temp file and a rename.
pub(crate) async fn write_atomic(path: &Path, contents: &str) -> Result<(), EngineError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .map_err(EngineError::io(parent))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, contents)
        .await
        .map_err(EngineError::io(&tmp))?;
    fs::rename(&tmp, path).await.map_err(EngineError::io(path))
}
