use std::path::Path;

use walkdir::WalkDir;

use super::CollectionEntry;
use crate::errors::AppError;

/// Read every `.md` file under `dir` into a collection, sorted by path.
///
/// Unreadable files are skipped with a warning. A missing directory yields an
/// empty collection.
pub fn load_collection(dir: &Path) -> Result<Vec<CollectionEntry>, AppError> {
    if !dir.exists() {
        tracing::warn!("Document directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }
    if !dir.is_dir() {
        return Err(AppError::Config(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::warn!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
    {
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        match std::fs::read_to_string(entry.path()) {
            Ok(raw) => entries.push(CollectionEntry { path, raw }),
            Err(err) => tracing::warn!("Skipping {}: {}", entry.path().display(), err),
        }
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!("Loaded {} documents from {}", entries.len(), dir.display());
    Ok(entries)
}

/// Mirror one document into the local collection: write `raw`, or remove the
/// file when `raw` is `None`.
pub fn store_entry(dir: &Path, document_id: &str, raw: Option<&str>) -> Result<(), AppError> {
    let relative = Path::new(document_id);
    if relative.is_absolute()
        || relative
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)))
    {
        return Err(AppError::Validation(format!(
            "Invalid document path: {}",
            document_id
        )));
    }

    let target = dir.join(relative);
    match raw {
        Some(raw) => {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, raw)?;
        }
        None => match std::fs::remove_file(&target) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        },
    }
    Ok(())
}
