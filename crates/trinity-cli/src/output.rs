//! Writes a generated app to disk

use anyhow::{bail, Context, Result};
use std::path::{Component, Path, PathBuf};
use trinity_core::GeneratedApp;

/// Relative paths only, no parent traversal
fn checked(path: &str) -> Result<&Path> {
    let relative = Path::new(path);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        bail!("refusing to write outside the app directory: {}", path);
    }
    Ok(relative)
}

/// Write every file plus schema and docs under `<dir>/<app name>`
pub async fn write_app(app: &GeneratedApp, dir: &Path) -> Result<PathBuf> {
    let root = dir.join(checked(&app.name)?);

    let extras = [("schema.sql", &app.schema), ("DOCS.md", &app.docs)];
    let files = app
        .files
        .iter()
        .map(|(path, body)| (path.as_str(), body))
        .chain(extras.iter().filter(|(_, body)| !body.is_empty()).map(|(p, b)| (*p, *b)));

    for (path, body) in files {
        let target = root.join(checked(path)?);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        tokio::fs::write(&target, body)
            .await
            .with_context(|| format!("cannot write {}", target.display()))?;
    }

    Ok(root)
}
