use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

/// Resolved launch layout: where the server process runs from and how the
/// entrypoint is addressed from there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub project_dir: PathBuf,
    pub entrypoint: PathBuf,
    pub project_name: String,
}

/// Walk `root` for the first regular file ending in the platform suffix.
/// With multiple candidates the walk order's first hit wins; which one
/// that is for a given tree is deliberately unspecified.
///
/// # Errors
/// Returns an error when the walk finds no matching file.
pub fn find_entrypoint(root: &Path, suffix: &str) -> Result<PathBuf, String> {
    for entry in WalkDir::new(root).into_iter().flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().to_string_lossy().ends_with(suffix) {
            debug!("entrypoint: matched {}", entry.path().display());
            return std::path::absolute(entry.path())
                .map_err(|e| format!("failed to resolve entrypoint path: {e}"));
        }
    }
    Err("no entrypoint found".to_string())
}

/// Project name derived from the entrypoint's base filename: everything
/// before the first literal `Server`. `FooServer` yields `Foo`; a bare
/// `Server` yields the empty string.
pub fn project_name(entrypoint: &Path) -> String {
    let base = entrypoint
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match base.split_once("Server") {
        Some((prefix, _)) => prefix.to_string(),
        None => base,
    }
}

/// Compute the process working directory by ascending `depth` components
/// from the entrypoint, then normalize the entrypoint relative to it.
///
/// Release archives conventionally nest the binary four levels below the
/// project root; `depth` is overridable because a differently shaped tree
/// would otherwise silently mis-resolve.
pub fn resolve_layout(entrypoint: &Path, depth: usize) -> Layout {
    let name = project_name(entrypoint);

    let mut project_dir = entrypoint.to_path_buf();
    for _ in 0..depth {
        project_dir = project_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
    }
    if project_dir.as_os_str().is_empty() {
        project_dir = PathBuf::from(".");
    }

    let separators = entrypoint
        .to_string_lossy()
        .matches(std::path::MAIN_SEPARATOR)
        .count();
    let mut resolved = entrypoint.to_path_buf();
    if depth > 0 && separators > depth - 1 && !entrypoint.starts_with(&name) {
        if let Ok(relative) = entrypoint.strip_prefix(&project_dir) {
            resolved = relative.to_path_buf();
        }
    }

    Layout {
        project_dir,
        entrypoint: resolved,
        project_name: name,
    }
}
