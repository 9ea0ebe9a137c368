//! Input discovery.

use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A file to embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFile {
    /// Resource name, `/`-separated.
    pub name: String,
    /// Where the bytes are read from.
    pub path: PathBuf,
}

/// Collect the files named by `inputs`.
///
/// A file input is named by its file name. Directories are only walked with
/// `recurse`, and their files are named by their path below the directory.
/// The result is sorted by name; a name seen twice keeps its first path.
pub fn scan(
    inputs: &[PathBuf],
    recurse: bool,
    filter: Option<&Pattern>,
) -> io::Result<Vec<ResourceFile>> {
    let mut found = Vec::new();

    for input in inputs {
        let meta = fs::metadata(input)?;
        if meta.is_dir() {
            if !recurse {
                warn!(path = %input.display(), "skipping directory (use --recurse)");
                continue;
            }
            walk(input, input, &mut found)?;
        } else {
            let name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| input.to_string_lossy().into_owned());
            found.push(ResourceFile {
                name,
                path: input.clone(),
            });
        }
    }

    if let Some(pattern) = filter {
        found.retain(|r| {
            let keep = pattern.matches(&r.name);
            if !keep {
                debug!(name = %r.name, "filtered out");
            }
            keep
        });
    }

    // Stable sort keeps the first path for a duplicated name at the front.
    found.sort_by(|a, b| a.name.cmp(&b.name));
    found.dedup_by(|later, first| {
        let duplicate = later.name == first.name;
        if duplicate {
            warn!(
                name = %later.name,
                kept = %first.path.display(),
                ignored = %later.path.display(),
                "duplicate resource name"
            );
        }
        duplicate
    });

    Ok(found)
}

fn walk(root: &Path, dir: &Path, found: &mut Vec<ResourceFile>) -> io::Result<()> {
    let mut open = vec![fs::canonicalize(dir)?];
    walk_into(root, dir, &mut open, found)
}

/// Symlinks are followed; `open` holds the canonical directories being walked.
fn walk_into(
    root: &Path,
    dir: &Path,
    open: &mut Vec<PathBuf>,
    found: &mut Vec<ResourceFile>,
) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.exists() {
            warn!(path = %path.display(), "skipping dangling symlink");
            continue;
        }
        if path.is_dir() {
            let real = fs::canonicalize(&path)?;
            if open.contains(&real) {
                warn!(path = %path.display(), "skipping symlink loop");
                continue;
            }
            open.push(real);
            walk_into(root, &path, open, found)?;
            open.pop();
        } else {
            found.push(ResourceFile {
                name: relative_name(root, &path),
                path,
            });
        }
    }
    Ok(())
}

/// `path` below `root`, joined with `/`.
fn relative_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
