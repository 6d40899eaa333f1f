//! Mount inspection.

use std::io;
use std::path::{Path, PathBuf};

/// The mount a path lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    pub root: PathBuf,
    pub fs_type: String,
}

pub trait MountProvider: Send + Sync {
    /// Mount containing `path`, or `None` when it cannot be determined.
    fn get_mount(&self, path: &Path) -> io::Result<Option<MountInfo>>;
}

const PROC_MOUNTS: &str = "/proc/self/mounts";

/// Reads the kernel mount table (`/proc/self/mounts` format).
///
/// Where the table doesn't exist (non-Linux), every lookup is `None`.
#[derive(Debug, Clone)]
pub struct ProcMountTable {
    table: PathBuf,
}

impl Default for ProcMountTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcMountTable {
    pub fn new() -> Self {
        Self::from_file(PROC_MOUNTS)
    }

    pub fn from_file(table: impl Into<PathBuf>) -> Self {
        Self {
            table: table.into(),
        }
    }
}

impl MountProvider for ProcMountTable {
    fn get_mount(&self, path: &Path) -> io::Result<Option<MountInfo>> {
        let contents = match std::fs::read_to_string(&self.table) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let resolved = resolve_existing(path)?;
        Ok(longest_match(&parse_mounts(&contents), &resolved))
    }
}

/// Parse mount table lines: `device mountpoint fstype options dump pass`.
pub fn parse_mounts(contents: &str) -> Vec<MountInfo> {
    contents
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _device = fields.next()?;
            let root = fields.next()?;
            let fs_type = fields.next()?;
            Some(MountInfo {
                root: PathBuf::from(unescape_octal(root)),
                fs_type: fs_type.to_string(),
            })
        })
        .collect()
}

/// Decode `\040`-style escapes the kernel uses for whitespace in paths.
fn unescape_octal(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = (bytes[i] == b'\\' && i + 3 < bytes.len())
            .then(|| &bytes[i + 1..=i + 3])
            .filter(|digits| digits.iter().all(|b| (b'0'..=b'7').contains(b)))
            .and_then(|digits| {
                let code = digits
                    .iter()
                    .fold(0u16, |acc, d| acc * 8 + u16::from(d - b'0'));
                u8::try_from(code).ok()
            });
        if let Some(code) = escaped {
            out.push(code);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Canonicalize the nearest existing ancestor and re-append the rest, so
/// destinations that don't exist yet still resolve to a mount.
fn resolve_existing(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        match existing.canonicalize() {
            Ok(canonical) => {
                let mut resolved = canonical;
                for part in missing.iter().rev() {
                    resolved.push(part);
                }
                return Ok(resolved);
            }
            Err(_) => match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name.to_os_string());
                    existing = parent;
                }
                _ => return Ok(absolute),
            },
        }
    }
}

fn longest_match(mounts: &[MountInfo], path: &Path) -> Option<MountInfo> {
    mounts
        .iter()
        .filter(|m| path.starts_with(&m.root))
        .max_by_key(|m| m.root.components().count())
        .cloned()
}
