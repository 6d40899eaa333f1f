//! Transfer strategy selection from filesystem topology.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::mount::{MountInfo, MountProvider};

/// Filesystem types where hardlinks are unreliable or unsupported.
pub const NETWORK_FILESYSTEMS: &[&str] = &["cifs", "smb", "smbfs", "smb3", "nfs", "nfs4"];

/// Copy-on-write filesystems where links across directories are cheap.
pub const COW_FILESYSTEMS: &[&str] = &["btrfs", "zfs", "apfs"];

/// How the user wants a file placed in the library.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FileStrategy {
    Hardlink,
    Copy,
    Move,
    Symlink,
}

impl FileStrategy {
    /// The mode the executor is asked for. Hardlinks silently degrade to
    /// copies across filesystem boundaries.
    pub fn transfer_mode(self) -> TransferMode {
        match self {
            Self::Hardlink => TransferMode::HARDLINK_OR_COPY,
            Self::Copy => TransferMode::COPY,
            Self::Move => TransferMode::MOVE,
            Self::Symlink => TransferMode::SYMLINK,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hardlink => "hardlink",
            Self::Copy => "copy",
            Self::Move => "move",
            Self::Symlink => "symlink",
        }
    }
}

impl fmt::Display for FileStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Execution-level transfer mode: requested of, and reported by, the
    /// transfer executor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TransferMode: u8 {
        const HARDLINK = 0b0001;
        const COPY = 0b0010;
        const MOVE = 0b0100;
        const SYMLINK = 0b1000;
        const HARDLINK_OR_COPY = Self::HARDLINK.bits() | Self::COPY.bits();
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        f.write_str(&names.join("|").to_lowercase())
    }
}

fn normalize_fs(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    lower
        .strip_prefix("fuse.")
        .map(str::to_string)
        .unwrap_or(lower)
}

pub fn is_network_filesystem(fs_type: &str) -> bool {
    NETWORK_FILESYSTEMS.contains(&normalize_fs(fs_type).as_str())
}

pub fn is_cow_filesystem(fs_type: &str) -> bool {
    COW_FILESYSTEMS.contains(&normalize_fs(fs_type).as_str())
}

/// Pure strategy decision.
///
/// An explicit preference always wins. Otherwise: same mount → hardlink;
/// network source → copy; copy-on-write source → hardlink; anything else,
/// including unknown mounts → hardlink.
pub fn choose_strategy(
    same_mount: bool,
    source_fs: Option<&str>,
    _dest_fs: Option<&str>,
    preferred: Option<FileStrategy>,
) -> FileStrategy {
    if let Some(preferred) = preferred {
        return preferred;
    }
    if same_mount {
        return FileStrategy::Hardlink;
    }
    match source_fs {
        Some(fs) if is_network_filesystem(fs) => FileStrategy::Copy,
        Some(fs) if is_cow_filesystem(fs) => FileStrategy::Hardlink,
        _ => FileStrategy::Hardlink,
    }
}

/// Resolves mounts for both paths and applies [`choose_strategy`].
#[derive(Clone)]
pub struct StrategySelector {
    mounts: Arc<dyn MountProvider>,
}

impl StrategySelector {
    pub fn new(mounts: Arc<dyn MountProvider>) -> Self {
        Self { mounts }
    }

    pub fn select(
        &self,
        source: &Path,
        destination: &Path,
        preferred: Option<FileStrategy>,
    ) -> FileStrategy {
        if let Some(preferred) = preferred {
            tracing::debug!(strategy = %preferred, "Using preferred transfer strategy");
            return preferred;
        }

        let source_mount = self.lookup(source);
        let dest_mount = self.lookup(destination);

        let same_mount = matches!(
            (&source_mount, &dest_mount),
            (Some(s), Some(d)) if s.root == d.root
        );
        let strategy = choose_strategy(
            same_mount,
            source_mount.as_ref().map(|m| m.fs_type.as_str()),
            dest_mount.as_ref().map(|m| m.fs_type.as_str()),
            None,
        );

        tracing::debug!(
            source_fs = source_mount.as_ref().map(|m| m.fs_type.as_str()).unwrap_or("unknown"),
            dest_fs = dest_mount.as_ref().map(|m| m.fs_type.as_str()).unwrap_or("unknown"),
            same_mount,
            strategy = %strategy,
            "Selected transfer strategy"
        );
        strategy
    }

    fn lookup(&self, path: &Path) -> Option<MountInfo> {
        match self.mounts.get_mount(path) {
            Ok(mount) => mount,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Mount lookup failed");
                None
            }
        }
    }
}

impl fmt::Debug for StrategySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategySelector").finish_non_exhaustive()
    }
}


/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_fs() -> impl Strategy<Value = Option<String>> {
        prop::option::of(prop::sample::select(vec![
            "ext4".to_string(),
            "xfs".to_string(),
            "cifs".to_string(),
            "nfs".to_string(),
            "btrfs".to_string(),
            "zfs".to_string(),
            "tmpfs".to_string(),
        ]))
    }

    fn any_preference() -> impl Strategy<Value = Option<FileStrategy>> {
        prop::option::of(prop::sample::select(vec![
            FileStrategy::Hardlink,
            FileStrategy::Copy,
            FileStrategy::Move,
            FileStrategy::Symlink,
        ]))
    }

    proptest! {
        /// Selection is a pure function of its inputs
        #[test]
        fn choose_is_deterministic(
            same in any::<bool>(),
            src in any_fs(),
            dst in any_fs(),
            pref in any_preference(),
        ) {
            let a = choose_strategy(same, src.as_deref(), dst.as_deref(), pref);
            let b = choose_strategy(same, src.as_deref(), dst.as_deref(), pref);
            prop_assert_eq!(a, b);
        }

        /// Without a preference, only hardlink or copy is ever chosen
        #[test]
        fn automatic_choice_never_moves(same in any::<bool>(), src in any_fs(), dst in any_fs()) {
            let choice = choose_strategy(same, src.as_deref(), dst.as_deref(), None);
            prop_assert!(matches!(choice, FileStrategy::Hardlink | FileStrategy::Copy));
        }
    }
}
