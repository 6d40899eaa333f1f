//! Candidate discovery.

use futures::stream::Stream;
use std::path::PathBuf;
use tokio::sync::mpsc;
use walkdir::WalkDir;

use crate::quality::MediaFamily;

/// Scans the given root directory recursively for files of one media family.
///
/// Extensions are matched case-insensitively against
/// [`MediaFamily::extensions`]; dotfiles are skipped.
/// Returns a Stream of PathBufs.
pub fn scan(root: PathBuf, family: MediaFamily) -> impl Stream<Item = PathBuf> {
    let (tx, rx) = mpsc::channel(100);

    tokio::task::spawn_blocking(move || {
        let files = WalkDir::new(&root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| !is_hidden(e.file_name()));

        for entry in files {
            if family.is_supported_path(entry.path()) {
                // Receiver dropped: stop walking
                if tx.blocking_send(entry.into_path()).is_err() {
                    break;
                }
            }
        }
    });

    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|path| (path, rx))
    })
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}
