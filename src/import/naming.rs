//! Destination path construction from per-family naming patterns.
//!
//! Pattern variables by family:
//! - music: `{Artist}`, `{Album}`, `{Title}`, `{TrackNum}`
//! - audiobook: `{Author}`, `{Title}`, `{Narrator}`, `{Chapter}`
//! - ebook: `{Author}`, `{Title}`
//! - movie: `{Title}`, `{Year}`
//!
//! Every family also gets `{Quality}` and `{ext}`. Values are sanitized
//! so a tag can never introduce a path separator.

use std::path::{Path, PathBuf};

use super::candidate::{CandidateFile, MediaTags};

/// Resolve `pattern` for a candidate under `library_root`.
pub fn destination_for(candidate: &CandidateFile, pattern: &str, library_root: &Path) -> PathBuf {
    let ext = candidate.extension().unwrap_or_else(|| "bin".to_string());
    let mut path = pattern.to_string();
    for (key, value) in placeholders(&candidate.tags) {
        path = path.replace(key, &sanitize_filename(&value));
    }
    let path = path
        .replace("{Quality}", &sanitize_filename(candidate.quality.quality.title()))
        .replace("{ext}", &ext);
    library_root.join(path)
}

fn placeholders(tags: &MediaTags) -> Vec<(&'static str, String)> {
    let or = |value: &Option<String>, fallback: &str| {
        value.clone().unwrap_or_else(|| fallback.to_string())
    };
    match tags {
        MediaTags::Music {
            title,
            artist,
            album,
            track,
        } => vec![
            ("{Artist}", or(artist, "Unknown Artist")),
            ("{Album}", or(album, "Unknown Album")),
            ("{Title}", or(title, "Unknown Title")),
            ("{TrackNum}", format!("{:02}", track.unwrap_or(0))),
        ],
        MediaTags::Audiobook {
            title,
            author,
            narrator,
            chapter,
        } => vec![
            ("{Author}", or(author, "Unknown Author")),
            ("{Title}", or(title, "Unknown Title")),
            ("{Narrator}", or(narrator, "Unknown Narrator")),
            ("{Chapter}", format!("{:02}", chapter.unwrap_or(0))),
        ],
        MediaTags::Ebook { title, author } => vec![
            ("{Author}", or(author, "Unknown Author")),
            ("{Title}", or(title, "Unknown Title")),
        ],
        MediaTags::Movie { title, year } => vec![
            ("{Title}", or(title, "Unknown Title")),
            (
                "{Year}",
                year.map(|y| y.to_string()).unwrap_or_else(|| "Unknown".to_string()),
            ),
        ],
    }
}

/// Sanitizes a path component by replacing invalid characters.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect();
    // Trailing dots and spaces are stripped by some filesystems
    let trimmed = replaced.trim().trim_end_matches('.').trim_end();
    match trimmed {
        "" | "." | ".." => "_".to_string(),
        s => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamingConfig;
    use crate::quality::{MediaFamily, Quality};
    use crate::test_utils::mock_candidate;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("AC/DC"), "AC_DC");
        assert_eq!(sanitize_filename("What?"), "What_");
        assert_eq!(sanitize_filename("Trailing..."), "Trailing");
        assert_eq!(sanitize_filename(".."), "_");
        assert_eq!(sanitize_filename("   "), "_");
        assert_eq!(sanitize_filename("Tab\tName"), "Tab_Name");
    }

    #[test]
    fn test_music_destination() {
        let mut candidate = mock_candidate("/dl/x.flac", Quality::MusicFlac16_44);
        candidate.tags = MediaTags::Music {
            title: Some("Back In Black".to_string()),
            artist: Some("AC/DC".to_string()),
            album: Some("Back In Black".to_string()),
            track: Some(6),
        };
        let dest = destination_for(
            &candidate,
            NamingConfig::default().pattern_for(MediaFamily::Music),
            Path::new("/library"),
        );
        assert_eq!(
            dest,
            PathBuf::from("/library/AC_DC/Back In Black/06 - Back In Black.flac")
        );
    }

    #[test]
    fn test_movie_destination_with_quality() {
        let mut candidate = mock_candidate("/dl/Film.2001.MKV", Quality::MovieBluray1080p);
        candidate.tags = MediaTags::Movie {
            title: Some("Film".to_string()),
            year: Some(2001),
        };
        let dest = destination_for(
            &candidate,
            "{Title} ({Year})/{Title} ({Year}) {Quality}.{ext}",
            Path::new("/movies"),
        );
        assert_eq!(
            dest,
            PathBuf::from("/movies/Film (2001)/Film (2001) Bluray-1080p.mkv")
        );
    }

    #[test]
    fn test_missing_tags_use_placeholders() {
        let mut candidate = mock_candidate("/dl/book.epub", Quality::EbookEpub);
        candidate.tags = MediaTags::empty(MediaFamily::Ebook);
        let dest = destination_for(&candidate, "{Author}/{Title}.{ext}", Path::new("/books"));
        assert_eq!(dest, PathBuf::from("/books/Unknown Author/Unknown Title.epub"));
    }
}
