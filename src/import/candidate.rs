//! Candidate discovery output: what we know about a file before deciding
//! whether to import it.
//!
//! Analysis runs in two phases. [`CandidateAnalyzer::inspect`] is synchronous
//! (file name classification, size, embedded tags) so whole directories can be
//! inspected on the rayon pool; the async phase then probes technical media
//! info and refines the quality with it.

use rayon::prelude::*;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::media_info::{MediaInfoModel, MediaInfoReader};
use crate::metadata::{self, AudioProperties, EmbeddedTags};
use crate::quality::{MediaFamily, QualityModel, TechnicalHints, parse_quality, refine_quality};

static MOVIE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<title>.+?)[\s(\[]+(?P<year>(?:19|20)\d{2})(?:[)\]\s]|$)")
        .expect("movie name regex")
});

static AUTHOR_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<author>.+?)\s+-\s+(?P<title>.+)$").expect("author title regex")
});

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[(][^\])]*[\])]").expect("bracket regex"));

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<num>\d{1,3})(?:\s*[.\-]\s*|\s+)").expect("leading number regex")
});

/// Family-specific descriptive tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaTags {
    Music {
        title: Option<String>,
        artist: Option<String>,
        album: Option<String>,
        track: Option<u32>,
    },
    Audiobook {
        title: Option<String>,
        author: Option<String>,
        narrator: Option<String>,
        chapter: Option<u32>,
    },
    Ebook {
        title: Option<String>,
        author: Option<String>,
    },
    Movie {
        title: Option<String>,
        year: Option<u32>,
    },
}

impl MediaTags {
    pub fn empty(family: MediaFamily) -> Self {
        match family {
            MediaFamily::Music => Self::Music {
                title: None,
                artist: None,
                album: None,
                track: None,
            },
            MediaFamily::Audiobook => Self::Audiobook {
                title: None,
                author: None,
                narrator: None,
                chapter: None,
            },
            MediaFamily::Ebook => Self::Ebook {
                title: None,
                author: None,
            },
            MediaFamily::Movie => Self::Movie {
                title: None,
                year: None,
            },
        }
    }

    /// Tags from embedded metadata, mapped by family convention.
    ///
    /// Audiobooks store the book title as album, the author as (album)
    /// artist, the narrator as composer and the chapter as track number.
    pub fn from_embedded(family: MediaFamily, tags: &EmbeddedTags) -> Self {
        match family {
            MediaFamily::Music => Self::Music {
                title: tags.title.clone(),
                artist: tags.album_artist.clone().or_else(|| tags.artist.clone()),
                album: tags.album.clone(),
                track: tags.track_number,
            },
            MediaFamily::Audiobook => Self::Audiobook {
                title: tags.album.clone().or_else(|| tags.title.clone()),
                author: tags.album_artist.clone().or_else(|| tags.artist.clone()),
                narrator: tags.composer.clone(),
                chapter: tags.track_number,
            },
            MediaFamily::Ebook => Self::Ebook {
                title: tags.title.clone(),
                author: tags.artist.clone(),
            },
            MediaFamily::Movie => Self::Movie {
                title: tags.title.clone(),
                year: tags.year,
            },
        }
    }

    /// Best-effort tags from the file name alone.
    pub fn from_file_name(family: MediaFamily, path: &Path) -> Self {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.replace('_', " "))
            .unwrap_or_default();

        match family {
            MediaFamily::Movie => {
                let spaced = stem.replace('.', " ");
                match MOVIE_NAME.captures(&spaced) {
                    Some(caps) => Self::Movie {
                        title: non_empty(&caps["title"]),
                        year: caps["year"].parse().ok(),
                    },
                    None => Self::Movie {
                        title: non_empty(&strip_release_tokens(&spaced)),
                        year: None,
                    },
                }
            }
            MediaFamily::Ebook => {
                let cleaned = strip_release_tokens(&stem);
                match AUTHOR_TITLE.captures(&cleaned) {
                    Some(caps) => Self::Ebook {
                        title: non_empty(&caps["title"]),
                        author: non_empty(&caps["author"]),
                    },
                    None => Self::Ebook {
                        title: non_empty(&cleaned),
                        author: None,
                    },
                }
            }
            MediaFamily::Music | MediaFamily::Audiobook => {
                let cleaned = strip_release_tokens(&stem);
                let (number, rest) = match LEADING_NUMBER.captures(&cleaned) {
                    Some(caps) => (
                        caps["num"].parse().ok(),
                        cleaned[caps.get(0).map_or(0, |m| m.end())..].to_string(),
                    ),
                    None => (None, cleaned.clone()),
                };
                let (artist, title) = match AUTHOR_TITLE.captures(&rest) {
                    Some(caps) => (non_empty(&caps["author"]), non_empty(&caps["title"])),
                    None => (None, non_empty(&rest)),
                };
                if family == MediaFamily::Music {
                    Self::Music {
                        title,
                        artist,
                        album: None,
                        track: number,
                    }
                } else {
                    Self::Audiobook {
                        title,
                        author: artist,
                        narrator: None,
                        chapter: number,
                    }
                }
            }
        }
    }

    /// Fill gaps in `self` from `fallback`.
    pub fn or(self, fallback: Self) -> Self {
        match (self, fallback) {
            (
                Self::Music {
                    title,
                    artist,
                    album,
                    track,
                },
                Self::Music {
                    title: t,
                    artist: a,
                    album: al,
                    track: tr,
                },
            ) => Self::Music {
                title: title.or(t),
                artist: artist.or(a),
                album: album.or(al),
                track: track.or(tr),
            },
            (
                Self::Audiobook {
                    title,
                    author,
                    narrator,
                    chapter,
                },
                Self::Audiobook {
                    title: t,
                    author: a,
                    narrator: n,
                    chapter: c,
                },
            ) => Self::Audiobook {
                title: title.or(t),
                author: author.or(a),
                narrator: narrator.or(n),
                chapter: chapter.or(c),
            },
            (Self::Ebook { title, author }, Self::Ebook { title: t, author: a }) => Self::Ebook {
                title: title.or(t),
                author: author.or(a),
            },
            (Self::Movie { title, year }, Self::Movie { title: t, year: y }) => Self::Movie {
                title: title.or(t),
                year: year.or(y),
            },
            (tags, _) => tags,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Music { title, .. }
            | Self::Audiobook { title, .. }
            | Self::Ebook { title, .. }
            | Self::Movie { title, .. } => title.as_deref(),
        }
    }

    /// Stable key identifying the media item these tags describe.
    ///
    /// `None` when the tags are too sparse to tell items apart.
    pub fn media_item_id(&self) -> Option<String> {
        let key = match self {
            Self::Music {
                title: Some(title),
                artist: Some(artist),
                album: Some(album),
                track,
            } => match track {
                Some(n) => format!("music:{artist}/{album}/{n:02}-{title}"),
                None => format!("music:{artist}/{album}/{title}"),
            },
            Self::Audiobook {
                title: Some(title),
                author: Some(author),
                chapter,
                ..
            } => match chapter {
                Some(n) => format!("audiobook:{author}/{title}/{n:03}"),
                None => format!("audiobook:{author}/{title}"),
            },
            Self::Ebook {
                title: Some(title),
                author: Some(author),
            } => format!("ebook:{author}/{title}"),
            Self::Movie {
                title: Some(title),
                year,
            } => match year {
                Some(y) => format!("movie:{title} ({y})"),
                None => format!("movie:{title}"),
            },
            _ => return None,
        };
        Some(normalize_key(&key))
    }
}

/// A file found on disk, not yet part of the library.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub family: MediaFamily,
    pub size: u64,
    pub quality: QualityModel,
    /// Stream properties from embedded headers (audio families)
    pub properties: AudioProperties,
    pub codec: Option<String>,
    pub tags: MediaTags,
    pub media_item_id: Option<String>,
    pub media_info: Option<MediaInfoModel>,
}

impl CandidateFile {
    /// A candidate classified from its path only.
    pub fn new(path: impl Into<PathBuf>, family: MediaFamily) -> Self {
        let path = path.into();
        let quality = parse_quality(family, &file_name_of(&path));
        let tags = MediaTags::from_file_name(family, &path);
        let media_item_id = tags.media_item_id();
        Self {
            path,
            family,
            size: 0,
            quality,
            properties: AudioProperties::default(),
            codec: None,
            tags,
            media_item_id,
            media_info: None,
        }
    }

    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }

    /// Lowercase extension without the dot.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
    }

    /// Audio stream count from probe data, else 0/1 from embedded properties.
    ///
    /// `None` when neither source said anything.
    pub fn audio_track_count(&self) -> Option<u32> {
        if let Some(info) = &self.media_info {
            return Some(info.audio_stream_count);
        }
        self.properties.channels.map(|c| u32::from(c > 0))
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim().trim_matches(|c: char| c == '-' || c == '.').trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn strip_release_tokens(stem: &str) -> String {
    BRACKETED
        .replace_all(stem, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Builds [`CandidateFile`]s from paths.
#[derive(Debug, Clone)]
pub struct CandidateAnalyzer {
    reader: MediaInfoReader,
}

impl CandidateAnalyzer {
    pub fn new(reader: MediaInfoReader) -> Self {
        Self { reader }
    }

    /// Synchronous analysis: name classification, size, embedded properties
    /// and tags. Unreadable tags leave name-derived values in place.
    pub fn inspect(path: &Path, family: MediaFamily) -> CandidateFile {
        let mut candidate = CandidateFile::new(path, family);
        candidate.size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        if family.expects_audio() && family != MediaFamily::Movie {
            match metadata::read(path) {
                Ok(meta) => {
                    candidate.properties = meta.properties;
                    candidate.quality =
                        refine_quality(candidate.quality, &meta.properties.technical_hints());
                    candidate.tags = MediaTags::from_embedded(family, &meta.tags)
                        .or(candidate.tags);
                    candidate.media_item_id = candidate.tags.media_item_id();
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "No embedded metadata");
                }
            }
        }

        candidate
    }

    /// Full analysis of one file.
    pub async fn analyze(
        &self,
        path: &Path,
        family: MediaFamily,
        cancel: &CancellationToken,
    ) -> Result<CandidateFile> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let owned = path.to_path_buf();
        let candidate = tokio::task::spawn_blocking(move || Self::inspect(&owned, family))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;
        Ok(self.enrich(candidate, cancel).await)
    }

    /// Analyze a batch. Synchronous inspection fans out over rayon; probing
    /// then runs per file. One output per input path, in input order.
    pub async fn analyze_all(
        &self,
        paths: Vec<PathBuf>,
        family: MediaFamily,
        cancel: &CancellationToken,
    ) -> Result<Vec<CandidateFile>> {
        let inspected = tokio::task::spawn_blocking(move || {
            paths
                .par_iter()
                .map(|p| Self::inspect(p, family))
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;

        let mut candidates = Vec::with_capacity(inspected.len());
        for candidate in inspected {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            candidates.push(self.enrich(candidate, cancel).await);
        }
        Ok(candidates)
    }

    async fn enrich(&self, mut candidate: CandidateFile, cancel: &CancellationToken) -> CandidateFile {
        if candidate.family == MediaFamily::Ebook {
            return candidate;
        }
        let Some(info) = self.reader.get_media_info(&candidate.path, cancel).await else {
            return candidate;
        };

        let hints = TechnicalHints {
            bit_depth: candidate.properties.bit_depth,
            sample_rate_hz: candidate
                .properties
                .sample_rate_hz
                .or((info.audio_sample_rate > 0).then_some(info.audio_sample_rate)),
            video_width: (info.width > 0).then_some(info.width),
            video_height: (info.height > 0).then_some(info.height),
        };
        candidate.quality = refine_quality(candidate.quality, &hints);
        candidate.codec = info
            .video_format
            .clone()
            .or_else(|| info.audio_format.clone());
        candidate.media_info = Some(info);
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_info::mocks::MockProbe;
    use crate::quality::{DetectionSource, Quality};
    use crate::test_utils::write_silent_wav;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_movie_name_tags() {
        let tags = MediaTags::from_file_name(
            MediaFamily::Movie,
            Path::new("/dl/The.Matrix.1999.1080p.BluRay.x264.mkv"),
        );
        assert_eq!(
            tags,
            MediaTags::Movie {
                title: Some("The Matrix".to_string()),
                year: Some(1999)
            }
        );
        assert_eq!(tags.media_item_id().as_deref(), Some("movie:the matrix (1999)"));
    }

    #[test]
    fn test_ebook_author_title() {
        let tags = MediaTags::from_file_name(
            MediaFamily::Ebook,
            Path::new("/dl/Ursula K. Le Guin - The Dispossessed [retail].epub"),
        );
        assert_eq!(tags.title(), Some("The Dispossessed"));
        assert_eq!(
            tags.media_item_id().as_deref(),
            Some("ebook:ursula k. le guin/the dispossessed")
        );
    }

    #[test]
    fn test_music_without_album_has_no_item_id() {
        let tags = MediaTags::from_file_name(
            MediaFamily::Music,
            Path::new("/dl/03 - Artist - Song Title [FLAC].flac"),
        );
        assert_eq!(tags.title(), Some("Song Title"));
        assert!(tags.media_item_id().is_none());
        if let MediaTags::Music { track, artist, .. } = &tags {
            assert_eq!(*track, Some(3));
            assert_eq!(artist.as_deref(), Some("Artist"));
        }
    }

    #[test]
    fn test_bracket_only_name_has_no_title() {
        let tags = MediaTags::from_file_name(MediaFamily::Music, Path::new("/dl/[FLAC].flac"));
        assert!(tags.title().is_none());
    }

    #[test]
    fn test_embedded_tags_win_over_name() {
        let embedded = EmbeddedTags {
            title: Some("Tagged".to_string()),
            artist: Some("Band".to_string()),
            album: Some("Record".to_string()),
            track_number: Some(7),
            ..Default::default()
        };
        let tags = MediaTags::from_embedded(MediaFamily::Music, &embedded).or(
            MediaTags::from_file_name(MediaFamily::Music, Path::new("/dl/01 - Other.flac")),
        );
        assert_eq!(tags.title(), Some("Tagged"));
        assert_eq!(tags.media_item_id().as_deref(), Some("music:band/record/07-tagged"));
    }

    #[test]
    fn test_audiobook_embedded_mapping() {
        let embedded = EmbeddedTags {
            title: Some("Chapter One".to_string()),
            album: Some("The Book".to_string()),
            album_artist: Some("The Author".to_string()),
            composer: Some("The Narrator".to_string()),
            track_number: Some(1),
            ..Default::default()
        };
        let tags = MediaTags::from_embedded(MediaFamily::Audiobook, &embedded);
        assert_eq!(tags.title(), Some("The Book"));
        assert_eq!(
            tags.media_item_id().as_deref(),
            Some("audiobook:the author/the book/001")
        );
    }

    #[test]
    fn test_audio_track_count_sources() {
        let mut candidate = CandidateFile::new("/dl/a.flac", MediaFamily::Music);
        assert_eq!(candidate.audio_track_count(), None);

        candidate.properties.channels = Some(0);
        assert_eq!(candidate.audio_track_count(), Some(0));

        candidate.media_info = Some(MediaInfoModel {
            audio_stream_count: 2,
            ..Default::default()
        });
        assert_eq!(candidate.audio_track_count(), Some(2));
    }

    #[test]
    fn test_inspect_refines_lossless_from_properties() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("track.wav");
        write_silent_wav(&path, 96_000, 24, 2, 960).unwrap();

        let candidate = CandidateAnalyzer::inspect(&path, MediaFamily::Music);
        assert_eq!(candidate.quality.quality, Quality::MusicWav24_96);
        assert_eq!(candidate.quality.source, DetectionSource::MediaInfo);
        assert!(candidate.size > 0);
        assert_eq!(candidate.properties.channels, Some(2));
    }

    #[tokio::test]
    async fn test_analyze_refines_movie_from_probe() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Some Film (2010).mkv");
        std::fs::write(&path, b"not really a movie").unwrap();

        let probe = MockProbe::with(
            &path,
            MediaInfoModel {
                width: 3840,
                height: 2160,
                video_format: Some("hevc".to_string()),
                audio_stream_count: 1,
                ..Default::default()
            },
        );
        let analyzer = CandidateAnalyzer::new(MediaInfoReader::new(Arc::new(probe)));
        let candidate = analyzer
            .analyze(&path, MediaFamily::Movie, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(candidate.quality.quality, Quality::MovieHdtv2160p);
        assert_eq!(candidate.codec.as_deref(), Some("hevc"));
        assert_eq!(candidate.media_item_id.as_deref(), Some("movie:some film (2010)"));
    }

    #[tokio::test]
    async fn test_analyze_all_preserves_order() {
        let dir = tempdir().unwrap();
        let paths: Vec<PathBuf> = (1..=3)
            .map(|i| {
                let p = dir.path().join(format!("Author - Book {i}.epub"));
                std::fs::write(&p, b"epub").unwrap();
                p
            })
            .collect();

        let analyzer = CandidateAnalyzer::new(MediaInfoReader::disabled());
        let candidates = analyzer
            .analyze_all(paths.clone(), MediaFamily::Ebook, &CancellationToken::new())
            .await
            .unwrap();

        let got: Vec<_> = candidates.iter().map(|c| c.path.clone()).collect();
        assert_eq!(got, paths);
        assert!(candidates.iter().all(|c| c.quality.quality == Quality::EbookEpub));
    }

    #[tokio::test]
    async fn test_analyze_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = CandidateAnalyzer::new(MediaInfoReader::disabled())
            .analyze(Path::new("/dl/a.flac"), MediaFamily::Music, &cancel)
            .await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
