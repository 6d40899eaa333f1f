//! Quality classification.
//!
//! Detects a ranked [`Quality`] for a media file from its name and
//! extension, and compares qualities for upgrade decisions.
//!
//! # Overview
//!
//! - [`Quality`]: closed taxonomy with an explicit rank per family ladder
//! - [`QualityModel`]: quality + revision + detection source
//! - [`parse_quality`]: name/extension heuristics, never fails
//! - [`refine_quality`]: upgrade extension defaults from embedded properties
//! - [`is_upgrade`], [`is_upgrade_with_cutoff`], [`better_quality`]
//!
//! # Example
//!
//! ```ignore
//! use media_intake::quality::{MediaFamily, Quality, parse_quality};
//!
//! let model = parse_quality(MediaFamily::Music, "Artist - Album [FLAC 24-192].flac");
//! assert_eq!(model.quality, Quality::MusicFlac24_192);
//! ```

mod comparer;
mod parser;
mod types;

pub use types::{
    DetectionSource, LosslessFormat, LosslessTier, MediaFamily, Quality, QualityModel, Revision,
    UnknownQualityId,
};

pub use parser::{
    TechnicalHints, dsd_quality_for_sample_rate, parse_audiobook_quality, parse_ebook_quality,
    parse_movie_quality, parse_music_quality, parse_quality, parse_revision, refine_quality,
};

pub use comparer::{better_quality, compare, is_upgrade, is_upgrade_with_cutoff};
