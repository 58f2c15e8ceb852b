//! Metadata propagation
//!
//! Uses lofty to read FLAC, MP3 and MP4 tags and artwork and to write FLAC
//! masters; MP3 derivatives are written with ID3v2.4 frames.

pub mod artwork;
pub mod tags;

pub use artwork::{copy_artwork, extract_pictures};
pub use tags::{
    copy_flac_tags_to_mp3, copy_tags, drumless_tags, set_tags, stamp_reference_tags,
};
