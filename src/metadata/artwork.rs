//! Artwork extraction and copying
//!
//! Pictures are read from FLAC picture blocks, ID3v2 APIC frames or MP4
//! `covr` atoms, and written to the destination's primary tag.

use crate::error::{DrumlessError, ErrorContext, Result};
use crate::types::AudioFormat;
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Tag, TagType};
use std::path::Path;
use tracing::{debug, warn};

/// MIME type used when a picture's real type is unknown
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Open any supported container, sniffing the format from its content
pub(crate) fn open_tagged(path: &Path) -> Result<TaggedFile> {
    Probe::open(path)
        .with_file_context(path)?
        .guess_file_type()
        .with_file_context(path)?
        .read()
        .with_file_context(path)
}

/// Primary tag of `tagged`, created empty if the file has none
pub(crate) fn primary_tag_mut<'t>(tagged: &'t mut TaggedFile, path: &Path) -> Result<&'t mut Tag> {
    if tagged.primary_tag().is_none() {
        let tag_type = tagged.primary_tag_type();
        tagged.insert_tag(Tag::new(tag_type));
    }
    tagged
        .primary_tag_mut()
        .ok_or_else(|| DrumlessError::metadata(path, "file cannot hold tags"))
}

/// Remove every picture from a tag
pub fn clear_pictures(tag: &mut Tag) {
    while !tag.pictures().is_empty() {
        tag.remove_picture(0);
    }
}

/// Which tag carries artwork for a given source container
fn artwork_tag_type(format: AudioFormat) -> Option<TagType> {
    match format {
        AudioFormat::Flac => Some(TagType::VorbisComments),
        AudioFormat::Mp3 => Some(TagType::Id3v2),
        AudioFormat::M4a | AudioFormat::Mp4 | AudioFormat::Alac => Some(TagType::Mp4Ilst),
        AudioFormat::Wav => None,
    }
}

/// `covr` atoms carry no picture type or description; keep JPEG/PNG, treat
/// anything else as opaque data
fn mp4_cover(picture: &Picture) -> Picture {
    let mime = match picture.mime_type() {
        Some(MimeType::Jpeg) => MimeType::Jpeg,
        Some(MimeType::Png) => MimeType::Png,
        _ => MimeType::Unknown(OCTET_STREAM.to_string()),
    };
    Picture::new_unchecked(
        PictureType::CoverFront,
        Some(mime),
        Some("Cover".to_string()),
        picture.data().to_vec(),
    )
}

/// APIC frames may omit the MIME type
fn id3_picture(picture: &Picture) -> Picture {
    let mime = picture
        .mime_type()
        .cloned()
        .unwrap_or_else(|| MimeType::Unknown(OCTET_STREAM.to_string()));
    Picture::new_unchecked(
        picture.pic_type(),
        Some(mime),
        Some(picture.description().unwrap_or_default().to_string()),
        picture.data().to_vec(),
    )
}

fn read_pictures(source: &Path) -> Result<Vec<Picture>> {
    let Some(format) = AudioFormat::from_path(source) else {
        return Ok(Vec::new());
    };
    let Some(tag_type) = artwork_tag_type(format) else {
        debug!("{} carries no embedded artwork", format);
        return Ok(Vec::new());
    };

    let tagged = open_tagged(source)?;
    let Some(tag) = tagged.tag(tag_type) else {
        return Ok(Vec::new());
    };

    let pictures = tag.pictures().iter();
    let pictures = match format {
        AudioFormat::Mp3 => pictures.map(id3_picture).collect(),
        _ if format.is_mp4_family() => pictures.map(mp4_cover).collect(),
        _ => pictures.cloned().collect(),
    };
    Ok(pictures)
}

/// Extract all artwork from `source`
///
/// Unreadable files and containers without artwork yield an empty set.
pub fn extract_pictures(source: &Path) -> Vec<Picture> {
    match read_pictures(source) {
        Ok(pictures) => pictures,
        Err(e) => {
            warn!("Unable to extract artwork from {}: {}", source.display(), e);
            Vec::new()
        }
    }
}

/// Replace the artwork on `dest` with the artwork from `source`
///
/// Existing destination pictures are always cleared. Returns the number of
/// pictures copied, or `NoArtwork` when the source had none (the destination
/// is then left with zero pictures).
pub fn copy_artwork(source: &Path, dest: &Path) -> Result<usize> {
    let pictures = extract_pictures(source);
    let count = pictures.len();

    let mut tagged = open_tagged(dest)?;
    let tag = primary_tag_mut(&mut tagged, dest)?;
    clear_pictures(tag);
    for picture in pictures {
        tag.push_picture(picture);
    }
    tagged
        .save_to_path(dest, WriteOptions::default())
        .with_file_context(dest)?;

    if count == 0 {
        return Err(DrumlessError::NoArtwork(source.to_path_buf()));
    }

    debug!("Copied {} pictures to {}", count, dest.display());
    Ok(count)
}
