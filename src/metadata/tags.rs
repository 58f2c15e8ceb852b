//! Tag writing and cross-container tag mapping
//!
//! FLAC masters are tagged through their Vorbis comment block directly, so
//! free-form fields with no generic lofty key survive. MP3 derivatives are
//! tagged with ID3v2.4 frames written by `id3`, since their ReplayGain fields
//! live in `TXXX` frames keyed by description.

use super::artwork::{open_tagged, primary_tag_mut, OCTET_STREAM};
use crate::error::{DrumlessError, ErrorContext, Result};
use crate::types::{
    AudioFormat, SeparationModel, DRUMLESS_COMMENT, LOUDNESS_ALGORITHM, REFERENCE_LOUDNESS,
};
use id3::frame::{Comment, ExtendedText, Picture as Id3Picture, PictureType as Id3PictureType};
use id3::{TagLike, Version};
use lofty::config::{ParseOptions, WriteOptions};
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::flac::FlacFile;
use lofty::ogg::VorbisComments;
use lofty::picture::Picture;
use lofty::tag::{ItemKey, ItemValue, Tag, TagItem, TagType};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

pub const REPLAYGAIN_REFERENCE_LOUDNESS: &str = "REPLAYGAIN_REFERENCE_LOUDNESS";
pub const REPLAYGAIN_ALGORITHM: &str = "REPLAYGAIN_ALGORITHM";

/// Vorbis field → ID3v2 text frame for the fixed FLAC→MP3 mapping
const TEXT_FRAMES: [(&str, &str); 7] = [
    ("TITLE", "TIT2"),
    ("ALBUM", "TALB"),
    ("ARTIST", "TPE1"),
    ("ALBUMARTIST", "TPE2"),
    ("TRACKNUMBER", "TRCK"),
    ("GENRE", "TCON"),
    ("DATE", "TDRC"),
];

/// ReplayGain fields carried into `TXXX` frames
const REPLAYGAIN_FIELDS: [&str; 6] = [
    REPLAYGAIN_REFERENCE_LOUDNESS,
    "REPLAYGAIN_TRACK_GAIN",
    "REPLAYGAIN_TRACK_PEAK",
    "REPLAYGAIN_ALBUM_GAIN",
    "REPLAYGAIN_ALBUM_PEAK",
    REPLAYGAIN_ALGORITHM,
];

/// The two reference tags the ReplayGain scanner never writes itself
pub fn reference_tags() -> [(&'static str, String); 2] {
    [
        (REPLAYGAIN_REFERENCE_LOUDNESS, REFERENCE_LOUDNESS.to_string()),
        (REPLAYGAIN_ALGORITHM, LOUDNESS_ALGORITHM.to_string()),
    ]
}

/// Descriptive block stamped on every drumless master
pub fn drumless_tags(model: &SeparationModel) -> [(&'static str, String); 4] {
    let [loudness, algorithm] = reference_tags();
    [
        ("COMMENT", DRUMLESS_COMMENT.to_string()),
        ("DESCRIPTION", format!("Stem Separation Model = {}", model)),
        loudness,
        algorithm,
    ]
}

/// Set free-form fields on a file, replacing existing values
///
/// MP3 files get `TXXX` frames keyed by field name, FLAC files get Vorbis
/// comments, and other containers get whatever lofty can map. A field the
/// container cannot hold is an error.
pub fn set_tags(path: &Path, fields: &[(&str, String)]) -> Result<()> {
    match AudioFormat::from_path(path) {
        Some(AudioFormat::Mp3) => set_id3_user_text(path, fields),
        Some(AudioFormat::Flac) => set_vorbis_comments(path, fields),
        _ => set_native_tags(path, fields),
    }
}

/// Stamp `REPLAYGAIN_REFERENCE_LOUDNESS` and `REPLAYGAIN_ALGORITHM`
pub fn stamp_reference_tags(path: &Path) -> Result<()> {
    set_tags(path, &reference_tags())
}

fn read_flac(path: &Path) -> Result<FlacFile> {
    let mut file = File::open(path).with_file_context(path)?;
    FlacFile::read_from(&mut file, ParseOptions::new()).with_file_context(path)
}

/// First value of every Vorbis comment, keyed by upper-case field name
fn flac_fields(path: &Path) -> Result<HashMap<String, String>> {
    let flac = read_flac(path)?;
    let mut fields = HashMap::new();
    if let Some(comments) = flac.vorbis_comments() {
        for (key, value) in comments.items() {
            fields
                .entry(key.to_ascii_uppercase())
                .or_insert_with(|| value.to_string());
        }
    }
    Ok(fields)
}

fn set_vorbis_comments(path: &Path, fields: &[(&str, String)]) -> Result<()> {
    let mut flac = read_flac(path)?;
    if flac.vorbis_comments().is_none() {
        flac.set_vorbis_comments(VorbisComments::default());
    }
    let comments = flac
        .vorbis_comments_mut()
        .ok_or_else(|| DrumlessError::metadata(path, "no Vorbis comment block"))?;

    for (key, value) in fields {
        comments.insert(key.to_string(), value.clone());
    }

    flac.save_to_path(path, WriteOptions::default())
        .with_file_context(path)?;
    debug!("Wrote {} fields to {}", fields.len(), path.display());
    Ok(())
}

fn set_native_tags(path: &Path, fields: &[(&str, String)]) -> Result<()> {
    let mut tagged = open_tagged(path)?;
    let tag = primary_tag_mut(&mut tagged, path)?;

    for (key, value) in fields {
        let item_key = ItemKey::from_key(tag.tag_type(), key);
        if !tag.insert(TagItem::new(item_key, ItemValue::Text(value.clone()))) {
            return Err(DrumlessError::metadata(
                path,
                format!("{:?} tag cannot hold field {}", tag.tag_type(), key),
            ));
        }
    }

    tagged
        .save_to_path(path, WriteOptions::default())
        .with_file_context(path)?;
    debug!("Wrote {} fields to {}", fields.len(), path.display());
    Ok(())
}

fn read_id3(path: &Path) -> Result<id3::Tag> {
    match id3::Tag::read_from_path(path) {
        Ok(tag) => Ok(tag),
        Err(e) if matches!(e.kind, id3::ErrorKind::NoTag) => Ok(id3::Tag::new()),
        Err(e) => Err(DrumlessError::metadata(path, e.to_string())),
    }
}

fn write_id3(tag: &id3::Tag, path: &Path) -> Result<()> {
    tag.write_to_path(path, Version::Id3v24)
        .with_file_context(path)
}

fn set_id3_user_text(path: &Path, fields: &[(&str, String)]) -> Result<()> {
    let mut tag = read_id3(path)?;
    for (key, value) in fields {
        tag.add_frame(ExtendedText {
            description: key.to_string(),
            value: value.clone(),
        });
    }
    write_id3(&tag, path)
}

/// First value of every field in a tag, keyed by upper-case Vorbis name
pub fn vorbis_fields(tag: &Tag) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for item in tag.items() {
        let Some(key) = item.key().map_key(TagType::VorbisComments, true) else {
            continue;
        };
        let Some(value) = item.value().text() else {
            continue;
        };
        fields
            .entry(key.to_ascii_uppercase())
            .or_insert_with(|| value.to_string());
    }
    fields
}

fn id3_picture_type(picture: &Picture) -> Id3PictureType {
    match picture.pic_type().as_u8() {
        0 => Id3PictureType::Other,
        1 => Id3PictureType::Icon,
        2 => Id3PictureType::OtherIcon,
        3 => Id3PictureType::CoverFront,
        4 => Id3PictureType::CoverBack,
        5 => Id3PictureType::Leaflet,
        6 => Id3PictureType::Media,
        7 => Id3PictureType::LeadArtist,
        8 => Id3PictureType::Artist,
        9 => Id3PictureType::Conductor,
        10 => Id3PictureType::Band,
        11 => Id3PictureType::Composer,
        12 => Id3PictureType::Lyricist,
        13 => Id3PictureType::RecordingLocation,
        14 => Id3PictureType::DuringRecording,
        15 => Id3PictureType::DuringPerformance,
        16 => Id3PictureType::ScreenCapture,
        17 => Id3PictureType::BrightFish,
        18 => Id3PictureType::Illustration,
        19 => Id3PictureType::BandLogo,
        20 => Id3PictureType::PublisherLogo,
        n => Id3PictureType::Undefined(n),
    }
}

/// Add the fixed FLAC→MP3 frame set to `tag`
///
/// Fields missing from `fields` are skipped; nothing outside the fixed set
/// is carried over.
pub fn apply_id3_frames(
    tag: &mut id3::Tag,
    fields: &HashMap<String, String>,
    pictures: &[Picture],
) {
    for (field, frame_id) in TEXT_FRAMES {
        if let Some(value) = fields.get(field) {
            tag.set_text(frame_id, value.clone());
        }
    }

    if let Some(comment) = fields.get("COMMENT") {
        tag.add_frame(Comment {
            lang: "eng".to_string(),
            description: String::new(),
            text: comment.clone(),
        });
    }

    if let Some(compilation) = fields.get("COMPILATION") {
        tag.add_frame(ExtendedText {
            description: "COMPILATION".to_string(),
            value: compilation.clone(),
        });
    }

    for field in REPLAYGAIN_FIELDS {
        if let Some(value) = fields.get(field) {
            tag.add_frame(ExtendedText {
                description: field.to_string(),
                value: value.clone(),
            });
        }
    }

    for picture in pictures {
        tag.add_frame(Id3Picture {
            mime_type: picture
                .mime_type()
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| OCTET_STREAM.to_string()),
            picture_type: id3_picture_type(picture),
            description: picture.description().unwrap_or_default().to_string(),
            data: picture.data().to_vec(),
        });
    }
}

/// Map a FLAC master's tags and pictures onto an MP3's ID3v2 tag
pub fn copy_flac_tags_to_mp3(source: &Path, dest: &Path) -> Result<()> {
    let tagged = open_tagged(source)?;
    let source_tag = tagged
        .tag(TagType::VorbisComments)
        .or_else(|| tagged.primary_tag());

    let fields = match AudioFormat::from_path(source) {
        Some(AudioFormat::Flac) => flac_fields(source)?,
        _ => source_tag.map(vorbis_fields).unwrap_or_default(),
    };
    let pictures = source_tag
        .map(|t| t.pictures().to_vec())
        .unwrap_or_default();

    let mut tag = read_id3(dest)?;
    apply_id3_frames(&mut tag, &fields, &pictures);
    write_id3(&tag, dest)?;

    debug!(
        "Mapped {} fields and {} pictures onto {}",
        fields.len(),
        pictures.len(),
        dest.display()
    );
    Ok(())
}

/// Copy tags from `source` into `dest`, mapping across containers
pub fn copy_tags(source: &Path, dest: &Path) -> Result<()> {
    if AudioFormat::from_path(dest) == Some(AudioFormat::Mp3) {
        return copy_flac_tags_to_mp3(source, dest);
    }

    let fields = match AudioFormat::from_path(source) {
        Some(AudioFormat::Flac) => flac_fields(source)?,
        _ => open_tagged(source)?
            .primary_tag()
            .map(vorbis_fields)
            .unwrap_or_default(),
    };
    let fields: Vec<(String, String)> = fields.into_iter().collect();
    let fields: Vec<(&str, String)> = fields
        .iter()
        .map(|(k, v)| (k.as_str(), v.clone()))
        .collect();
    set_tags(dest, &fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lofty::picture::{MimeType, PictureType};
    use std::fs;
    use tempfile::TempDir;

    fn vorbis_tag(fields: &[(&str, &str)]) -> Tag {
        let mut tag = Tag::new(TagType::VorbisComments);
        for (key, value) in fields {
            let item_key = ItemKey::from_key(TagType::VorbisComments, key);
            tag.push_unchecked(TagItem::new(item_key, ItemValue::Text(value.to_string())));
        }
        tag
    }

    /// `fLaC` marker plus a lone STREAMINFO block: 44.1 kHz, stereo, 16 bit
    fn write_minimal_flac(path: &Path) {
        let mut bytes = b"fLaC".to_vec();
        bytes.extend_from_slice(&[0x80, 0x00, 0x00, 0x22]);
        bytes.extend_from_slice(&[0x10, 0x00, 0x10, 0x00]);
        bytes.extend_from_slice(&[0x00; 6]);
        bytes.extend_from_slice(&[0x0A, 0xC4, 0x42, 0xF0, 0x00, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(&[0x00; 16]);
        fs::write(path, bytes).unwrap();
    }

    fn flac_field(path: &Path, key: &str) -> Option<String> {
        let flac = read_flac(path).unwrap();
        flac.vorbis_comments()
            .and_then(|c| c.get(key))
            .map(str::to_string)
    }

    #[test]
    fn test_drumless_tag_block() {
        let tags = drumless_tags(&SeparationModel::HtDemucsFt);
        let map: HashMap<&str, &str> = tags.iter().map(|(k, v)| (*k, v.as_str())).collect();

        assert_eq!(map.len(), 4);
        assert_eq!(map["COMMENT"], "Drumless (Lossless)");
        assert_eq!(map["DESCRIPTION"], "Stem Separation Model = htdemucs_ft.yaml");
        assert_eq!(map["REPLAYGAIN_REFERENCE_LOUDNESS"], "-23 LUFS");
        assert_eq!(map["REPLAYGAIN_ALGORITHM"], "ITU-R BS.1770");
    }

    #[test]
    fn test_vorbis_fields_upper_cases_keys() {
        let tag = vorbis_tag(&[
            ("TITLE", "Song"),
            ("ALBUMARTIST", "Band"),
            ("REPLAYGAIN_REFERENCE_LOUDNESS", "-23 LUFS"),
        ]);
        let fields = vorbis_fields(&tag);
        assert_eq!(fields.get("TITLE").map(String::as_str), Some("Song"));
        assert_eq!(fields.get("ALBUMARTIST").map(String::as_str), Some("Band"));
        assert_eq!(
            fields.get("REPLAYGAIN_REFERENCE_LOUDNESS").map(String::as_str),
            Some("-23 LUFS")
        );
    }

    #[test]
    fn test_apply_id3_frames_maps_fixed_set() {
        let fields: HashMap<String, String> = [
            ("TITLE", "Song"),
            ("ALBUM", "Record"),
            ("ARTIST", "Band"),
            ("TRACKNUMBER", "3"),
            ("DATE", "1999"),
            ("COMMENT", "Drumless (Lossless)"),
            ("COMPILATION", "1"),
            ("REPLAYGAIN_TRACK_GAIN", "-4.20 dB"),
            ("LYRICIST", "dropped"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let pictures = vec![Picture::new_unchecked(
            PictureType::CoverFront,
            Some(MimeType::Jpeg),
            None,
            vec![1, 2, 3],
        )];

        let mut tag = id3::Tag::new();
        apply_id3_frames(&mut tag, &fields, &pictures);

        assert_eq!(tag.title(), Some("Song"));
        assert_eq!(tag.album(), Some("Record"));
        assert_eq!(tag.artist(), Some("Band"));
        assert_eq!(tag.album_artist(), None);
        assert_eq!(tag.get("TRCK").and_then(|f| f.content().text()), Some("3"));
        assert_eq!(tag.get("TDRC").and_then(|f| f.content().text()), Some("1999"));
        assert!(tag.get("TCON").is_none());
        assert_eq!(tag.comments().next().map(|c| c.text.as_str()), Some("Drumless (Lossless)"));

        let user_text: HashMap<&str, &str> = tag
            .extended_texts()
            .map(|t| (t.description.as_str(), t.value.as_str()))
            .collect();
        assert_eq!(user_text.get("COMPILATION"), Some(&"1"));
        assert_eq!(user_text.get("REPLAYGAIN_TRACK_GAIN"), Some(&"-4.20 dB"));
        assert!(!user_text.contains_key("LYRICIST"));

        let apic: Vec<_> = tag.pictures().collect();
        assert_eq!(apic.len(), 1);
        assert_eq!(apic[0].mime_type, "image/jpeg");
        assert_eq!(apic[0].picture_type, Id3PictureType::CoverFront);
        assert_eq!(apic[0].data, vec![1, 2, 3]);
    }

    #[test]
    fn test_stamp_reference_tags_on_mp3() {
        let dir = TempDir::new().unwrap();
        let mp3 = dir.path().join("a.mp3");
        fs::write(&mp3, [0xFFu8, 0xFB, 0x90, 0x00]).unwrap();

        stamp_reference_tags(&mp3).unwrap();
        // Restamping replaces rather than duplicates
        stamp_reference_tags(&mp3).unwrap();

        let tag = id3::Tag::read_from_path(&mp3).unwrap();
        let user_text: Vec<(&str, &str)> = tag
            .extended_texts()
            .map(|t| (t.description.as_str(), t.value.as_str()))
            .collect();
        assert_eq!(user_text.len(), 2);
        assert!(user_text.contains(&("REPLAYGAIN_REFERENCE_LOUDNESS", "-23 LUFS")));
        assert!(user_text.contains(&("REPLAYGAIN_ALGORITHM", "ITU-R BS.1770")));
    }

    #[test]
    fn test_drumless_block_written_to_flac() {
        let dir = TempDir::new().unwrap();
        let flac = dir.path().join("Song - Drumless.flac");
        write_minimal_flac(&flac);

        set_tags(&flac, &drumless_tags(&SeparationModel::BsRoformerSw)).unwrap();

        assert_eq!(
            flac_field(&flac, "COMMENT").as_deref(),
            Some("Drumless (Lossless)")
        );
        assert_eq!(
            flac_field(&flac, "DESCRIPTION").as_deref(),
            Some("Stem Separation Model = BS-Roformer-SW.ckpt")
        );
        assert_eq!(
            flac_field(&flac, "REPLAYGAIN_REFERENCE_LOUDNESS").as_deref(),
            Some("-23 LUFS")
        );
        assert_eq!(
            flac_field(&flac, "REPLAYGAIN_ALGORITHM").as_deref(),
            Some("ITU-R BS.1770")
        );
    }

    #[test]
    fn test_stamp_reference_tags_on_flac_replaces() {
        let dir = TempDir::new().unwrap();
        let flac = dir.path().join("a.flac");
        write_minimal_flac(&flac);

        set_tags(&flac, &[(REPLAYGAIN_ALGORITHM, "stale".to_string())]).unwrap();
        stamp_reference_tags(&flac).unwrap();
        stamp_reference_tags(&flac).unwrap();

        let flac_file = read_flac(&flac).unwrap();
        let comments = flac_file.vorbis_comments().unwrap();
        let algorithms: Vec<&str> = comments.get_all(REPLAYGAIN_ALGORITHM).collect();
        assert_eq!(algorithms, vec!["ITU-R BS.1770"]);
        assert_eq!(comments.get_all(REPLAYGAIN_REFERENCE_LOUDNESS).count(), 1);
    }

    #[test]
    fn test_flac_reference_tags_reach_mp3() {
        let dir = TempDir::new().unwrap();
        let flac = dir.path().join("a.flac");
        let mp3 = dir.path().join("a.mp3");
        write_minimal_flac(&flac);
        fs::write(&mp3, [0xFFu8, 0xFB, 0x90, 0x00]).unwrap();

        set_tags(
            &flac,
            &[
                ("TITLE", "Song".to_string()),
                (REPLAYGAIN_REFERENCE_LOUDNESS, "-23 LUFS".to_string()),
            ],
        )
        .unwrap();
        copy_tags(&flac, &mp3).unwrap();

        let tag = id3::Tag::read_from_path(&mp3).unwrap();
        assert_eq!(tag.title(), Some("Song"));
        assert!(tag
            .extended_texts()
            .any(|t| t.description == REPLAYGAIN_REFERENCE_LOUDNESS && t.value == "-23 LUFS"));
    }

    #[test]
    fn test_set_tags_on_unreadable_flac_is_metadata_error() {
        let dir = TempDir::new().unwrap();
        let flac = dir.path().join("a.flac");
        fs::write(&flac, b"garbage").unwrap();

        let err = set_tags(&flac, &reference_tags()).unwrap_err();
        assert!(matches!(err, DrumlessError::Metadata { .. }));
    }

    #[test]
    fn test_copy_from_missing_source_is_metadata_error() {
        let dir = TempDir::new().unwrap();
        let err = copy_tags(&dir.path().join("missing.flac"), &dir.path().join("a.mp3"))
            .unwrap_err();
        assert!(matches!(err, DrumlessError::Metadata { .. }));
    }
}
