//! core/tags/art.rs
//! Embedded cover art for a single file handle.
//!
//! Synchronous and standalone: no queue, no workers. Tag storage comes in a
//! few flavors, each with its own picture convention; `TagContainer` names
//! them and `extract_first_image` knows where each keeps its pictures.

use std::io::{Seek, SeekFrom};

use id3::frame::Content;
use symphonia::core::codecs::{
    CODEC_TYPE_AAC, CODEC_TYPE_ALAC, CODEC_TYPE_FLAC, CODEC_TYPE_OPUS, CODEC_TYPE_VORBIS, CodecType,
};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardVisualKey};
use symphonia::core::probe::Hint;
use tracing::debug;

use super::super::handles::HandleSource;
use super::super::types::FileTask;

/// One embedded picture pulled out of a comment/item based tag.
#[derive(Debug, Clone)]
pub struct Picture {
    pub front_cover: bool,
    pub data: Vec<u8>,
}

/// The tag storage conventions we know how to pull pictures from.
#[derive(Debug)]
pub enum TagContainer {
    /// ID3v2: attached picture frames (APIC / PIC).
    FrameBased(id3::Tag),
    /// FLAC / Vorbis / Opus: picture blocks next to the Vorbis comment.
    CommentBased(Vec<Picture>),
    /// MP4: the `covr` item of the item list.
    ItemMapBased(Vec<Picture>),
}

impl TagContainer {
    pub fn extract_first_image(&self) -> Option<Vec<u8>> {
        match self {
            TagContainer::FrameBased(tag) => tag.frames().find_map(|f| {
                if f.id() != "APIC" && f.id() != "PIC" {
                    return None;
                }
                match f.content() {
                    Content::Picture(p) => Some(p.data.clone()),
                    _ => None,
                }
            }),
            TagContainer::CommentBased(pictures) => pictures
                .iter()
                .find(|p| p.front_cover)
                .or_else(|| pictures.first())
                .map(|p| p.data.clone()),
            TagContainer::ItemMapBased(pictures) => pictures.first().map(|p| p.data.clone()),
        }
    }

    /// Figure out which tag flavor the file behind `task` carries.
    ///
    /// `None` when the file can't be opened, doesn't decode, or carries no tag
    /// we know how to read pictures from.
    pub fn read(handles: &dyn HandleSource, task: FileTask) -> Option<TagContainer> {
        let mut file = handles.open(task).ok()?;

        // ID3v2 sits in front of MPEG audio (and inside some WAV/AIFF files).
        if let Ok(tag) = id3::Tag::read_from2(&mut file) {
            return Some(TagContainer::FrameBased(tag));
        }
        file.seek(SeekFrom::Start(0)).ok()?;

        let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());
        let mut hint = Hint::new();
        if let Some(path) = handles.resolve_path(task) {
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                hint.with_extension(ext);
            }
        }

        let mut probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .ok()?;

        let codec = probed.format.default_track()?.codec_params.codec;

        let mut pictures = Vec::new();
        if let Some(rev) = probed.format.metadata().current() {
            collect_pictures(rev, &mut pictures);
        }
        if let Some(leading) = probed.metadata.get() {
            if let Some(rev) = leading.current() {
                collect_pictures(rev, &mut pictures);
            }
        }

        classify(codec, pictures)
    }
}

fn classify(codec: CodecType, pictures: Vec<Picture>) -> Option<TagContainer> {
    match codec {
        CODEC_TYPE_FLAC | CODEC_TYPE_VORBIS | CODEC_TYPE_OPUS => {
            Some(TagContainer::CommentBased(pictures))
        }
        CODEC_TYPE_AAC | CODEC_TYPE_ALAC => Some(TagContainer::ItemMapBased(pictures)),
        _ => None,
    }
}

fn collect_pictures(rev: &MetadataRevision, out: &mut Vec<Picture>) {
    for visual in rev.visuals() {
        out.push(Picture {
            front_cover: visual.usage == Some(StandardVisualKey::FrontCover),
            data: visual.data.to_vec(),
        });
    }
}

/// Raw bytes of the first embedded image, or empty if there is none.
pub fn read_cover_art(handles: &dyn HandleSource, task: FileTask) -> Vec<u8> {
    let image = TagContainer::read(handles, task).and_then(|c| c.extract_first_image());
    debug!(fd = %task, bytes = image.as_ref().map_or(0, Vec::len), "cover art lookup");
    image.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use id3::TagLike;
    use id3::frame::{Picture as Id3Picture, PictureType};

    fn picture(front_cover: bool, byte: u8) -> Picture {
        Picture {
            front_cover,
            data: vec![byte; 4],
        }
    }

    #[test]
    fn test_comment_based_prefers_front_cover() {
        let container = TagContainer::CommentBased(vec![picture(false, 1), picture(true, 2)]);
        assert_eq!(container.extract_first_image(), Some(vec![2; 4]));
    }

    #[test]
    fn test_item_map_takes_first_entry() {
        let container = TagContainer::ItemMapBased(vec![picture(false, 7), picture(true, 8)]);
        assert_eq!(container.extract_first_image(), Some(vec![7; 4]));
    }

    #[test]
    fn test_empty_containers_have_no_image() {
        assert_eq!(TagContainer::CommentBased(Vec::new()).extract_first_image(), None);
        assert_eq!(TagContainer::ItemMapBased(Vec::new()).extract_first_image(), None);
        assert_eq!(
            TagContainer::FrameBased(id3::Tag::new()).extract_first_image(),
            None
        );
    }

    #[test]
    fn test_frame_based_reads_attached_picture() {
        let mut tag = id3::Tag::new();
        tag.set_title("with art");
        tag.add_frame(Id3Picture {
            mime_type: "image/png".to_string(),
            picture_type: PictureType::CoverFront,
            description: String::new(),
            data: vec![0x89, b'P', b'N', b'G'],
        });

        let container = TagContainer::FrameBased(tag);
        assert_eq!(
            container.extract_first_image(),
            Some(vec![0x89, b'P', b'N', b'G'])
        );
    }

    #[test]
    fn test_classify_by_codec() {
        assert!(matches!(
            classify(CODEC_TYPE_FLAC, Vec::new()),
            Some(TagContainer::CommentBased(_))
        ));
        assert!(matches!(
            classify(CODEC_TYPE_AAC, Vec::new()),
            Some(TagContainer::ItemMapBased(_))
        ));
        assert!(classify(symphonia::core::codecs::CODEC_TYPE_NULL, Vec::new()).is_none());
    }
}
