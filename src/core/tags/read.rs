//! core/tags/read.rs
//! Inspect one file handle and turn it into (at most) one `TagRecord`.
//!
//! Two outcomes:
//! - the container decodes -> full record (artist/album/title/track, maybe length)
//! - it doesn't -> minimal record if the path *looks* like audio, otherwise nothing
//!
//! Nothing in here returns an error to the caller: decode problems are an
//! expected, per-file condition.

use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::Arc;

use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::{MetadataOptions, StandardTagKey, Tag};
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::{debug, warn};

use super::super::handles::HandleSource;
use super::super::library::has_audio_extension;
use super::super::pool::Inspect;
use super::super::types::{FileTask, TagFields, TagRecord};
use super::encode::encode_record;
use super::util::{average_bitrate_kbps, duration_ms_from_params, parse_slash_pair_u32};

/// Streams at or above this average bitrate (kbit/s) almost always have a
/// container that under-reports duration (seen a lot in MP4/M4B). For those
/// we leave LENGTH out so the host measures it itself.
pub const LOW_BITRATE_KBPS: u64 = 1000;

#[derive(Debug, Error)]
enum InspectError {
    #[error("cannot open handle: {0}")]
    Open(#[from] io::Error),

    #[error("unrecognized container: {0}")]
    Probe(#[from] SymphoniaError),

    #[error("no audio track")]
    NoTrack,

    #[error("decoder panicked")]
    Panicked,
}

/// What a successful probe gives us before the length policy is applied.
struct ProbedAudio {
    fields: TagFields,
    length_ms: Option<u64>,
    file_bytes: u64,
}

/// The Metadata Inspector.
///
/// Stateless: inspecting the same handle twice
/// reads the file twice and yields the same record.
pub struct Inspector {
    handles: Arc<dyn HandleSource>,
}

impl Inspector {
    pub fn new(handles: Arc<dyn HandleSource>) -> Self {
        Self { handles }
    }

    /// Inspect one handle. `None` = nothing to report for this handle.
    pub fn inspect_record(&self, task: FileTask) -> Option<TagRecord> {
        let path = self.handles.resolve_path(task);

        // Third-party demuxers are not panic-free on hostile input; a panic is
        // just another decode failure for this one file.
        let probed = catch_unwind(AssertUnwindSafe(|| self.probe(task, path.as_deref())))
            .unwrap_or_else(|_| {
                warn!(fd = %task, "decoder panicked while probing; treating as undecodable");
                Err(InspectError::Panicked)
            });

        match probed {
            Ok(probed) => {
                let mut fields = probed.fields;
                fields.length_ms = length_signal(probed.length_ms, probed.file_bytes);
                debug!(
                    fd = %task,
                    artist = %fields.artist,
                    title = %fields.title,
                    length_ms = ?fields.length_ms,
                    "inspected"
                );
                Some(TagRecord::full(task, fields))
            }
            Err(e) => {
                let record = fallback_record(task, path.as_deref());
                debug!(
                    fd = %task,
                    error = %e,
                    path = ?path,
                    minimal = record.is_some(),
                    "decode failed"
                );
                record
            }
        }
    }

    fn probe(&self, task: FileTask, path: Option<&Path>) -> Result<ProbedAudio, InspectError> {
        let file = self.handles.open(task)?;
        let file_bytes = file.metadata().map(|m| m.len()).unwrap_or(0);
        let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.and_then(|p| p.extension()).and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let mut probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;

        let length_ms = {
            let track = probed
                .format
                .default_track()
                .ok_or(InspectError::NoTrack)?;
            let params = &track.codec_params;
            duration_ms_from_params(params.time_base, params.sample_rate, params.n_frames)
        };

        let mut fields = TagFields::default();

        // Container tags first (Vorbis comments, MP4 items, RIFF INFO) ...
        let container = probed.format.metadata();
        if let Some(rev) = container.current() {
            apply_tags(&mut fields, rev.tags());
        }
        drop(container);

        // ... then tags found ahead of the container (ID3v2 in front of MPEG audio).
        if let Some(leading) = probed.metadata.get() {
            if let Some(rev) = leading.current() {
                apply_tags(&mut fields, rev.tags());
            }
        }

        Ok(ProbedAudio {
            fields,
            length_ms,
            file_bytes,
        })
    }
}

impl Inspect for Inspector {
    fn inspect(&self, task: FileTask, buffer: &mut Vec<String>) {
        if let Some(record) = self.inspect_record(task) {
            buffer.push(encode_record(&record));
        }
    }
}

/// LENGTH is only reported when the stream's average bitrate is plausible.
fn length_signal(length_ms: Option<u64>, file_bytes: u64) -> Option<u64> {
    let ms = length_ms.filter(|&ms| ms > 0)?;
    let kbps = average_bitrate_kbps(file_bytes, ms)?;
    (kbps < LOW_BITRATE_KBPS).then_some(ms)
}

/// Undecodable file: report it only if its name says "audio".
fn fallback_record(task: FileTask, path: Option<&Path>) -> Option<TagRecord> {
    path.filter(|p| has_audio_extension(p))
        .map(|_| TagRecord::minimal(task))
}

/// Fill the fields we care about; first source to provide a field wins.
fn apply_tags(fields: &mut TagFields, tags: &[Tag]) {
    for tag in tags {
        let Some(key) = tag.std_key else { continue };
        let value = tag.value.to_string();
        let value = value.trim_end_matches('\0');

        match key {
            StandardTagKey::Artist if fields.artist.is_empty() => {
                fields.artist = value.to_owned();
            }
            StandardTagKey::Album if fields.album.is_empty() => {
                fields.album = value.to_owned();
            }
            StandardTagKey::TrackTitle if fields.title.is_empty() => {
                fields.title = value.to_owned();
            }
            StandardTagKey::TrackNumber if fields.track == 0 => {
                // "3/12" style values carry the total too; we only want the number.
                let (track_no, _total) = parse_slash_pair_u32(Some(value));
                fields.track = track_no.unwrap_or(0);
            }
            _ => {}
        }
    }
}
