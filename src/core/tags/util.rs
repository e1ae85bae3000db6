//! core/tags/util.rs
//! Small parsing helpers shared by the inspector and the encoder.

use symphonia::core::units::TimeBase;

/// Parse strings like:
/// - "3" -> (Some(3), None)
/// - "3/12" -> (Some(3), Some(12))
pub(crate) fn parse_slash_pair_u32(s: Option<&str>) -> (Option<u32>, Option<u32>) {
    let Some(s) = s else { return (None, None) };
    let s = s.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    if s.is_empty() {
        return (None, None);
    }

    let mut parts = s.split('/');
    let a = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
    let b = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
    (a, b)
}

/// Stream length in milliseconds from codec params.
///
/// Prefers the stream's own time base; falls back to 1/sample_rate.
pub(crate) fn duration_ms_from_params(
    time_base: Option<TimeBase>,
    sample_rate: Option<u32>,
    n_frames: Option<u64>,
) -> Option<u64> {
    let frames = n_frames?;
    let tb = match (time_base, sample_rate) {
        (Some(tb), _) => tb,
        (None, Some(rate)) if rate > 0 => TimeBase::new(1, rate),
        _ => return None,
    };

    let t = tb.calc_time(frames);
    // Time is { seconds: u64, frac: f64 } in symphonia 0.5.x.
    let ms = (t.seconds as f64 * 1000.0) + (t.frac * 1000.0);
    Some(ms.round() as u64)
}

/// Average bitrate in kbit/s over the whole file.
///
/// bits per millisecond == kbit per second.
pub(crate) fn average_bitrate_kbps(file_bytes: u64, length_ms: u64) -> Option<u64> {
    if length_ms == 0 {
        return None;
    }
    Some(file_bytes.saturating_mul(8) / length_ms)
}

/// Make a tag value safe for a one-line record.
///
/// - trailing NUL padding (RIFF/ID3 writers love it) is dropped
/// - CR/LF become spaces so a record never spans lines
pub(crate) fn clean_field(raw: &str) -> String {
    raw.trim_end_matches('\0')
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}
