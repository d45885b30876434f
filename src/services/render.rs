//! Text renderings of segment lists.

use crate::models::artifact::Segment;
use crate::models::work_order::ArtifactFormat;

/// Frame rate used for EDL timecodes (non-drop).
const EDL_FPS: f64 = 30.0;

pub fn render(format: ArtifactFormat, title: &str, segments: &[Segment]) -> Result<String, serde_json::Error> {
    Ok(match format {
        ArtifactFormat::Json => serde_json::to_string_pretty(segments)?,
        ArtifactFormat::Csv => csv(segments),
        ArtifactFormat::Srt => srt(segments),
        ArtifactFormat::Vtt => vtt(segments),
        ArtifactFormat::Edl => edl(title, segments),
    })
}

/// Merge every segment into one spanning the earliest start to the latest end.
pub fn collapse(segments: &[Segment]) -> Vec<Segment> {
    let (Some(first), Some(_)) = (segments.first(), segments.last()) else {
        return Vec::new();
    };

    let start = segments.iter().map(|s| s.start).fold(f64::INFINITY, f64::min);
    let end = segments.iter().map(|s| s.end).fold(f64::NEG_INFINITY, f64::max);
    let value = segments
        .iter()
        .map(|s| s.value.trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    vec![Segment {
        id: first.id.clone(),
        event_type: first.event_type.clone(),
        value,
        start,
        end,
        confidence_score: None,
        full_path: first.full_path.clone(),
    }]
}

fn csv(segments: &[Segment]) -> String {
    let mut out = String::from("id,type,start,end,value\n");
    for s in segments {
        out.push_str(&format!(
            "{},{},{:.3},{:.3},{}\n",
            csv_field(&s.id),
            csv_field(&s.event_type),
            s.start,
            s.end,
            csv_field(&s.value)
        ));
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn srt(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, s) in segments.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            clock(s.start, ','),
            clock(s.end, ','),
            s.value
        ));
    }
    out
}

fn vtt(segments: &[Segment]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for s in segments {
        out.push_str(&format!("{} --> {}\n{}\n\n", clock(s.start, '.'), clock(s.end, '.'), s.value));
    }
    out
}

fn edl(title: &str, segments: &[Segment]) -> String {
    let mut out = format!("TITLE: {title}\nFCM: NON-DROP FRAME\n\n");
    let mut record = 0.0;
    for (i, s) in segments.iter().enumerate() {
        let duration = (s.end - s.start).max(0.0);
        out.push_str(&format!(
            "{:03}  AX       V     C        {} {} {} {}\n",
            i + 1,
            timecode(s.start),
            timecode(s.end),
            timecode(record),
            timecode(record + duration)
        ));
        if !s.value.is_empty() {
            out.push_str(&format!("* COMMENT: {}\n", s.value.replace('\n', " ")));
        }
        out.push('\n');
        record += duration;
    }
    out
}

/// `HH:MM:SS<sep>mmm`
fn clock(seconds: f64, separator: char) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let (h, rem) = (total_ms / 3_600_000, total_ms % 3_600_000);
    let (m, rem) = (rem / 60_000, rem % 60_000);
    let (s, ms) = (rem / 1000, rem % 1000);
    format!("{h:02}:{m:02}:{s:02}{separator}{ms:03}")
}

/// `HH:MM:SS:FF`
fn timecode(seconds: f64) -> String {
    let total_frames = (seconds.max(0.0) * EDL_FPS).round() as u64;
    let fps = EDL_FPS as u64;
    let (h, rem) = (total_frames / (3600 * fps), total_frames % (3600 * fps));
    let (m, rem) = (rem / (60 * fps), rem % (60 * fps));
    let (s, f) = (rem / fps, rem % fps);
    format!("{h:02}:{m:02}:{s:02}:{f:02}")
}
