//! ASS subtitle-track parser.
//!
//! Only `Dialogue:` events inside the `[Events]` section are read. Times
//! stay in subtitle encoding; the assembler converts them.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use storyline_core::time::{subtitle_time_to_seconds, RawSpan};
use storyline_core::types::ChapterId;

use crate::error::{PipelineError, PipelineResult};

/// Speaker name that marks on-screen text rather than speech.
pub const CAPTION_SPEAKER: &str = "CAPTION";

/// `Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text`.
/// The text field may itself contain commas.
const EVENT_FIELD_COUNT: usize = 10;

const EVENT_PREFIX: &str = "dialogue:";

static OVERRIDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}").expect("valid regex"));

#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    pub speaker: String,
    pub text: String,
    pub span: RawSpan,
}

/// Cues of one track in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtitleTrack {
    pub dialogues: Vec<SubtitleCue>,
    pub captions: Vec<SubtitleCue>,
}

impl SubtitleTrack {
    pub fn len(&self) -> usize {
        self.dialogues.len() + self.captions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn is_caption_speaker(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(CAPTION_SPEAKER)
}

/// Parse subtitle-track text. Malformed events are logged and skipped.
pub fn parse_ass(text: &str) -> SubtitleTrack {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut track = SubtitleTrack::default();
    let mut in_events = false;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.starts_with('[') {
            in_events = line.eq_ignore_ascii_case("[events]");
            continue;
        }
        if !in_events {
            continue;
        }
        let Some(body) = strip_event_prefix(line) else {
            continue;
        };

        match parse_event(body) {
            Ok(cue) if is_caption_speaker(&cue.speaker) => track.captions.push(cue),
            Ok(cue) => track.dialogues.push(cue),
            Err(reason) => {
                tracing::warn!(line = index + 1, reason, "Skipping malformed subtitle event");
            }
        }
    }

    track
}

/// Read and parse the track for `chapter_id`. A missing file is fatal.
pub fn load_subtitle_track(path: &Path, chapter_id: ChapterId) -> PipelineResult<SubtitleTrack> {
    let text = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            PipelineError::SubtitleMissing {
                chapter_id,
                path: path.to_path_buf(),
            }
        } else {
            PipelineError::SubtitleRead {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let track = parse_ass(&text);
    tracing::debug!(
        chapter_id,
        path = %path.display(),
        dialogues = track.dialogues.len(),
        captions = track.captions.len(),
        "Loaded subtitle track",
    );
    Ok(track)
}

/// Strip override blocks and expand ASS escapes.
pub fn clean_text(raw: &str) -> String {
    let text = raw
        .replace("\\N", "\n")
        .replace("\\n", "\n")
        .replace("\\h", " ");
    OVERRIDE_RE.replace_all(&text, "").trim().to_string()
}

fn strip_event_prefix(line: &str) -> Option<&str> {
    let prefix = line.get(..EVENT_PREFIX.len())?;
    prefix
        .eq_ignore_ascii_case(EVENT_PREFIX)
        .then(|| &line[EVENT_PREFIX.len()..])
}

fn parse_event(body: &str) -> Result<SubtitleCue, &'static str> {
    let fields: Vec<&str> = body.trim().splitn(EVENT_FIELD_COUNT, ',').collect();
    if fields.len() < EVENT_FIELD_COUNT {
        return Err("fewer than 10 fields");
    }

    let (start, end) = (fields[1].trim(), fields[2].trim());
    if subtitle_time_to_seconds(start).is_err() || subtitle_time_to_seconds(end).is_err() {
        return Err("unreadable start or end time");
    }

    Ok(SubtitleCue {
        speaker: fields[4].trim().to_string(),
        text: clean_text(fields[9]),
        span: RawSpan::from_subtitle(start, end),
    })
}
