//! Scene assembly: bucket events into scene windows.
//!
//! A candidate belongs to the scene whose half-open window `[start, end)`
//! contains the candidate's start. Its end is irrelevant. Highlights and
//! cues only match scenes of the chapter they were annotated in. Every time
//! is rewritten to canonical format on the way out.

use storyline_core::blueprint::{Highlight, NarrativeCue, Scene, SubtitleLine};
use storyline_core::error::CoreError;
use storyline_core::time::RawSpan;

use crate::regions::{DraftCue, DraftHighlight, DraftScene};
use crate::subtitle::{SubtitleCue, SubtitleTrack};

/// Left-inclusive, right-exclusive window membership.
pub fn window_contains(window: (f64, f64), at: f64) -> bool {
    window.0 <= at && at < window.1
}

pub struct SceneAssembler<'a> {
    highlights: &'a [DraftHighlight],
    cues: &'a [DraftCue],
}

impl<'a> SceneAssembler<'a> {
    pub fn new(highlights: &'a [DraftHighlight], cues: &'a [DraftCue]) -> Self {
        Self { highlights, cues }
    }

    /// Build the final scene for `draft`, pulling subtitle cues from the
    /// track of its chapter.
    pub fn assemble(&self, draft: &DraftScene, track: &SubtitleTrack) -> Result<Scene, CoreError> {
        let window = draft.span.seconds()?;
        let (start_time, end_time) = draft.span.canonical()?;

        let dialogues = subtitle_lines(&track.dialogues, window)?;
        let captions = subtitle_lines(&track.captions, window)?;

        let mut highlights = Vec::new();
        for candidate in self.highlights {
            if candidate.chapter_id != draft.chapter_id || !starts_within(&candidate.span, window)? {
                continue;
            }
            let (start_time, end_time) = candidate.span.canonical()?;
            highlights.push(Highlight {
                id: candidate.id.clone(),
                kind: candidate.kind.clone(),
                description: candidate.description.clone(),
                mood: candidate.mood.clone(),
                start_time,
                end_time,
            });
        }

        let mut narrative_cues = Vec::new();
        for candidate in self.cues {
            if candidate.chapter_id != draft.chapter_id || !starts_within(&candidate.span, window)? {
                continue;
            }
            let (start_time, end_time) = candidate.span.canonical()?;
            narrative_cues.push(NarrativeCue {
                kind: candidate.kind,
                value: candidate.value.clone(),
                start_time,
                end_time,
            });
        }

        Ok(Scene {
            id: draft.id,
            name: format!("Scene_{}", draft.id),
            textual: format!("Scene {}", draft.id),
            chapter_id: draft.chapter_id,
            start_time,
            end_time,
            inferred_location: draft.inferred_location.clone(),
            character_dynamics: draft.character_dynamics.clone(),
            mood_and_atmosphere: draft.mood_and_atmosphere.clone(),
            scene_content_type: draft.scene_content_type.clone(),
            branch: draft.branch.clone(),
            timeline_marker: draft.timeline_marker.clone(),
            information_marker: draft.information_marker.clone(),
            dialogues,
            captions,
            highlights,
            narrative_cues,
        })
    }
}

fn starts_within(span: &RawSpan, window: (f64, f64)) -> Result<bool, CoreError> {
    Ok(window_contains(window, span.start.to_seconds()?))
}

fn subtitle_lines(cues: &[SubtitleCue], window: (f64, f64)) -> Result<Vec<SubtitleLine>, CoreError> {
    let mut lines = Vec::new();
    for cue in cues {
        if !starts_within(&cue.span, window)? {
            continue;
        }
        let (start_time, end_time) = cue.span.canonical()?;
        lines.push(SubtitleLine {
            speaker: cue.speaker.clone(),
            text: cue.text.clone(),
            start_time,
            end_time,
        });
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle::parse_ass;
    use storyline_core::blueprint::{BranchInfo, NarrativeCueKind, NOT_ANNOTATED};

    fn draft(id: u32, chapter_id: u32, start: f64, end: f64) -> DraftScene {
        DraftScene {
            id,
            chapter_id,
            span: RawSpan::from_seconds(start, end),
            inferred_location: NOT_ANNOTATED.to_string(),
            character_dynamics: NOT_ANNOTATED.to_string(),
            mood_and_atmosphere: NOT_ANNOTATED.to_string(),
            scene_content_type: NOT_ANNOTATED.to_string(),
            branch: BranchInfo::default(),
            timeline_marker: None,
            information_marker: None,
        }
    }

    fn highlight(chapter_id: u32, start: f64, end: f64) -> DraftHighlight {
        DraftHighlight {
            chapter_id,
            span: RawSpan::from_seconds(start, end),
            id: Some(format!("h{start}")),
            kind: Some("Plot_Twist".to_string()),
            description: None,
            mood: Some("Shocking".to_string()),
        }
    }

    const TRACK: &str = "[Events]
Dialogue: 0,0:00:01.00,0:00:02.00,Default,Ann,0,0,0,,first
Dialogue: 0,0:00:10.00,0:00:12.00,Default,Bo,0,0,0,,on the boundary
Dialogue: 0,0:00:09.50,0:00:30.00,Default,Ann,0,0,0,,runs long
Dialogue: 0,0:00:11.00,0:00:11.50,Default,CAPTION,0,0,0,,Meanwhile
";

    // -- window_contains -------------------------------------------------------

    #[test]
    fn window_is_half_open() {
        assert!(window_contains((10.0, 20.0), 10.0));
        assert!(window_contains((10.0, 20.0), 19.999));
        assert!(!window_contains((10.0, 20.0), 20.0));
        assert!(!window_contains((10.0, 20.0), 9.999));
    }

    // -- assemble --------------------------------------------------------------

    #[test]
    fn boundary_cue_goes_to_later_scene() {
        let track = parse_ass(TRACK);
        let assembler = SceneAssembler::new(&[], &[]);
        let first = assembler.assemble(&draft(1, 1, 0.0, 10.0), &track).unwrap();
        let second = assembler.assemble(&draft(2, 1, 10.0, 20.0), &track).unwrap();

        let texts = |scene: &Scene| -> Vec<String> {
            scene.dialogues.iter().map(|d| d.text.clone()).collect()
        };
        assert_eq!(texts(&first), vec!["first", "runs long"]);
        assert_eq!(texts(&second), vec!["on the boundary"]);
    }

    #[test]
    fn cue_end_does_not_affect_placement() {
        let track = parse_ass(TRACK);
        let scene = SceneAssembler::new(&[], &[])
            .assemble(&draft(1, 1, 0.0, 10.0), &track)
            .unwrap();
        let long = &scene.dialogues[1];
        assert_eq!(long.start_time, "00:00:09.500");
        assert_eq!(long.end_time, "00:00:30.000");
    }

    #[test]
    fn captions_never_land_in_dialogues() {
        let track = parse_ass(TRACK);
        let scene = SceneAssembler::new(&[], &[])
            .assemble(&draft(2, 1, 10.0, 20.0), &track)
            .unwrap();
        assert!(scene.dialogues.iter().all(|d| d.speaker != "CAPTION"));
        assert_eq!(scene.captions.len(), 1);
        assert_eq!(scene.captions[0].text, "Meanwhile");
    }

    #[test]
    fn scene_times_are_canonical() {
        let scene = SceneAssembler::new(&[], &[])
            .assemble(&draft(3, 2, 61.25, 3725.5), &SubtitleTrack::default())
            .unwrap();
        assert_eq!(scene.start_time, "00:01:01.250");
        assert_eq!(scene.end_time, "01:02:05.500");
        assert_eq!(scene.name, "Scene_3");
        assert_eq!(scene.textual, "Scene 3");
        assert_eq!(scene.chapter_id, 2);
    }

    #[test]
    fn highlights_are_confined_to_their_chapter() {
        let highlights = vec![
            highlight(1, 2.0, 3.0),
            highlight(2, 2.0, 3.0),
            highlight(1, 12.0, 13.0),
        ];
        let assembler = SceneAssembler::new(&highlights, &[]);
        let scene = assembler
            .assemble(&draft(1, 1, 0.0, 10.0), &SubtitleTrack::default())
            .unwrap();
        assert_eq!(scene.highlights.len(), 1);
        assert_eq!(scene.highlights[0].start_time, "00:00:02.000");
        assert_eq!(scene.highlights[0].kind.as_deref(), Some("Plot_Twist"));
    }

    #[test]
    fn cues_are_bucketed_by_start() {
        let cues = vec![
            DraftCue {
                chapter_id: 1,
                span: RawSpan::from_seconds(9.0, 15.0),
                kind: NarrativeCueKind::Object,
                value: "Ring".to_string(),
            },
            DraftCue {
                chapter_id: 1,
                span: RawSpan::from_seconds(10.0, 11.0),
                kind: NarrativeCueKind::KeyInformation,
                value: "He lied".to_string(),
            },
        ];
        let assembler = SceneAssembler::new(&[], &cues);
        let scene = assembler
            .assemble(&draft(1, 1, 0.0, 10.0), &SubtitleTrack::default())
            .unwrap();
        assert_eq!(scene.narrative_cues.len(), 1);
        assert_eq!(scene.narrative_cues[0].value, "Ring");
        assert_eq!(scene.narrative_cues[0].end_time, "00:00:15.000");
    }
}
