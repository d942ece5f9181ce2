//! History projection: derives the ordered, media-capped conversation
//! history from the raw message log.
//!
//! The projection is rebuilt from scratch on every read; nothing here is
//! persisted and the source log is never mutated.

use shared::chat::{ConversationTurn, MediaKind, MediaRef, SourceMessage, Speaker};
use std::collections::HashMap;

/// Photos older than this are included as text-only turns, so the panel
/// never downloads a conversation's whole photo backlog.
const PHOTO_FRESHNESS_SECS: i64 = 15 * 60;

/// Caps applied to the projected history, one per media kind.
///
/// Photos are not capped; they are filtered by age instead.
#[derive(Debug, Clone, Copy)]
pub struct MediaCaps {
    pub max_voices: u8,
    pub max_videos: u8,
}

/// Project the message log into an ordered history of conversation turns.
///
/// Skips service messages and messages carrying none of text, voice, photo
/// or round video. Voice and round-video turns get a synthesized media
/// handle; a stored transcription replaces the attachment with text.
/// `now` is the projection instant as a unix timestamp.
pub fn project_history(
    messages: &[SourceMessage],
    transcriptions: &HashMap<String, String>,
    caps: MediaCaps,
    now: i64,
) -> Vec<ConversationTurn> {
    let mut ordered: Vec<&SourceMessage> = messages
        .iter()
        .filter(|m| qualifies(m))
        .collect();
    ordered.sort_by_key(|m| m.date);

    let mut turns: Vec<ConversationTurn> = ordered
        .into_iter()
        .map(|m| project_message(m, transcriptions, now))
        .collect();

    apply_media_caps(&mut turns, caps);
    turns
}

/// Convenience wrapper using the current wall-clock time.
pub fn project_history_now(
    messages: &[SourceMessage],
    transcriptions: &HashMap<String, String>,
    caps: MediaCaps,
) -> Vec<ConversationTurn> {
    project_history(messages, transcriptions, caps, chrono::Utc::now().timestamp())
}

fn qualifies(m: &SourceMessage) -> bool {
    if m.is_service {
        return false;
    }
    let has_text = m.text.as_deref().map(|t| !t.is_empty()).unwrap_or(false);
    let has_round_video = m.video.as_ref().map(|v| v.is_round).unwrap_or(false);
    has_text || m.voice.is_some() || m.photo.is_some() || has_round_video
}

fn project_message(
    m: &SourceMessage,
    transcriptions: &HashMap<String, String>,
    now: i64,
) -> ConversationTurn {
    let mut text = m.text.clone().unwrap_or_default();
    let mut media = None;

    let transcription = m
        .transcription_id
        .as_ref()
        .and_then(|id| transcriptions.get(id));

    if let Some(transcription) = transcription {
        // A transcribed voice message travels as text; no attachment.
        text = format!("{}\n(Voice transcription: {})", text, transcription)
            .trim()
            .to_string();
    } else if let Some(voice) = &m.voice {
        media = Some(MediaRef {
            handle: format!("document{}", voice.id),
            mime_type: voice
                .mime_type
                .clone()
                .unwrap_or_else(|| "audio/ogg".to_string()),
            kind: MediaKind::Voice,
        });
    } else if let Some(video) = m.video.as_ref().filter(|v| v.is_round) {
        media = Some(MediaRef {
            handle: format!("document{}", video.id),
            mime_type: video
                .mime_type
                .clone()
                .unwrap_or_else(|| "video/mp4".to_string()),
            kind: MediaKind::Video,
        });
    } else if let Some(photo) = &m.photo {
        // Only recent photos are attached; the panel reacts to real-time
        // additions, not the archive.
        if now - m.date < PHOTO_FRESHNESS_SECS {
            media = Some(MediaRef {
                handle: format!("photo{}?size=x", photo.id),
                mime_type: "image/jpeg".to_string(),
                kind: MediaKind::Photo,
            });
        }
    }

    ConversationTurn {
        speaker: if m.is_outgoing {
            Speaker::Me
        } else {
            Speaker::Other
        },
        text,
        media,
    }
}

/// Single backward pass enforcing the per-kind caps: counting from the
/// newest turn, the cap-plus-first voice or video attachment (and older)
/// is cleared, keeping the text. Counters are independent per kind.
fn apply_media_caps(turns: &mut [ConversationTurn], caps: MediaCaps) {
    let mut voices = 0u32;
    let mut videos = 0u32;

    for turn in turns.iter_mut().rev() {
        let kind = match &turn.media {
            Some(media) => media.kind,
            None => continue,
        };
        match kind {
            MediaKind::Voice => {
                voices += 1;
                if voices > u32::from(caps.max_voices) {
                    turn.media = None;
                }
            }
            MediaKind::Video => {
                videos += 1;
                if videos > u32::from(caps.max_videos) {
                    turn.media = None;
                }
            }
            MediaKind::Photo => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::chat::{PhotoContent, VideoContent, VoiceContent};

    const NOW: i64 = 1_000_000;

    fn text_message(id: i64, date: i64, outgoing: bool, text: &str) -> SourceMessage {
        SourceMessage {
            id,
            is_outgoing: outgoing,
            date,
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn voice_message(id: i64, date: i64) -> SourceMessage {
        SourceMessage {
            id,
            date,
            voice: Some(VoiceContent {
                id,
                mime_type: None,
            }),
            ..Default::default()
        }
    }

    fn round_video_message(id: i64, date: i64) -> SourceMessage {
        SourceMessage {
            id,
            date,
            video: Some(VideoContent {
                id,
                mime_type: None,
                is_round: true,
            }),
            ..Default::default()
        }
    }

    fn photo_message(id: i64, date: i64) -> SourceMessage {
        SourceMessage {
            id,
            date,
            photo: Some(PhotoContent { id }),
            ..Default::default()
        }
    }

    fn caps(max_voices: u8, max_videos: u8) -> MediaCaps {
        MediaCaps {
            max_voices,
            max_videos,
        }
    }

    #[test]
    fn test_orders_by_date_and_maps_roles() {
        let messages = vec![
            text_message(2, 200, true, "second"),
            text_message(1, 100, false, "first"),
        ];
        let turns = project_history(&messages, &HashMap::new(), caps(5, 5), NOW);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text, "first");
        assert_eq!(turns[0].speaker, Speaker::Other);
        assert_eq!(turns[1].text, "second");
        assert_eq!(turns[1].speaker, Speaker::Me);
    }

    #[test]
    fn test_skips_service_and_empty_messages() {
        let mut service = text_message(1, 100, false, "joined");
        service.is_service = true;
        let empty = SourceMessage {
            id: 2,
            date: 200,
            ..Default::default()
        };
        let non_round = SourceMessage {
            id: 3,
            date: 300,
            video: Some(VideoContent {
                id: 3,
                mime_type: None,
                is_round: false,
            }),
            ..Default::default()
        };
        let turns = project_history(
            &[service, empty, non_round],
            &HashMap::new(),
            caps(5, 5),
            NOW,
        );
        assert!(turns.is_empty());
    }

    #[test]
    fn test_voice_gets_synthesized_handle_and_default_mime() {
        let turns = project_history(&[voice_message(7, 100)], &HashMap::new(), caps(5, 5), NOW);
        let media = turns[0].media.as_ref().unwrap();
        assert_eq!(media.handle, "document7");
        assert_eq!(media.mime_type, "audio/ogg");
        assert_eq!(media.kind, MediaKind::Voice);
    }

    #[test]
    fn test_round_video_default_mime() {
        let turns = project_history(
            &[round_video_message(9, 100)],
            &HashMap::new(),
            caps(5, 5),
            NOW,
        );
        let media = turns[0].media.as_ref().unwrap();
        assert_eq!(media.handle, "document9");
        assert_eq!(media.mime_type, "video/mp4");
        assert_eq!(media.kind, MediaKind::Video);
    }

    #[test]
    fn test_transcription_replaces_attachment_with_text() {
        let mut msg = voice_message(4, 100);
        msg.text = Some("listen".to_string());
        msg.transcription_id = Some("t4".to_string());
        let transcriptions =
            HashMap::from([("t4".to_string(), "hello there".to_string())]);
        let turns = project_history(&[msg], &transcriptions, caps(5, 5), NOW);
        assert_eq!(turns[0].text, "listen\n(Voice transcription: hello there)");
        assert!(turns[0].media.is_none());
    }

    #[test]
    fn test_fresh_photo_attached_old_photo_text_only() {
        let fresh = photo_message(1, NOW - 60);
        let stale = photo_message(2, NOW - PHOTO_FRESHNESS_SECS - 1);
        let turns = project_history(&[stale, fresh], &HashMap::new(), caps(5, 5), NOW);
        assert!(turns[0].media.is_none());
        let media = turns[1].media.as_ref().unwrap();
        assert_eq!(media.handle, "photo1?size=x");
        assert_eq!(media.mime_type, "image/jpeg");
    }

    #[test]
    fn test_caps_keep_most_recent_media_per_kind() {
        let messages: Vec<SourceMessage> = (0..4)
            .map(|i| voice_message(i, 100 + i))
            .chain((10..13).map(|i| round_video_message(i, 200 + i)))
            .collect();
        let turns = project_history(&messages, &HashMap::new(), caps(2, 1), NOW);

        let voices: Vec<&ConversationTurn> = turns
            .iter()
            .filter(|t| matches!(&t.media, Some(m) if m.kind == MediaKind::Voice))
            .collect();
        let videos: Vec<&ConversationTurn> = turns
            .iter()
            .filter(|t| matches!(&t.media, Some(m) if m.kind == MediaKind::Video))
            .collect();

        assert_eq!(voices.len(), 2);
        assert_eq!(videos.len(), 1);
        // The survivors are the newest of each kind.
        assert_eq!(voices[0].media.as_ref().unwrap().handle, "document2");
        assert_eq!(voices[1].media.as_ref().unwrap().handle, "document3");
        assert_eq!(videos[0].media.as_ref().unwrap().handle, "document12");
    }

    #[test]
    fn test_zero_caps_strip_all_voice_and_video() {
        let messages = vec![
            voice_message(1, 100),
            round_video_message(2, 200),
            photo_message(3, NOW - 10),
        ];
        let turns = project_history(&messages, &HashMap::new(), caps(0, 0), NOW);
        assert!(turns[0].media.is_none());
        assert!(turns[1].media.is_none());
        // Photos are age-filtered, not capped.
        assert!(turns[2].media.is_some());
    }

    #[test]
    fn test_empty_log_projects_to_empty_history() {
        let turns = project_history(&[], &HashMap::new(), caps(5, 5), NOW);
        assert!(turns.is_empty());
    }
}
