use serde::{Deserialize, Serialize};

/// Lifecycle signals emitted by the playback engine for one guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerEvent {
    /// A track started playing.
    Start,
    /// The queue drained; nothing is left to play.
    FinishPlayback,
    Error { message: String },
    Pause,
    Resume,
    /// The current track finished.
    Finish,
    Loop,
    LoopEnabled,
    LoopDisabled,
    Repeat,
    RepeatEnabled,
    RepeatDisabled,
    Skip,
    TrackAdd,
    /// The queue was shuffled.
    Mix,
    VolumeUpdate,
}

/// Payload-free discriminant of [`PlayerEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    FinishPlayback,
    Error,
    Pause,
    Resume,
    Finish,
    Loop,
    LoopEnabled,
    LoopDisabled,
    Repeat,
    RepeatEnabled,
    RepeatDisabled,
    Skip,
    TrackAdd,
    Mix,
    VolumeUpdate,
}

impl EventKind {
    pub const ALL: [EventKind; 16] = [
        Self::Start,
        Self::FinishPlayback,
        Self::Error,
        Self::Pause,
        Self::Resume,
        Self::Finish,
        Self::Loop,
        Self::LoopEnabled,
        Self::LoopDisabled,
        Self::Repeat,
        Self::RepeatEnabled,
        Self::RepeatDisabled,
        Self::Skip,
        Self::TrackAdd,
        Self::Mix,
        Self::VolumeUpdate,
    ];
}

impl PlayerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Start => EventKind::Start,
            Self::FinishPlayback => EventKind::FinishPlayback,
            Self::Error { .. } => EventKind::Error,
            Self::Pause => EventKind::Pause,
            Self::Resume => EventKind::Resume,
            Self::Finish => EventKind::Finish,
            Self::Loop => EventKind::Loop,
            Self::LoopEnabled => EventKind::LoopEnabled,
            Self::LoopDisabled => EventKind::LoopDisabled,
            Self::Repeat => EventKind::Repeat,
            Self::RepeatEnabled => EventKind::RepeatEnabled,
            Self::RepeatDisabled => EventKind::RepeatDisabled,
            Self::Skip => EventKind::Skip,
            Self::TrackAdd => EventKind::TrackAdd,
            Self::Mix => EventKind::Mix,
            Self::VolumeUpdate => EventKind::VolumeUpdate,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let ev: PlayerEvent = serde_json::from_str(r#"{"type":"finishPlayback"}"#).unwrap();
        assert_eq!(ev, PlayerEvent::FinishPlayback);

        let ev: PlayerEvent =
            serde_json::from_str(r#"{"type":"error","message":"disk full"}"#).unwrap();
        assert_eq!(ev.kind(), EventKind::Error);
        assert_eq!(ev.error_message(), Some("disk full"));

        let ev: PlayerEvent = serde_json::from_str(r#"{"type":"repeatDisabled"}"#).unwrap();
        assert_eq!(ev.kind(), EventKind::RepeatDisabled);
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        assert!(serde_json::from_str::<PlayerEvent>(r#"{"type":"explode"}"#).is_err());
    }
}
