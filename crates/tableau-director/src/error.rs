use tableau_events::Channel;
use thiserror::Error;

/// Programming errors in how scripts are built or driven
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectorError {
    #[error("Scripts of channel {channel} should not be empty")]
    EmptyQueue { channel: Channel },
    #[error("Either speaker id or speaker coordinate needs to be set for speech")]
    MissingSpeaker,
    #[error("Speech needs a content text id")]
    MissingContent,
    #[error("No character sprite with id {id}")]
    UnknownSprite { id: String },
    #[error("No scene with id {id}")]
    UnknownScene { id: String },
}
