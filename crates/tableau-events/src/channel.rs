use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAIN_CHANNEL: &str = "MainChannel";
pub const ASYNC_ANIMATION_CHANNEL: &str = "AsyncAnimation";

/// An independent script lane. Each scene runs one director per channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Channel {
    /// Main story channel. Scripts here can respond to user clicks.
    Main,
    /// Background effects that must not block input. Suspended while the
    /// game window is hidden or a modal is open.
    AsyncAnimation,
    /// Any other lane, identified by name
    Custom(String),
}

impl Channel {
    pub fn name(&self) -> &str {
        match self {
            Channel::Main => MAIN_CHANNEL,
            Channel::AsyncAnimation => ASYNC_ANIMATION_CHANNEL,
            Channel::Custom(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            MAIN_CHANNEL => Channel::Main,
            ASYNC_ANIMATION_CHANNEL => Channel::AsyncAnimation,
            other => Channel::Custom(other.to_string()),
        }
    }

    /// Whether clicks may drive this channel
    pub fn is_main(&self) -> bool {
        matches!(self, Channel::Main)
    }

    /// Whether advancement is held back while the game is not in view
    pub fn is_background(&self) -> bool {
        matches!(self, Channel::AsyncAnimation)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Channel {
    fn from(name: String) -> Self {
        Channel::from_name(&name)
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_names_round_trip() {
        assert_eq!(Channel::from_name("MainChannel"), Channel::Main);
        assert_eq!(Channel::from_name("AsyncAnimation"), Channel::AsyncAnimation);
        assert_eq!(Channel::Main.to_string(), "MainChannel");
        assert_eq!(Channel::AsyncAnimation.to_string(), "AsyncAnimation");
    }

    #[test]
    fn test_custom_channel_keeps_its_name() {
        let channel = Channel::from_name("Fireworks");
        assert_eq!(channel, Channel::Custom("Fireworks".to_string()));
        assert!(!channel.is_main());
        assert!(!channel.is_background());
        assert_eq!(channel.name(), "Fireworks");
    }
}
