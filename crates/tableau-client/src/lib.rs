pub mod config;
pub mod geometry;
pub mod host;
pub mod network;
pub mod player;
pub mod scene;
pub mod sprite;
pub mod widget;

// Re-export main types
pub use self::geometry::{GridCoordinate, PixelCoordinate, PixelSize};
pub use self::host::{EffectHost, GameControl, HeadlessHost, ItemPopup, Overlay, OverlayId};
pub use self::network::{NetworkClient, NetworkFuture, OfflineClient};
pub use self::player::{Player, SharedPlayer};
pub use self::scene::{CanvasState, GameScene};
pub use self::sprite::{ArrivalCallback, CharacterSprite, SpriteLayer};
pub use self::widget::{SpeechBubble, Widget, WidgetMap};
pub use self::config::{ConfigLoadError, TableauConfig};
