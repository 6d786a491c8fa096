mod clock;
mod event_consumer;
pub mod logging;
mod scene_container;
mod session;

pub use clock::{ClockEvent, SessionClock};
pub use event_consumer::{EventConsumer, LoggingConsumer};
pub use scene_container::SceneContainer;
pub use session::{GameSession, SessionError};
