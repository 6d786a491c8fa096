pub mod clock_config;
pub mod director_config;
pub mod player_config;
pub mod tableau_config;

pub use clock_config::ClockConfig;
pub use director_config::DirectorConfig;
pub use player_config::PlayerConfig;
pub use tableau_config::{ConfigLoadError, LoggingConfig, TableauConfig};
