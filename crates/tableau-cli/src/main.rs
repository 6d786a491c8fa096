mod demo;

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tableau_client::{ConfigLoadError, HeadlessHost, OfflineClient, TableauConfig};
use tableau_events::{Channel, ClockTick, EventBus, EventKind, GameEvent};
use tableau_runner::logging::init_logging;
use tableau_runner::{GameSession, LoggingConsumer};
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "tableau", version, about = "Play the scripted town intro headless")]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write a default config file and exit
    #[arg(long)]
    init_config: bool,

    /// How long to run the session
    #[arg(short, long, default_value = "12")]
    seconds: u64,

    /// Advance the main channel on every heartbeat, as if the player clicked
    #[arg(short, long)]
    auto_advance: bool,

    /// Enables debug mode, repeat for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    /// Also log to the data directory
    #[arg(long)]
    log_file: bool,
}

fn write_default_config(path: Option<&PathBuf>) -> anyhow::Result<PathBuf> {
    let config = TableauConfig::default();
    let path = match path {
        Some(path) => {
            config.save_to(path)?;
            path.clone()
        }
        None => config.save()?,
    };
    eprintln!("Config file created at: {}", path.display());
    Ok(path)
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<TableauConfig> {
    let loaded = match path {
        Some(path) => TableauConfig::load_from(path),
        None => TableauConfig::load(),
    };
    match loaded {
        Ok(config) => Ok(config),
        Err(ConfigLoadError::NotFound(path)) => {
            warn!("No config at {}, using defaults", path.display());
            Ok(TableauConfig::default())
        }
        Err(err) => Err(err).context("Failed to load config"),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.init_config {
        write_default_config(cli.config.as_ref())?;
        return Ok(());
    }

    let filter = match cli.debug {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    // Peek at the config before logging exists so the file flag is honored
    let file_logging = cli.log_file
        || load_config(cli.config.as_ref())
            .map(|config| config.logging.file)
            .unwrap_or(false);
    let _guard = init_logging("cli", file_logging, filter)?;

    let config = load_config(cli.config.as_ref())?;
    info!("Starting tableau demo for {}s", cli.seconds);

    let bus = EventBus::new();
    let _logging = LoggingConsumer::attach(&bus);
    if cli.auto_advance {
        let advance_bus = bus.clone();
        bus.on(EventKind::Tick(ClockTick::Heartbeat), move |_| {
            advance_bus.emit(GameEvent::ScriptNext {
                channel: Channel::Main,
            });
        });
    }

    let host = Rc::new(HeadlessHost::new());
    let player = config.player.to_player().with_items([demo::LETTER]);
    let mut session = GameSession::new(
        &config,
        bus.clone(),
        player.into_shared(),
        Rc::new(OfflineClient::new(Duration::from_millis(120))),
        host.clone(),
        host.clone(),
    );
    demo::load_town(&mut session)?;
    demo::queue_intro(&mut session)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let seconds = cli.seconds;
    let stopper = async move {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
            _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        }
        let _ = shutdown_tx.send(true);
    };
    tokio::join!(session.run(shutdown_rx), stopper);

    let player = session.player().borrow();
    info!(
        "Demo finished: items {:?}, states {:?}, {} players online",
        player.items(),
        player.states(),
        session.online_count()
    );
    for popup in host.popups() {
        info!("Played popup of {} ({:.1}s)", popup.item, popup.duration_secs);
    }

    Ok(())
}
