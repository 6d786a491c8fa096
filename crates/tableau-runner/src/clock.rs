use tableau_client::config::ClockConfig;
use tableau_events::ClockTick;
use tokio::time::{self, Duration, Instant, Interval, MissedTickBehavior};

/// What woke the session loop up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    Tick(ClockTick),
    /// Time for the next animation frame
    Frame,
}

/// The four fixed-period tick streams plus the frame pacer.
///
/// Late ticks are skipped rather than bunched up, like a display's frame
/// callback that simply fires on the next vsync.
pub struct SessionClock {
    fast: Interval,
    poll: Interval,
    heartbeat: Interval,
    slow_sync: Interval,
    frame: Interval,
}

impl SessionClock {
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            fast: interval(config.fast()),
            poll: interval(config.poll()),
            heartbeat: interval(config.heartbeat()),
            slow_sync: interval(config.slow_sync()),
            frame: interval(config.frame()),
        }
    }

    /// Wait for whichever stream fires next. Cancel safe.
    pub async fn next(&mut self) -> ClockEvent {
        tokio::select! {
            _ = self.frame.tick() => ClockEvent::Frame,
            _ = self.fast.tick() => ClockEvent::Tick(ClockTick::Fast),
            _ = self.poll.tick() => ClockEvent::Tick(ClockTick::Poll),
            _ = self.heartbeat.tick() => ClockEvent::Tick(ClockTick::Heartbeat),
            _ = self.slow_sync.tick() => ClockEvent::Tick(ClockTick::SlowSync),
        }
    }
}

fn interval(period: Duration) -> Interval {
    // First tick one period from now, not immediately
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}
