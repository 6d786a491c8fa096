use std::collections::BTreeMap;
use std::time::Duration;

use tableau_client::{CanvasState, GridCoordinate};
use tableau_events::Channel;
use tableau_runner::{GameSession, SessionError};
use tracing::info;

pub const DEMO_SCENE: &str = "town";
pub const GUIDE: &str = "guide";
pub const PUPIL: &str = "pupil";
/// Item the intro takes away from the hero
pub const LETTER: &str = "letter";

/// Load the demo map with its two characters and make it active
pub fn load_town(session: &mut GameSession) -> Result<(), SessionError> {
    let mut scene = session.create_scene(DEMO_SCENE, CanvasState::default());
    scene.sprites_mut().spawn(GUIDE, GridCoordinate::new(6, 4));
    scene.sprites_mut().spawn(PUPIL, GridCoordinate::new(1, 4));
    session.add_scene(scene);
    session.activate_scene(DEMO_SCENE)
}

/// Queue the intro on the main channel and an ambient sparkle on the
/// animation channel
pub fn queue_intro(session: &mut GameSession) -> Result<(), SessionError> {
    let hero = session.player().borrow().id.clone();
    let guide_at = GridCoordinate::new(6, 4);

    session.scripts(Channel::Main, true, |s| {
        s.speech(|b| {
            b.speaker(GUIDE).content("intro.welcome").arg(hero.as_str());
        })?;
        s.character_move(PUPIL, GridCoordinate::new(5, 4), || {
            info!(target: "session", "Pupil reached the guide");
        })?;
        s.speech(|b| {
            b.speaker(PUPIL).content("intro.reply").dismiss_ms(2000);
        })?;
        s.beginner_guide();
        s.remove_item(LETTER, Some(guide_at));
        s.speech(|b| {
            b.speaker_at(guide_at)
                .content("intro.letter-delivered")
                .arrow(false)
                .dismiss_ms(1500);
        })?;
        s.put_state("intro-done", "true");
        Ok(())
    })?;

    let mut props = BTreeMap::new();
    props.insert("at".to_string(), format!("{},{}", guide_at.x, guide_at.y));
    session.scripts(Channel::AsyncAnimation, true, |s| {
        s.widget(
            "Sparkle",
            props,
            Some("guide sparkle".to_string()),
            Some(Duration::from_millis(800)),
        );
        Ok(())
    })?;

    Ok(())
}
