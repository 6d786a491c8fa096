use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use futures::FutureExt;
use tableau_client::{GameScene, GridCoordinate, SpeechBubble, Widget};

use crate::director::Director;
use crate::error::DirectorError;
use crate::script::ScriptUnit;
use crate::stage::Stage;

/// Describes one speech bubble
#[derive(Debug, Clone)]
pub struct SpeechBuilder {
    speaker_id: Option<String>,
    speaker_coordinate: Option<GridCoordinate>,
    content_id: Option<String>,
    args: Vec<String>,
    arrow: bool,
    dismiss_ms: u64,
}

impl Default for SpeechBuilder {
    fn default() -> Self {
        Self {
            speaker_id: None,
            speaker_coordinate: None,
            content_id: None,
            args: Vec::new(),
            arrow: true,
            dismiss_ms: 0,
        }
    }
}

impl SpeechBuilder {
    pub fn speaker(&mut self, id: impl Into<String>) -> &mut Self {
        self.speaker_id = Some(id.into());
        self
    }

    pub fn speaker_at(&mut self, coordinate: GridCoordinate) -> &mut Self {
        self.speaker_coordinate = Some(coordinate);
        self
    }

    /// Text id of the bubble content
    pub fn content(&mut self, id: impl Into<String>) -> &mut Self {
        self.content_id = Some(id.into());
        self
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn arrow(&mut self, arrow: bool) -> &mut Self {
        self.arrow = arrow;
        self
    }

    /// Advance on its own after `ms`. 0 waits for a click.
    pub fn dismiss_ms(&mut self, ms: u64) -> &mut Self {
        self.dismiss_ms = ms;
        self
    }

    fn build(self) -> Result<(SpeechBubble, Option<Duration>), DirectorError> {
        if self.speaker_id.is_none() && self.speaker_coordinate.is_none() {
            return Err(DirectorError::MissingSpeaker);
        }
        let content_id = self.content_id.ok_or(DirectorError::MissingContent)?;
        let dismiss = (self.dismiss_ms != 0).then(|| Duration::from_millis(self.dismiss_ms));

        let bubble = SpeechBubble {
            speaker_id: self.speaker_id,
            speaker_coordinate: self.speaker_coordinate,
            content_id,
            args: self.args,
            arrow: self.arrow,
        };
        Ok((bubble, dismiss))
    }
}

/// Appends units to a director's queue. Handed to
/// [`Director::run_queue`](crate::Director::run_queue).
///
/// Units that fail validation are rejected before they are enqueued.
pub struct ScriptsBuilder<'a> {
    director: &'a mut Director,
    scene: &'a GameScene,
}

impl<'a> ScriptsBuilder<'a> {
    pub(crate) fn new(director: &'a mut Director, scene: &'a GameScene) -> Self {
        Self { director, scene }
    }

    pub fn speech<F>(&mut self, describe: F) -> Result<&mut Self, DirectorError>
    where
        F: FnOnce(&mut SpeechBuilder),
    {
        let mut builder = SpeechBuilder::default();
        describe(&mut builder);
        let (bubble, dismiss) = builder.build()?;

        let id = self.director.next_widget_id();
        let label = Some(bubble.content_id.clone());
        self.director.enqueue(ScriptUnit::display_widget(
            id,
            Widget::SpeechBubble(bubble),
            label,
            dismiss,
        ));
        Ok(self)
    }

    /// Show any named component until the next advance, or for `dismiss`
    pub fn widget(
        &mut self,
        component: impl Into<String>,
        props: BTreeMap<String, String>,
        label: Option<String>,
        dismiss: Option<Duration>,
    ) -> &mut Self {
        let id = self.director.next_widget_id();
        let widget = Widget::Component {
            name: component.into(),
            props,
        };
        self.director
            .enqueue(ScriptUnit::display_widget(id, widget, label, dismiss));
        self
    }

    /// Walk a character sprite to `destination`, then run `callback`
    pub fn character_move<F>(
        &mut self,
        character_id: &str,
        destination: GridCoordinate,
        callback: F,
    ) -> Result<&mut Self, DirectorError>
    where
        F: FnOnce() + 'static,
    {
        if !self.scene.sprites().contains(character_id) {
            return Err(DirectorError::UnknownSprite {
                id: character_id.to_string(),
            });
        }
        self.director.enqueue(ScriptUnit::character_move(
            character_id,
            destination,
            Box::new(callback),
        ));
        Ok(self)
    }

    /// Run an async action; the queue moves on once it succeeds
    pub fn suspend<F, Fut>(&mut self, label: impl Into<String>, action: F) -> &mut Self
    where
        F: FnOnce(&Stage) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        self.director.enqueue(ScriptUnit::suspend_and_run(
            label,
            Box::new(move |stage: &Stage| action(stage).boxed_local()),
        ));
        self
    }

    /// Store a flag on the server, then on the local player
    pub fn put_state(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        let label = format!("putState({key}, {value})");
        self.suspend(label, move |stage| {
            let call = stage.network.put_state(&key, &value);
            let player = stage.player.clone();
            async move {
                call.await?;
                player.borrow_mut().put_state(key, value);
                Ok::<(), anyhow::Error>(())
            }
        })
    }

    /// Clear a flag on the server, then on the local player
    pub fn remove_state(&mut self, key: impl Into<String>) -> &mut Self {
        let key = key.into();
        let label = format!("removeState({key})");
        self.suspend(label, move |stage| {
            let call = stage.network.remove_state(&key);
            let player = stage.player.clone();
            async move {
                call.await?;
                player.borrow_mut().remove_state(&key);
                Ok::<(), anyhow::Error>(())
            }
        })
    }

    pub fn remove_item(
        &mut self,
        item: impl Into<String>,
        destination: Option<GridCoordinate>,
    ) -> &mut Self {
        self.director
            .enqueue(ScriptUnit::remove_item(item, destination));
        self
    }

    pub fn beginner_guide(&mut self) -> &mut Self {
        self.director.enqueue(ScriptUnit::beginner_guide());
        self
    }
}
