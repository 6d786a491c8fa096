use std::collections::BTreeMap;

use crate::geometry::GridCoordinate;

/// Active script widgets of a scene, keyed by widget id
pub type WidgetMap = BTreeMap<String, Widget>;

/// Render descriptor for a widget the UI layer should display
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    SpeechBubble(SpeechBubble),
    /// Any other UI component, identified by name with string props
    Component {
        name: String,
        props: BTreeMap<String, String>,
    },
}

/// A speech bubble attached to a character or a map tile
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechBubble {
    pub speaker_id: Option<String>,
    pub speaker_coordinate: Option<GridCoordinate>,
    /// i18n text id of the bubble content
    pub content_id: String,
    /// Arguments substituted into the content template
    pub args: Vec<String>,
    /// Show the "click to continue" arrow
    pub arrow: bool,
}
