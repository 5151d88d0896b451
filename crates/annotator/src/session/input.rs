use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// Input consumed by a [`Session`](crate::Session), in arrival order.
#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionCommand {
    /// Press a pointer button; the primary button begins a stroke
    PointerDown { button: PointerButton },

    /// Move the pointer to absolute pixel coordinates
    PointerMove { x: i64, y: i64 },

    /// Release a pointer button; the primary button commits the final point
    PointerUp { button: PointerButton, x: i64, y: i64 },

    /// Undo the last annotation edit
    Undo,

    /// Close the active contour and start a new one
    NewContour,

    /// Redisplay the loaded slice with another window
    SetWindow {
        center: f64,
        #[schemars(range(min = 0.0))]
        width: f64,
    },
}

impl SessionCommand {
    /// Get the JSON schema for all commands
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SessionCommand)
    }

    /// Get a list of all available command names
    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    /// Get a description of the command
    pub fn description(&self) -> &'static str {
        match self {
            Self::PointerDown { .. } => "Press a pointer button (primary starts drawing)",
            Self::PointerMove { .. } => "Move the pointer; adds a point while drawing",
            Self::PointerUp { .. } => "Release a pointer button (primary adds the final point)",
            Self::Undo => "Undo the last annotation edit",
            Self::NewContour => "Close the current contour (3+ points) and start a new one",
            Self::SetWindow { .. } => "Change the display window without reloading",
        }
    }
}

/// Keys the annotator reacts to. Anything else maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Character(char),
    Other,
}

/// Keyboard shortcut table: Escape undoes, `n` starts a new contour.
pub fn command_for_key(key: Key) -> Option<SessionCommand> {
    match key {
        Key::Escape => Some(SessionCommand::Undo),
        Key::Character(c) if c.eq_ignore_ascii_case(&'n') => Some(SessionCommand::NewContour),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcuts() {
        assert_eq!(command_for_key(Key::Escape), Some(SessionCommand::Undo));
        assert_eq!(command_for_key(Key::Character('n')), Some(SessionCommand::NewContour));
        assert_eq!(command_for_key(Key::Character('N')), Some(SessionCommand::NewContour));
        assert_eq!(command_for_key(Key::Character('z')), None);
        assert_eq!(command_for_key(Key::Other), None);
    }

    #[test]
    fn test_command_json_shape() {
        let json = serde_json::to_value(SessionCommand::PointerMove { x: 3, y: 4 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "pointer_move", "params": {"x": 3, "y": 4}}));

        let undo: SessionCommand = serde_json::from_str(r#"{"type": "undo"}"#).unwrap();
        assert_eq!(undo, SessionCommand::Undo);

        let down: SessionCommand =
            serde_json::from_str(r#"{"type": "pointer_down", "params": {"button": "primary"}}"#)
                .unwrap();
        assert_eq!(down, SessionCommand::PointerDown { button: PointerButton::Primary });
    }

    #[test]
    fn test_command_names() {
        let names = SessionCommand::command_names();
        assert!(names.contains(&"pointer_move"));
        assert!(names.contains(&"new_contour"));
        assert_eq!(SessionCommand::Undo.to_string(), "undo");
    }

    #[test]
    fn test_schema_lists_variants() {
        let schema = serde_json::to_string(&SessionCommand::schema()).unwrap();
        assert!(schema.contains("set_window"));
        assert!(schema.contains("pointer_up"));
    }
}
