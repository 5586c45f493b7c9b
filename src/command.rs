//! Command — the universal message type for `chalkboard`.
//!
//! ARCHITECTURE
//! ============
//! Every communication between peers is a Command. A peer folds commands
//! into its local action history and sends them to the relay, which fans
//! each one out to every other peer. The relay never looks past the tag.
//!
//! DESIGN
//! ======
//! - Tagged sum type: each variant carries exactly the fields it needs.
//!   Decoding dispatches on the `type` tag, never on which fields are set.
//! - `Line` and `Text` carry `new_action`, which marks the first command of
//!   a gesture so a multi-segment stroke arrives as several commands that
//!   all belong to one action.
//! - `Clear` and `Undo` are structural: they edit the shared history rather
//!   than add to it, and carry no payload.

use serde::{Deserialize, Serialize};

// =============================================================================
// COLOR
// =============================================================================

/// RGB color carried by drawing commands. Survives the wire losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255 };
}

// =============================================================================
// COMMAND
// =============================================================================

/// A single drawing mutation exchanged over the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// One straight line segment.
    Line {
        x: i32,
        y: i32,
        end_x: i32,
        end_y: i32,
        color: Color,
        #[serde(default)]
        new_action: bool,
    },
    /// One text placement. Always a complete action by itself.
    Text {
        x: i32,
        y: i32,
        text: String,
        color: Color,
        font_size: u32,
        #[serde(default)]
        new_action: bool,
    },
    /// Drop the entire canvas and undo history.
    Clear,
    /// Remove the most recent action, retaining it on the undo stack.
    Undo,
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The payload did not decode as a known command. The connection that
    /// produced it is treated as faulty and torn down.
    #[error("malformed command: {0}")]
    Malformed(#[from] serde_json::Error),
}

// =============================================================================
// WIRE CODEC
// =============================================================================

impl Command {
    /// Serialize for transport.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Malformed` if serialization fails.
    pub fn encode(&self) -> Result<String, CommandError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode one command from a wire payload.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Malformed` on unrecognized or corrupt input.
    pub fn decode(payload: &str) -> Result<Command, CommandError> {
        Ok(serde_json::from_str(payload)?)
    }
}

// =============================================================================
// PREDICATES
// =============================================================================

impl Command {
    /// Structural commands edit the action history instead of extending it.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Command::Clear | Command::Undo)
    }

    /// Whether this command opens a new action. Always false for structural
    /// commands.
    #[must_use]
    pub fn starts_new_action(&self) -> bool {
        match self {
            Command::Line { new_action, .. } | Command::Text { new_action, .. } => *new_action,
            Command::Clear | Command::Undo => false,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_round_trip() {
        let original = Command::Line {
            x: 0,
            y: 0,
            end_x: 10,
            end_y: 0,
            color: Color::BLACK,
            new_action: true,
        };
        let json = original.encode().expect("encode");
        let restored = Command::decode(&json).expect("decode");
        assert_eq!(restored, original);
    }

    #[test]
    fn text_round_trip_keeps_color_and_font() {
        let original = Command::Text {
            x: 40,
            y: 80,
            text: "hello".into(),
            color: Color::RED,
            font_size: 24,
            new_action: true,
        };
        let json = original.encode().expect("encode");
        let restored = Command::decode(&json).expect("decode");
        assert_eq!(restored, original);
    }

    #[test]
    fn structural_commands_have_bare_tags() {
        assert_eq!(Command::Clear.encode().expect("encode"), r#"{"type":"clear"}"#);
        assert_eq!(Command::Undo.encode().expect("encode"), r#"{"type":"undo"}"#);
        assert_eq!(Command::decode(r#"{"type":"clear"}"#).expect("decode"), Command::Clear);
        assert_eq!(Command::decode(r#"{"type":"undo"}"#).expect("decode"), Command::Undo);
    }

    #[test]
    fn missing_new_action_defaults_to_continuation() {
        let json = r#"{"type":"line","x":1,"y":2,"end_x":3,"end_y":4,"color":{"r":0,"g":0,"b":0}}"#;
        let cmd = Command::decode(json).expect("decode");
        assert!(!cmd.starts_new_action());
    }

    #[test]
    fn corrupt_payload_is_malformed() {
        assert!(matches!(Command::decode("not json"), Err(CommandError::Malformed(_))));
    }

    #[test]
    fn unknown_tag_is_malformed() {
        assert!(matches!(
            Command::decode(r#"{"type":"redo"}"#),
            Err(CommandError::Malformed(_))
        ));
    }

    #[test]
    fn structural_predicate() {
        assert!(Command::Clear.is_structural());
        assert!(Command::Undo.is_structural());
        assert!(
            !Command::Line { x: 0, y: 0, end_x: 1, end_y: 1, color: Color::BLACK, new_action: true }
                .is_structural()
        );
        assert!(!Command::Clear.starts_new_action());
    }
}
