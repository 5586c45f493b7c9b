//! Replica state machine — one peer's view of the shared canvas.
//!
//! DESIGN
//! ======
//! A `Replica` owns the ordered action history and undo stack for one peer
//! and is the only code that mutates them. Commands reach it from two paths
//! with identical folding rules:
//! - `apply_local` — the user's own gesture; folds, then queues the command
//!   for the relay.
//! - `apply_remote` — a command received from the network; folds only.
//!
//! The relay never echoes a command back to its originator, so the two paths
//! together apply each logical command exactly once.
//!
//! Action order is the visual stacking order: later actions paint over
//! earlier ones. The undo stack receives actions removed by `Undo` and is
//! emptied by `Clear`; it is never popped (redo is out of scope).
//!
//! CONCURRENCY
//! ===========
//! `Replica` is not internally synchronized. The owning peer wraps it in a
//! mutex so gesture input, network receive, and rendering reads all share
//! one mutual-exclusion scope and `current_drawable` never observes an
//! action mid-append.

use tokio::sync::mpsc;

use crate::command::{Color, Command};

// =============================================================================
// ACTION
// =============================================================================

/// One atomic group of drawing commands: a single continuous user gesture
/// (one drag, or one text placement). Non-empty by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    commands: Vec<Command>,
}

impl Action {
    fn open(first: Command) -> Self {
        Self { commands: vec![first] }
    }

    fn append(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// The commands in this action, in the order they were drawn.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

// =============================================================================
// TOOL STATE
// =============================================================================

/// How subsequent pointer gestures are packaged into commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Draw,
    Text,
}

/// In-progress drag: the anchor for the next line segment.
#[derive(Debug, Clone, Copy)]
struct Drag {
    x: i32,
    y: i32,
    /// True until the first segment is emitted.
    fresh: bool,
}

// =============================================================================
// REPLICA
// =============================================================================

pub struct Replica {
    actions: Vec<Action>,
    undo_stack: Vec<Action>,
    mode: Mode,
    color: Color,
    font_size: u32,
    drag: Option<Drag>,
    outbound: mpsc::UnboundedSender<Command>,
}

impl Replica {
    /// Create an empty replica. Commands applied locally are queued on
    /// `outbound` for delivery to the relay.
    #[must_use]
    pub fn new(outbound: mpsc::UnboundedSender<Command>) -> Self {
        Self {
            actions: Vec::new(),
            undo_stack: Vec::new(),
            mode: Mode::Draw,
            color: Color::BLACK,
            font_size: 16,
            drag: None,
            outbound,
        }
    }

    // -------------------------------------------------------------------------
    // Command application
    // -------------------------------------------------------------------------

    /// Apply a command received from the network, in arrival order.
    pub fn apply_remote(&mut self, command: Command) {
        self.fold(command);
    }

    /// Apply a locally produced command and queue it for the relay.
    pub fn apply_local(&mut self, command: Command) {
        self.fold(command.clone());
        // A closed channel means the connection is gone; local folding
        // continues so the user can keep drawing.
        let _ = self.outbound.send(command);
    }

    /// Fold one command into the action history. Shared by both paths.
    fn fold(&mut self, command: Command) {
        match command {
            Command::Clear => {
                self.actions.clear();
                self.undo_stack.clear();
            }
            Command::Undo => {
                // Undo on an empty canvas is a no-op, not an error.
                if let Some(action) = self.actions.pop() {
                    self.undo_stack.push(action);
                }
            }
            command => match self.actions.last_mut() {
                Some(last) if !command.starts_new_action() => last.append(command),
                _ => self.actions.push(Action::open(command)),
            },
        }
    }

    /// Snapshot of the current canvas for rendering, in stacking order.
    #[must_use]
    pub fn current_drawable(&self) -> Vec<Action> {
        self.actions.clone()
    }

    // -------------------------------------------------------------------------
    // Gesture packaging
    // -------------------------------------------------------------------------

    /// Pointer pressed. In draw mode this opens a new action; the first
    /// subsequent move emits its segment with `new_action` set.
    pub fn pointer_down(&mut self, x: i32, y: i32) {
        if self.mode == Mode::Draw {
            self.drag = Some(Drag { x, y, fresh: true });
        }
    }

    /// Pointer moved with the button held. Emits one line segment from the
    /// previous point, continuing the open action.
    pub fn pointer_moved(&mut self, x: i32, y: i32) {
        let Some(drag) = self.drag else { return };
        self.drag = Some(Drag { x, y, fresh: false });
        self.apply_local(Command::Line {
            x: drag.x,
            y: drag.y,
            end_x: x,
            end_y: y,
            color: self.color,
            new_action: drag.fresh,
        });
    }

    /// Pointer released. Closes the in-progress action.
    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// Place text at a point. A text placement is immediately a complete,
    /// closed action. Blank text is ignored.
    pub fn place_text(&mut self, x: i32, y: i32, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        self.apply_local(Command::Text {
            x,
            y,
            text: text.to_string(),
            color: self.color,
            font_size: self.font_size,
            new_action: true,
        });
    }

    /// Clear the whiteboard for every peer.
    pub fn clear_whiteboard(&mut self) {
        self.apply_local(Command::Clear);
    }

    /// Undo the most recent action for every peer.
    pub fn undo_last_action(&mut self) {
        self.apply_local(Command::Undo);
    }

    // -------------------------------------------------------------------------
    // Tool configuration (local only, no network effect)
    // -------------------------------------------------------------------------

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_font_size(&mut self, size: u32) {
        self.font_size = size;
    }
}

#[cfg(test)]
#[path = "replica_test.rs"]
mod tests;
