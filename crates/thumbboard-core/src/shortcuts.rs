//! Keyboard shortcut registry.

use crate::input::Modifiers;
use crate::model::DrawKind;
use crate::tools::ToolKind;

/// What a shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SelectAll,
    Undo,
    Redo,
    DeleteSelection,
    /// Cancel the current gesture, close dialogs, clear selection.
    Cancel,
    ZoomIn,
    ZoomOut,
    ResetView,
    FitToContent,
    ToggleLock,
    ToggleSidebar,
    Tool(ToolKind),
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    /// Ctrl, or Cmd on macOS.
    pub ctrl: bool,
    pub shift: bool,
    pub command: Command,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        command: Command,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            command,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    fn matches(&self, key: &str, modifiers: &Modifiers) -> bool {
        self.key.eq_ignore_ascii_case(key)
            && self.ctrl == modifiers.command()
            && self.shift == modifiers.shift
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    pub fn all() -> Vec<Shortcut> {
        use Command::*;
        vec![
            Shortcut::new("A", true, false, SelectAll, "Select all"),
            Shortcut::new("Z", true, false, Undo, "Undo"),
            Shortcut::new("Z", true, true, Redo, "Redo"),
            Shortcut::new("Y", true, false, Redo, "Redo"),
            Shortcut::new("Delete", false, false, DeleteSelection, "Delete selected"),
            Shortcut::new("Backspace", false, false, DeleteSelection, "Delete selected"),
            Shortcut::new("Escape", false, false, Cancel, "Cancel current action"),
            Shortcut::new("=", false, false, ZoomIn, "Zoom in"),
            Shortcut::new("+", false, true, ZoomIn, "Zoom in"),
            Shortcut::new("-", false, false, ZoomOut, "Zoom out"),
            Shortcut::new("0", true, false, ResetView, "Reset view"),
            Shortcut::new("1", false, true, FitToContent, "Zoom to fit"),
            Shortcut::new("L", true, true, ToggleLock, "Lock/unlock selected thumbnails"),
            Shortcut::new("B", true, false, ToggleSidebar, "Toggle sidebar"),
            Shortcut::new("V", false, false, Tool(ToolKind::Select), "Select tool"),
            Shortcut::new("H", false, false, Tool(ToolKind::Pan), "Pan tool"),
            Shortcut::new("P", false, false, Tool(ToolKind::Draw(DrawKind::Freehand)), "Pen"),
            Shortcut::new("L", false, false, Tool(ToolKind::Draw(DrawKind::Line)), "Line"),
            Shortcut::new("R", false, false, Tool(ToolKind::Draw(DrawKind::Rectangle)), "Rectangle"),
            Shortcut::new("O", false, false, Tool(ToolKind::Draw(DrawKind::Circle)), "Circle"),
            Shortcut::new("E", false, false, Tool(ToolKind::Eraser), "Eraser"),
            Shortcut::new("C", false, false, Tool(ToolKind::Comment), "Comment"),
            Shortcut::new("T", false, false, Tool(ToolKind::Label), "Text label"),
        ]
    }

    /// Find the command bound to a key press.
    pub fn resolve(key: &str, modifiers: &Modifiers) -> Option<Command> {
        Self::all()
            .into_iter()
            .find(|s| s.matches(key, modifiers))
            .map(|s| s.command)
    }

    /// Shortcut table for `--help` style output.
    pub fn describe() -> String {
        Self::all()
            .iter()
            .map(|s| format!("  {:20} {}", s.format(), s.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        assert_eq!(
            ShortcutRegistry::resolve("z", &Modifiers::ctrl()),
            Some(Command::Undo)
        );
        let cmd_shift = Modifiers {
            meta: true,
            shift: true,
            ..Modifiers::NONE
        };
        assert_eq!(ShortcutRegistry::resolve("Z", &cmd_shift), Some(Command::Redo));
        assert_eq!(
            ShortcutRegistry::resolve("e", &Modifiers::NONE),
            Some(Command::Tool(ToolKind::Eraser))
        );
        assert_eq!(ShortcutRegistry::resolve("q", &Modifiers::NONE), None);
        // Plain "z" is not undo.
        assert_eq!(ShortcutRegistry::resolve("z", &Modifiers::NONE), None);
    }

    #[test]
    fn test_format() {
        let redo = ShortcutRegistry::all()
            .into_iter()
            .find(|s| s.command == Command::Redo)
            .unwrap();
        assert_eq!(redo.format(), "Ctrl+Shift+Z");
        assert!(ShortcutRegistry::describe().contains("Delete selected"));
    }
}
