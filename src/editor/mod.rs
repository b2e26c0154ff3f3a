// ── Editor component abstraction ──────────────────────────────────────────────
//
// The search helper and the window shell talk to the text widget only through
// the two traits below.  `ScintillaView` (Windows) and `MemoryBuffer` (every
// platform, used headless and in tests) implement both.
//
// Positions are byte offsets into UTF-8 text, matching Scintilla's native
// addressing.  Columns are character counts within a line, excluding the line
// terminator.

pub mod memory;

#[cfg(windows)]
pub mod scintilla;

use crate::search::SearchFlags;
use crate::settings::FontSpec;

// ── Selection ─────────────────────────────────────────────────────────────────

/// The single active selection: `anchor` is the fixed end, `caret` the moving
/// end (and the insertion point).  `anchor > caret` is a valid, reversed
/// selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: usize,
    pub caret: usize,
}

impl Selection {
    pub fn new(anchor: usize, caret: usize) -> Self {
        Self { anchor, caret }
    }

    /// A zero-width selection at `pos`.
    pub fn caret_at(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn start(self) -> usize {
        self.anchor.min(self.caret)
    }

    pub fn end(self) -> usize {
        self.anchor.max(self.caret)
    }

    pub fn is_empty(self) -> bool {
        self.anchor == self.caret
    }
}

/// A half-open byte range `[start, end)` reported by a search primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
}

// ── TextBuffer ────────────────────────────────────────────────────────────────

/// The addressing and search capability the find / replace / goto helper
/// needs from a text widget.
///
/// Implementations clamp out-of-range offsets, lines and columns rather than
/// failing; none of these operations can error.
pub trait TextBuffer {
    /// The full document text.
    fn text(&self) -> String;

    /// The text covered by the current selection (empty for a bare caret).
    fn selected_text(&self) -> String;

    fn selection(&self) -> Selection;

    /// Set the selection anchor and caret.
    fn set_selection(&mut self, anchor: usize, caret: usize);

    /// The caret offset.
    fn insertion_point(&self) -> usize;

    /// Move the caret to `pos`, collapsing the selection.
    fn set_insertion_point(&mut self, pos: usize);

    /// Convert an offset to 0-based `(line, column)`.
    fn offset_to_line_column(&self, offset: usize) -> (usize, usize);

    /// Convert 0-based `(line, column)` to an offset.
    fn line_column_to_offset(&self, line: usize, column: usize) -> usize;

    /// Number of lines; always at least 1.
    fn line_count(&self) -> usize;

    /// Length of `line` in characters, excluding the terminator.
    fn line_length(&self, line: usize) -> usize;

    /// First match of `pattern` starting at or after `anchor`.
    ///
    /// Only the match-case and whole-word bits of `flags` are meaningful
    /// here; direction is given by the method.
    fn search_forward(&mut self, anchor: usize, pattern: &str, flags: SearchFlags) -> Option<Span>;

    /// Last match of `pattern` lying wholly before `anchor`.
    fn search_backward(&mut self, anchor: usize, pattern: &str, flags: SearchFlags)
        -> Option<Span>;

    /// Replace the bytes in `[start, end)` with `text`.
    fn replace_range(&mut self, start: usize, end: usize, text: &str);

    /// Replace the current selection with `text`, leaving the caret after it.
    fn replace_selection(&mut self, text: &str);

    /// Scroll so that `offset` is visible.
    fn ensure_visible(&mut self, offset: usize);

    /// Group subsequent edits into a single undo step.
    fn begin_undo_action(&mut self) {}

    /// Close the group opened by `begin_undo_action`.
    fn end_undo_action(&mut self) {}
}

// ── EditorSurface ─────────────────────────────────────────────────────────────

/// Widget-native operations driven directly by the Edit and View menus.
pub trait EditorSurface: TextBuffer {
    /// Replace all text and reset the undo history.
    fn set_text(&mut self, text: &str);

    fn undo(&mut self);
    fn redo(&mut self);
    fn can_undo(&self) -> bool;
    fn can_redo(&self) -> bool;

    fn cut(&mut self);
    fn copy(&mut self);
    fn paste(&mut self);
    fn select_all(&mut self);

    /// `true` when the text differs from the last save point.
    fn is_modified(&self) -> bool;

    /// Record the current text as the on-disk state.
    fn set_save_point(&mut self);

    fn set_font(&mut self, font: &FontSpec);

    /// Width in pixels of the line-number margin; 0 hides it.
    fn set_line_number_margin(&mut self, width: u32);
}

// ── Notifications ─────────────────────────────────────────────────────────────

/// Scintilla `SCN_*` notification codes, as delivered in `NMHDR::code`.
pub const SCN_SAVEPOINTREACHED: u32 = 2002;
pub const SCN_SAVEPOINTLEFT: u32 = 2003;
pub const SCN_UPDATEUI: u32 = 2007;
pub const SCN_MODIFIED: u32 = 2008;

/// Widget notifications the shell reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// First edit after the save point (any edit: typing, delete, paste,
    /// replace, redo).
    SavePointLeft,
    /// Back at the save point, e.g. via undo.
    SavePointReached,
    /// Caret or selection moved.
    UpdateUi,
    /// Text changed.
    Modified,
}

impl Notification {
    /// Decode a notification code; codes the shell ignores yield `None`.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            SCN_SAVEPOINTLEFT => Some(Self::SavePointLeft),
            SCN_SAVEPOINTREACHED => Some(Self::SavePointReached),
            SCN_UPDATEUI => Some(Self::UpdateUi),
            SCN_MODIFIED => Some(Self::Modified),
            _ => None,
        }
    }
}

// ── Line-number margin ────────────────────────────────────────────────────────

/// Pixel width reserved per digit in the line-number margin.
pub const MARGIN_DIGIT_WIDTH: u32 = 12;

/// Margin width for a document of `line_count` lines, or 0 when hidden.
///
/// Grows with the number of decimal digits in the line count so the numbers
/// never clip.
pub fn line_number_margin_width(line_count: usize, visible: bool) -> u32 {
    if !visible {
        return 0;
    }
    let mut digits = 1u32;
    let mut n = line_count.max(1) / 10;
    while n > 0 {
        digits += 1;
        n /= 10;
    }
    MARGIN_DIGIT_WIDTH * digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_orders_reversed_endpoints() {
        let sel = Selection::new(9, 4);
        assert_eq!(sel.start(), 4);
        assert_eq!(sel.end(), 9);
        assert!(!sel.is_empty());
        assert!(Selection::caret_at(3).is_empty());
    }

    #[test]
    fn save_point_codes_decode() {
        assert_eq!(Notification::from_code(2003), Some(Notification::SavePointLeft));
        assert_eq!(Notification::from_code(2002), Some(Notification::SavePointReached));
        assert_eq!(Notification::from_code(2007), Some(Notification::UpdateUi));
        assert_eq!(Notification::from_code(2008), Some(Notification::Modified));
        // SCN_CHARADDED: typing also leaves the save point via 2003.
        assert_eq!(Notification::from_code(2001), None);
    }

    #[test]
    fn margin_hidden_is_zero() {
        assert_eq!(line_number_margin_width(5000, false), 0);
    }

    #[test]
    fn margin_grows_per_digit() {
        assert_eq!(line_number_margin_width(1, true), MARGIN_DIGIT_WIDTH);
        assert_eq!(line_number_margin_width(9, true), MARGIN_DIGIT_WIDTH);
        assert_eq!(line_number_margin_width(10, true), 2 * MARGIN_DIGIT_WIDTH);
        assert_eq!(line_number_margin_width(999, true), 3 * MARGIN_DIGIT_WIDTH);
        assert_eq!(line_number_margin_width(1000, true), 4 * MARGIN_DIGIT_WIDTH);
    }

    #[test]
    fn margin_treats_empty_document_as_one_line() {
        assert_eq!(line_number_margin_width(0, true), MARGIN_DIGIT_WIDTH);
    }
}
