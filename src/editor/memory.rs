// ── In-memory text widget ─────────────────────────────────────────────────────
//
// A pure-Rust stand-in for the native editor control.  It mirrors the parts
// of Scintilla's behaviour the application relies on (byte addressing,
// anchor/caret selection, anchored forward/backward search, save point,
// grouped undo) so the search helper and document logic can run headless.

use super::{EditorSurface, Selection, Span, TextBuffer};
use crate::search::SearchFlags;
use crate::settings::FontSpec;

/// One undo/redo record: the full text and selection before an edit.
#[derive(Debug, Clone)]
struct Snapshot {
    text: String,
    selection: Selection,
    revision: u64,
}

/// Headless `TextBuffer` + `EditorSurface` implementation.
#[derive(Debug, Default)]
pub struct MemoryBuffer {
    text: String,
    selection: Selection,
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    /// Identity of the current text state; compared against `saved_revision`.
    revision: u64,
    next_revision: u64,
    saved_revision: u64,
    group_depth: usize,
    group_recorded: bool,
    clipboard: String,
    font: Option<FontSpec>,
    margin_width: u32,
    scrolled_to: Option<usize>,
}

impl MemoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer holding `text`, caret at 0, unmodified.
    pub fn with_text(text: &str) -> Self {
        let mut buf = Self::new();
        buf.set_text(text);
        buf.set_save_point();
        buf
    }

    pub fn font(&self) -> Option<&FontSpec> {
        self.font.as_ref()
    }

    pub fn margin_width(&self) -> u32 {
        self.margin_width
    }

    pub fn clipboard(&self) -> &str {
        &self.clipboard
    }

    /// Line most recently scrolled into view by `ensure_visible`.
    pub fn scrolled_to_line(&self) -> Option<usize> {
        self.scrolled_to
    }

    // ── Addressing helpers ────────────────────────────────────────────────────

    /// Clamp `pos` into the text and back onto a char boundary.
    fn clamp(&self, pos: usize) -> usize {
        let mut p = pos.min(self.text.len());
        while !self.text.is_char_boundary(p) {
            p -= 1;
        }
        p
    }

    fn line_starts(&self) -> Vec<usize> {
        std::iter::once(0)
            .chain(self.text.match_indices('\n').map(|(i, _)| i + 1))
            .collect()
    }

    /// Byte range of `line`'s content, terminator excluded.
    fn line_content(&self, line: usize) -> (usize, usize) {
        let starts = self.line_starts();
        let line = line.min(starts.len() - 1);
        let start = starts[line];
        let end = match starts.get(line + 1) {
            Some(&next) => {
                let mut end = next - 1;
                if end > start && self.text.as_bytes()[end - 1] == b'\r' {
                    end -= 1;
                }
                end
            }
            None => self.text.len(),
        };
        (start, end)
    }

    // ── Search helpers ────────────────────────────────────────────────────────

    /// End offset of a match of `pattern` starting at `at`, if any.
    fn match_at(&self, at: usize, pattern: &str, flags: SearchFlags) -> Option<usize> {
        let mut rest = self.text[at..].char_indices();
        for pc in pattern.chars() {
            let (_, tc) = rest.next()?;
            if !chars_equal(tc, pc, flags.match_case()) {
                return None;
            }
        }
        let end = rest.next().map_or(self.text.len(), |(i, _)| at + i);

        if flags.whole_word() {
            let before = self.text[..at].chars().next_back();
            let after = self.text[end..].chars().next();
            if before.is_some_and(is_word_char) || after.is_some_and(is_word_char) {
                return None;
            }
        }
        Some(end)
    }

    // ── Undo bookkeeping ──────────────────────────────────────────────────────

    /// Called before every text mutation.
    fn record_edit(&mut self) {
        if self.group_depth == 0 || !self.group_recorded {
            self.undo.push(Snapshot {
                text: self.text.clone(),
                selection: self.selection,
                revision: self.revision,
            });
            self.redo.clear();
            if self.group_depth > 0 {
                self.group_recorded = true;
            }
        }
        self.next_revision += 1;
        self.revision = self.next_revision;
    }

    fn restore(&mut self, snap: Snapshot) -> Snapshot {
        let current = Snapshot {
            text: std::mem::replace(&mut self.text, snap.text),
            selection: self.selection,
            revision: self.revision,
        };
        self.selection = snap.selection;
        self.revision = snap.revision;
        current
    }
}

fn chars_equal(a: char, b: char, match_case: bool) -> bool {
    if match_case {
        a == b
    } else {
        a == b || a.to_lowercase().eq(b.to_lowercase())
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Where a position ends up after `[start, end)` is replaced by `inserted` bytes.
fn shift_position(pos: usize, start: usize, end: usize, inserted: usize) -> usize {
    if pos <= start {
        pos
    } else if pos >= end {
        pos - (end - start) + inserted
    } else {
        start
    }
}

// ── TextBuffer ────────────────────────────────────────────────────────────────

impl TextBuffer for MemoryBuffer {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn selected_text(&self) -> String {
        self.text[self.selection.start()..self.selection.end()].to_owned()
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn set_selection(&mut self, anchor: usize, caret: usize) {
        self.selection = Selection::new(self.clamp(anchor), self.clamp(caret));
    }

    fn insertion_point(&self) -> usize {
        self.selection.caret
    }

    fn set_insertion_point(&mut self, pos: usize) {
        self.selection = Selection::caret_at(self.clamp(pos));
    }

    fn offset_to_line_column(&self, offset: usize) -> (usize, usize) {
        let offset = self.clamp(offset);
        let starts = self.line_starts();
        let line = starts.partition_point(|&s| s <= offset) - 1;
        let column = self.text[starts[line]..offset].chars().count();
        (line, column)
    }

    fn line_column_to_offset(&self, line: usize, column: usize) -> usize {
        let (start, end) = self.line_content(line);
        self.text[start..end]
            .char_indices()
            .nth(column)
            .map_or(end, |(i, _)| start + i)
    }

    fn line_count(&self) -> usize {
        self.line_starts().len()
    }

    fn line_length(&self, line: usize) -> usize {
        let (start, end) = self.line_content(line);
        self.text[start..end].chars().count()
    }

    fn search_forward(&mut self, anchor: usize, pattern: &str, flags: SearchFlags) -> Option<Span> {
        if pattern.is_empty() {
            return None;
        }
        let anchor = self.clamp(anchor);
        self.text[anchor..]
            .char_indices()
            .map(|(i, _)| anchor + i)
            .find_map(|at| self.match_at(at, pattern, flags).map(|end| Span::new(at, end)))
    }

    fn search_backward(
        &mut self,
        anchor: usize,
        pattern: &str,
        flags: SearchFlags,
    ) -> Option<Span> {
        if pattern.is_empty() {
            return None;
        }
        let anchor = self.clamp(anchor);
        self.text[..anchor]
            .char_indices()
            .rev()
            .filter_map(|(at, _)| self.match_at(at, pattern, flags).map(|end| Span::new(at, end)))
            .find(|span| span.end <= anchor)
    }

    fn replace_range(&mut self, start: usize, end: usize, text: &str) {
        let (start, end) = {
            let (a, b) = (self.clamp(start), self.clamp(end));
            (a.min(b), a.max(b))
        };
        self.record_edit();
        self.text.replace_range(start..end, text);
        self.selection = Selection::new(
            shift_position(self.selection.anchor, start, end, text.len()),
            shift_position(self.selection.caret, start, end, text.len()),
        );
    }

    fn replace_selection(&mut self, text: &str) {
        let start = self.selection.start();
        let end = self.selection.end();
        self.replace_range(start, end, text);
        self.selection = Selection::caret_at(start + text.len());
    }

    fn ensure_visible(&mut self, offset: usize) {
        self.scrolled_to = Some(self.offset_to_line_column(offset).0);
    }

    fn begin_undo_action(&mut self) {
        if self.group_depth == 0 {
            self.group_recorded = false;
        }
        self.group_depth += 1;
    }

    fn end_undo_action(&mut self) {
        self.group_depth = self.group_depth.saturating_sub(1);
    }
}

// ── EditorSurface ─────────────────────────────────────────────────────────────

impl EditorSurface for MemoryBuffer {
    fn set_text(&mut self, text: &str) {
        self.text = text.to_owned();
        self.selection = Selection::default();
        self.undo.clear();
        self.redo.clear();
        self.next_revision += 1;
        self.revision = self.next_revision;
    }

    fn undo(&mut self) {
        if let Some(snap) = self.undo.pop() {
            let current = self.restore(snap);
            self.redo.push(current);
        }
    }

    fn redo(&mut self) {
        if let Some(snap) = self.redo.pop() {
            let current = self.restore(snap);
            self.undo.push(current);
        }
    }

    fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    fn cut(&mut self) {
        if !self.selection.is_empty() {
            self.copy();
            self.replace_selection("");
        }
    }

    fn copy(&mut self) {
        if !self.selection.is_empty() {
            self.clipboard = self.selected_text();
        }
    }

    fn paste(&mut self) {
        let clip = self.clipboard.clone();
        self.replace_selection(&clip);
    }

    fn select_all(&mut self) {
        self.selection = Selection::new(0, self.text.len());
    }

    fn is_modified(&self) -> bool {
        self.revision != self.saved_revision
    }

    fn set_save_point(&mut self) {
        self.saved_revision = self.revision;
    }

    fn set_font(&mut self, font: &FontSpec) {
        self.font = Some(font.clone());
    }

    fn set_line_number_margin(&mut self, width: u32) {
        self.margin_width = width;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::line_number_margin_width;

    #[test]
    fn surface_records_font_and_margin() {
        let mut buf = MemoryBuffer::new();
        assert!(buf.font().is_none());
        assert_eq!(buf.margin_width(), 0);

        let font = FontSpec {
            face: "Consolas".to_owned(),
            size: 11,
            bold: true,
            italic: false,
        };
        buf.set_font(&font);
        assert_eq!(buf.font(), Some(&font));

        buf.set_line_number_margin(line_number_margin_width(120, true));
        assert_eq!(buf.margin_width(), 36);
        buf.set_line_number_margin(line_number_margin_width(120, false));
        assert_eq!(buf.margin_width(), 0);
    }

    #[test]
    fn line_column_round_trip_on_crlf_text() {
        let buf = MemoryBuffer::with_text("ab\r\ncde\r\nf");
        assert_eq!(buf.line_count(), 3);
        assert_eq!(buf.line_length(0), 2);
        assert_eq!(buf.line_length(1), 3);
        let off = buf.line_column_to_offset(1, 2);
        assert_eq!(off, 6);
        assert_eq!(buf.offset_to_line_column(off), (1, 2));
    }

    #[test]
    fn line_column_clamps_out_of_range() {
        let buf = MemoryBuffer::with_text("one\ntwo");
        assert_eq!(buf.line_column_to_offset(0, 99), 3);
        assert_eq!(buf.line_column_to_offset(42, 1), 5);
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let buf = MemoryBuffer::with_text("héllo");
        assert_eq!(buf.line_length(0), 5);
        assert_eq!(buf.line_column_to_offset(0, 2), 3);
        assert_eq!(buf.offset_to_line_column(3), (0, 2));
    }

    #[test]
    fn search_forward_respects_anchor() {
        let mut buf = MemoryBuffer::with_text("foo bar foo");
        let hit = buf.search_forward(1, "foo", SearchFlags::empty());
        assert_eq!(hit, Some(Span::new(8, 11)));
        assert_eq!(buf.search_forward(9, "foo", SearchFlags::empty()), None);
    }

    #[test]
    fn search_is_case_insensitive_unless_requested() {
        let mut buf = MemoryBuffer::with_text("Hello hello");
        assert_eq!(
            buf.search_forward(0, "hello", SearchFlags::empty()),
            Some(Span::new(0, 5))
        );
        assert_eq!(
            buf.search_forward(0, "hello", SearchFlags::MATCH_CASE),
            Some(Span::new(6, 11))
        );
    }

    #[test]
    fn whole_word_skips_embedded_matches() {
        let mut buf = MemoryBuffer::with_text("cat concat cat_ cat.");
        assert_eq!(
            buf.search_forward(1, "cat", SearchFlags::WHOLE_WORD),
            Some(Span::new(16, 19))
        );
    }

    #[test]
    fn search_backward_finds_match_wholly_before_anchor() {
        let mut buf = MemoryBuffer::with_text("foofoofoo");
        assert_eq!(
            buf.search_backward(6, "foo", SearchFlags::empty()),
            Some(Span::new(3, 6))
        );
        assert_eq!(
            buf.search_backward(5, "foo", SearchFlags::empty()),
            Some(Span::new(0, 3))
        );
        assert_eq!(buf.search_backward(2, "foo", SearchFlags::empty()), None);
    }

    #[test]
    fn empty_pattern_never_matches() {
        let mut buf = MemoryBuffer::with_text("abc");
        assert_eq!(buf.search_forward(0, "", SearchFlags::empty()), None);
        assert_eq!(buf.search_backward(3, "", SearchFlags::empty()), None);
    }

    #[test]
    fn replace_range_shifts_selection_after_edit() {
        let mut buf = MemoryBuffer::with_text("abc def");
        buf.set_selection(4, 7);
        buf.replace_range(0, 3, "x");
        assert_eq!(buf.text(), "x def");
        assert_eq!(buf.selection(), Selection::new(2, 5));
    }

    #[test]
    fn undo_and_redo_track_save_point() {
        let mut buf = MemoryBuffer::with_text("abc");
        assert!(!buf.is_modified());
        buf.replace_range(0, 1, "z");
        assert!(buf.is_modified());
        buf.undo();
        assert_eq!(buf.text(), "abc");
        assert!(!buf.is_modified());
        assert!(buf.can_redo());
        buf.redo();
        assert_eq!(buf.text(), "zbc");
        assert!(buf.is_modified());
    }

    #[test]
    fn grouped_edits_undo_in_one_step() {
        let mut buf = MemoryBuffer::with_text("a-a");
        buf.begin_undo_action();
        buf.replace_range(0, 1, "b");
        buf.replace_range(2, 3, "b");
        buf.end_undo_action();
        assert_eq!(buf.text(), "b-b");
        buf.undo();
        assert_eq!(buf.text(), "a-a");
        assert!(!buf.can_undo());
    }

    #[test]
    fn cut_then_paste_moves_text() {
        let mut buf = MemoryBuffer::with_text("hello world");
        buf.set_selection(0, 6);
        buf.cut();
        assert_eq!(buf.text(), "world");
        assert_eq!(buf.clipboard(), "hello ");
        buf.set_insertion_point(5);
        buf.paste();
        assert_eq!(buf.text(), "worldhello ");
        assert_eq!(buf.insertion_point(), 11);
    }

    #[test]
    fn cut_with_empty_selection_does_nothing() {
        let mut buf = MemoryBuffer::with_text("keep");
        buf.cut();
        assert_eq!(buf.text(), "keep");
        assert!(!buf.can_undo());
    }

    #[test]
    fn select_all_covers_whole_text() {
        let mut buf = MemoryBuffer::with_text("xyz");
        buf.select_all();
        assert_eq!(buf.selected_text(), "xyz");
    }

    #[test]
    fn offsets_inside_multibyte_chars_are_clamped_down() {
        let mut buf = MemoryBuffer::with_text("é");
        buf.set_insertion_point(1);
        assert_eq!(buf.insertion_point(), 0);
    }
}
