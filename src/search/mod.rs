// ── Find / replace / go-to ────────────────────────────────────────────────────
//
// Widget-independent search and navigation helper.  Everything here works
// against the `TextBuffer` trait; the Win32 find dialog and the menu handlers
// in `platform::win32::window` are thin callers.

use std::ops::{BitOr, BitOrAssign};

use log::debug;
use regex::Regex;

use crate::editor::TextBuffer;
use crate::error::Result;

// ── SearchFlags ───────────────────────────────────────────────────────────────

/// Search flag bitset.
///
/// Bit 0 selects the direction.  The whole-word and match-case bits share
/// Scintilla's `SCFIND_WHOLEWORD` / `SCFIND_MATCHCASE` values so they can be
/// handed to `SCI_SETSEARCHFLAGS` unchanged; any other bits ride along
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SearchFlags(u32);

impl SearchFlags {
    pub const BACKWARD: Self = Self(0x1);
    pub const WHOLE_WORD: Self = Self(0x2);
    pub const MATCH_CASE: Self = Self(0x4);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn backward(self) -> bool {
        self.contains(Self::BACKWARD)
    }

    pub const fn whole_word(self) -> bool {
        self.contains(Self::WHOLE_WORD)
    }

    pub const fn match_case(self) -> bool {
        self.contains(Self::MATCH_CASE)
    }

    /// Translate find-dialog checkboxes.  The dialog reports "search down",
    /// so a cleared `down` is a backward search.
    pub const fn from_dialog(down: bool, match_case: bool, whole_word: bool) -> Self {
        let mut bits = 0;
        if !down {
            bits |= Self::BACKWARD.0;
        }
        if match_case {
            bits |= Self::MATCH_CASE.0;
        }
        if whole_word {
            bits |= Self::WHOLE_WORD.0;
        }
        Self(bits)
    }

    /// The same flags with the direction bit cleared, for the buffer's
    /// search primitive.
    pub const fn without_direction(self) -> Self {
        Self(self.0 & !Self::BACKWARD.0)
    }
}

impl BitOr for SearchFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SearchFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// ── SearchOptions ─────────────────────────────────────────────────────────────

/// Parameters of the last search issued from the Find / Replace dialog.
///
/// Stored so that Find Next / Find Previous can repeat the last search
/// without re-opening the dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub text: String,
    pub replacement: String,
    pub flags: SearchFlags,
}

impl SearchOptions {
    /// Flags for a repeat in the given direction, keeping case / word bits.
    pub fn repeat_flags(&self, backward: bool) -> SearchFlags {
        let flags = self.flags.without_direction();
        if backward {
            flags | SearchFlags::BACKWARD
        } else {
            flags
        }
    }
}

// ── SearchState ───────────────────────────────────────────────────────────────

/// Selection captured when a forward search starts, as
/// `(insertion point, anchor)`.
///
/// Restored verbatim when the search misses.  Only meaningful until the next
/// search or until the dialog closes; it is not a history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchState {
    last_search: (usize, usize),
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_search(&self) -> (usize, usize) {
        self.last_search
    }

    /// Forget the recorded selection.  Called when the find dialog closes.
    pub fn reset(&mut self) {
        self.last_search = (0, 0);
    }

    /// Find the next (or, with `SearchFlags::BACKWARD`, previous) occurrence
    /// of `query` and select it.
    ///
    /// An empty `query` searches for the currently selected text.  A forward
    /// search starts past the current selection so the selected occurrence is
    /// not matched again; if it misses, the pre-search selection is put back.
    /// A backward search that misses leaves the selection alone.  Neither
    /// direction wraps.
    ///
    /// Returns `true` when a match was selected.
    pub fn find<B>(&mut self, buf: &mut B, flags: SearchFlags, query: &str) -> bool
    where
        B: TextBuffer + ?Sized,
    {
        let query = if query.is_empty() {
            buf.selected_text()
        } else {
            query.to_owned()
        };
        let primitive_flags = flags.without_direction();

        let found = if flags.backward() {
            let anchor = buf.selection().start();
            match buf.search_backward(anchor, &query, primitive_flags) {
                Some(span) => {
                    buf.set_selection(span.start, span.end);
                    true
                }
                None => false,
            }
        } else {
            let sel = buf.selection();
            self.last_search = (buf.insertion_point(), sel.anchor);

            let anchor = sel.end();
            buf.set_insertion_point(anchor);
            match buf.search_forward(anchor, &query, primitive_flags) {
                Some(span) => {
                    buf.set_selection(span.start, span.end);
                    true
                }
                None => {
                    let (caret, anchor) = self.last_search;
                    buf.set_selection(anchor, caret);
                    false
                }
            }
        };

        let caret = buf.insertion_point();
        buf.ensure_visible(caret);
        debug!("find {query:?} flags={:#x} found={found}", flags.bits());
        found
    }
}

// ── Replace ───────────────────────────────────────────────────────────────────

/// Replace the current selection with `replace_with`, but only if the
/// selection is exactly `find`.
///
/// This does not search: it expects the caller to have just selected a match
/// with `SearchState::find`.  Returns `false` (and leaves the buffer alone)
/// when the guard fails.
pub fn replace<B>(buf: &mut B, replace_with: &str, find: &str) -> bool
where
    B: TextBuffer + ?Sized,
{
    if buf.selected_text() != find {
        return false;
    }
    buf.replace_selection(replace_with);
    true
}

/// Replace every match of the regular expression `pattern` with the literal
/// text `replace_with`.
///
/// Matches are collected in one pass over the unmodified text.  They are then
/// applied in ascending order, each at its original offset shifted by the
/// length change of the replacements before it, and each replacing exactly
/// the matched span.  All edits form a single undo step.
///
/// An empty pattern replaces nothing.  Returns the number of replacements.
pub fn replace_all<B>(buf: &mut B, replace_with: &str, pattern: &str) -> Result<usize>
where
    B: TextBuffer + ?Sized,
{
    if pattern.is_empty() {
        return Ok(0);
    }
    let re = Regex::new(pattern)?;
    let text = buf.text();
    let spans: Vec<(usize, usize)> = re.find_iter(&text).map(|m| (m.start(), m.end())).collect();
    if spans.is_empty() {
        return Ok(0);
    }

    buf.begin_undo_action();
    let mut delta: isize = 0;
    for &(start, end) in &spans {
        let shifted = start.saturating_add_signed(delta);
        buf.replace_range(shifted, shifted + (end - start), replace_with);
        delta += replace_with.len() as isize - (end - start) as isize;
    }
    buf.end_undo_action();

    debug!("replace all {pattern:?}: {} replacements", spans.len());
    Ok(spans.len())
}

// ── Go to ─────────────────────────────────────────────────────────────────────

/// Put an empty selection at 0-based (`line`, `column`).
///
/// Sets both selection ends rather than moving the insertion point, so no
/// range from the old caret is selected.
pub fn goto_location<B>(buf: &mut B, line: usize, column: usize)
where
    B: TextBuffer + ?Sized,
{
    let pos = buf.line_column_to_offset(line, column);
    buf.set_selection(pos, pos);
    buf.ensure_visible(pos);
}

/// Limits shown by the Go To dialog: lines are 1-based, columns 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GotoBounds {
    pub max_line: usize,
    pub max_column: usize,
}

impl GotoBounds {
    /// Bounds for `buf`, with the column limit taken from the (1-based)
    /// `selected_line`.
    pub fn for_line<B>(buf: &B, selected_line: usize) -> Self
    where
        B: TextBuffer + ?Sized,
    {
        let max_line = buf.line_count();
        let line = selected_line.clamp(1, max_line);
        Self {
            max_line,
            max_column: buf.line_length(line - 1),
        }
    }
}

/// A confirmed Go To dialog result: `line` is 1-based as the user typed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GotoRequest {
    pub line: usize,
    pub column: usize,
}

impl GotoRequest {
    /// Clamp to the buffer and convert to 0-based `(line, column)`.
    pub fn resolve<B>(self, buf: &B) -> (usize, usize)
    where
        B: TextBuffer + ?Sized,
    {
        let bounds = GotoBounds::for_line(buf, self.line);
        let line = self.line.clamp(1, bounds.max_line);
        (line - 1, self.column.min(bounds.max_column))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::editor::memory::MemoryBuffer;
    use crate::editor::{EditorSurface, Selection};
    use crate::error::TackError;

    fn fwd() -> SearchFlags {
        SearchFlags::empty()
    }

    #[test]
    fn forward_miss_restores_selection() {
        let mut buf = MemoryBuffer::with_text("abcXabcXabc");
        let mut state = SearchState::new();
        assert!(!state.find(&mut buf, fwd(), "XYZ"));
        assert_eq!(buf.selection(), Selection::new(0, 0));
    }

    #[test]
    fn forward_miss_restores_reversed_selection() {
        let mut buf = MemoryBuffer::with_text("abcXabcXabc");
        buf.set_selection(7, 4);
        let mut state = SearchState::new();
        assert!(!state.find(&mut buf, fwd(), "zzz"));
        assert_eq!(buf.selection(), Selection::new(7, 4));
        assert_eq!(state.last_search(), (4, 7));
    }

    #[test]
    fn forward_skips_current_occurrence() {
        let mut buf = MemoryBuffer::with_text("foofoofoo");
        buf.set_selection(0, 3);
        let mut state = SearchState::new();
        assert!(state.find(&mut buf, fwd(), "foo"));
        assert_eq!(buf.selection(), Selection::new(3, 6));
    }

    #[test]
    fn repeated_forward_find_walks_every_occurrence() {
        let mut buf = MemoryBuffer::with_text("foofoofoofoo");
        let mut state = SearchState::new();
        let mut starts = Vec::new();
        while state.find(&mut buf, fwd(), "foo") {
            starts.push(buf.selection().start());
        }
        assert_eq!(starts, vec![0, 3, 6, 9]);
        // The final miss leaves the last match selected.
        assert_eq!(buf.selected_text(), "foo");
        assert_eq!(buf.selection().start(), 9);
    }

    #[test]
    fn empty_query_searches_for_selection() {
        let mut buf = MemoryBuffer::with_text("one two one");
        buf.set_selection(0, 3);
        let mut state = SearchState::new();
        assert!(state.find(&mut buf, fwd(), ""));
        assert_eq!(buf.selection(), Selection::new(8, 11));
    }

    #[test]
    fn backward_find_selects_previous_match() {
        let mut buf = MemoryBuffer::with_text("foofoofoo");
        buf.set_selection(6, 9);
        let mut state = SearchState::new();
        assert!(state.find(&mut buf, SearchFlags::BACKWARD, "foo"));
        assert_eq!(buf.selection(), Selection::new(3, 6));
        // Backward search never touches the recorded forward state.
        assert_eq!(state.last_search(), (0, 0));
    }

    #[test]
    fn backward_miss_leaves_selection() {
        let mut buf = MemoryBuffer::with_text("foo bar");
        buf.set_selection(0, 3);
        let mut state = SearchState::new();
        assert!(!state.find(&mut buf, SearchFlags::BACKWARD, "foo"));
        assert_eq!(buf.selection(), Selection::new(0, 3));
    }

    #[test]
    fn find_passes_case_flag_through() {
        let mut buf = MemoryBuffer::with_text("Rust rust");
        let mut state = SearchState::new();
        assert!(state.find(&mut buf, SearchFlags::MATCH_CASE, "rust"));
        assert_eq!(buf.selection(), Selection::new(5, 9));
    }

    #[test]
    fn find_scrolls_match_into_view() {
        let mut buf = MemoryBuffer::with_text("a\nb\nneedle");
        let mut state = SearchState::new();
        assert!(state.find(&mut buf, fwd(), "needle"));
        assert_eq!(buf.scrolled_to_line(), Some(2));
    }

    #[test]
    fn replace_guard_is_silent_noop() {
        let mut buf = MemoryBuffer::with_text("foo bar");
        buf.set_selection(4, 7);
        assert!(!replace(&mut buf, "qux", "baz"));
        assert_eq!(buf.text(), "foo bar");
        assert_eq!(buf.selection(), Selection::new(4, 7));
        assert!(!buf.is_modified());
    }

    #[test]
    fn replace_swaps_matching_selection() {
        let mut buf = MemoryBuffer::with_text("foo baz");
        buf.set_selection(4, 7);
        assert!(replace(&mut buf, "qux", "baz"));
        assert_eq!(buf.text(), "foo qux");
    }

    #[test]
    fn find_then_replace_cycle() {
        let mut buf = MemoryBuffer::with_text("x = 1; x = 2;");
        let mut state = SearchState::new();
        while state.find(&mut buf, fwd(), "x") {
            replace(&mut buf, "y", "x");
        }
        assert_eq!(buf.text(), "y = 1; y = 2;");
    }

    #[test]
    fn replace_all_equal_length() {
        let mut buf = MemoryBuffer::with_text("a-a-a");
        assert_eq!(replace_all(&mut buf, "b", "a").unwrap(), 3);
        assert_eq!(buf.text(), "b-b-b");
    }

    // Offsets are collected once, then shifted by the running length change,
    // so a growing replacement does not land on stale positions.
    #[test]
    fn replace_all_growing_replacement_stays_aligned() {
        let mut buf = MemoryBuffer::with_text("aa");
        assert_eq!(replace_all(&mut buf, "bb", "a").unwrap(), 2);
        assert_eq!(buf.text(), "bbbb");
    }

    #[test]
    fn replace_all_shrinking_replacement_stays_aligned() {
        let mut buf = MemoryBuffer::with_text("foo.foo.foo");
        assert_eq!(replace_all(&mut buf, "x", "foo").unwrap(), 3);
        assert_eq!(buf.text(), "x.x.x");
    }

    #[test]
    fn replace_all_replaces_full_regex_match() {
        let mut buf = MemoryBuffer::with_text("id=12, id=345");
        assert_eq!(replace_all(&mut buf, "N", r"\d+").unwrap(), 2);
        assert_eq!(buf.text(), "id=N, id=N");
    }

    #[test]
    fn replace_all_inserts_replacement_literally() {
        let mut buf = MemoryBuffer::with_text("ab");
        replace_all(&mut buf, "$0$0", "a").unwrap();
        assert_eq!(buf.text(), "$0$0b");
    }

    #[test]
    fn replace_all_is_one_undo_step() {
        let mut buf = MemoryBuffer::with_text("a a a");
        replace_all(&mut buf, "bbb", "a").unwrap();
        buf.undo();
        assert_eq!(buf.text(), "a a a");
    }

    #[test]
    fn replace_all_bad_pattern_is_pattern_error() {
        let mut buf = MemoryBuffer::with_text("(((");
        let err = replace_all(&mut buf, "x", "(").unwrap_err();
        assert!(matches!(err, TackError::Pattern(_)));
        assert_eq!(buf.text(), "(((");
    }

    #[test]
    fn replace_all_empty_pattern_does_nothing() {
        let mut buf = MemoryBuffer::with_text("abc");
        assert_eq!(replace_all(&mut buf, "x", "").unwrap(), 0);
        assert_eq!(buf.text(), "abc");
    }

    #[test]
    fn goto_collapses_selection() {
        let mut buf = MemoryBuffer::with_text("first\nsecond\nthird");
        buf.set_selection(0, 4);
        goto_location(&mut buf, 1, 2);
        let sel = buf.selection();
        assert!(sel.is_empty());
        assert_eq!(sel.caret, 8);
        assert_eq!(buf.offset_to_line_column(sel.caret), (1, 2));
    }

    #[test]
    fn goto_request_is_one_based_and_clamped() {
        let buf = MemoryBuffer::with_text("first\nsecond\nthird");
        assert_eq!(GotoRequest { line: 2, column: 3 }.resolve(&buf), (1, 3));
        assert_eq!(GotoRequest { line: 0, column: 0 }.resolve(&buf), (0, 0));
        assert_eq!(GotoRequest { line: 9, column: 99 }.resolve(&buf), (2, 5));
    }

    #[test]
    fn goto_bounds_follow_selected_line() {
        let buf = MemoryBuffer::with_text("ab\nabcdef\n");
        assert_eq!(
            GotoBounds::for_line(&buf, 2),
            GotoBounds { max_line: 3, max_column: 6 }
        );
        assert_eq!(GotoBounds::for_line(&buf, 3).max_column, 0);
    }

    #[test]
    fn repeat_flags_keep_case_bits() {
        let opts = SearchOptions {
            text: "x".into(),
            replacement: String::new(),
            flags: SearchFlags::MATCH_CASE | SearchFlags::BACKWARD,
        };
        assert_eq!(opts.repeat_flags(false), SearchFlags::MATCH_CASE);
        assert!(opts.repeat_flags(true).backward());
        assert!(opts.repeat_flags(true).match_case());
    }

    #[test]
    fn dialog_down_flag_is_inverted_direction() {
        assert_eq!(SearchFlags::from_dialog(true, false, false), SearchFlags::empty());
        let up = SearchFlags::from_dialog(false, true, true);
        assert!(up.backward() && up.match_case() && up.whole_word());
        assert_eq!(up.without_direction().bits(), 0x6);
    }

    proptest! {
        #[test]
        fn reset_is_idempotent(times in 1usize..8, caret in 0usize..20) {
            let mut buf = MemoryBuffer::with_text("some searchable text here");
            buf.set_insertion_point(caret);
            let mut state = SearchState::new();
            state.find(&mut buf, SearchFlags::empty(), "e");
            for _ in 0..times {
                state.reset();
                prop_assert_eq!(state.last_search(), (0, 0));
            }
        }

        #[test]
        fn replace_all_equal_length_matches_regex_replace(
            text in "[ab-]{0,24}",
            from in "[ab]",
            to in "[xy]",
        ) {
            let mut buf = MemoryBuffer::with_text(&text);
            replace_all(&mut buf, &to, &from).unwrap();
            prop_assert_eq!(buf.text(), text.replace(from.as_str(), &to));
        }

        #[test]
        fn find_never_edits_text(text in "[a-c\n]{0,30}", query in "[a-c]{1,2}", back in any::<bool>()) {
            let mut buf = MemoryBuffer::with_text(&text);
            let mut state = SearchState::new();
            let flags = if back { SearchFlags::BACKWARD } else { SearchFlags::empty() };
            state.find(&mut buf, flags, &query);
            prop_assert_eq!(buf.text(), text);
            prop_assert!(!buf.is_modified());
        }
    }
}
