// ── Documents & workspace ─────────────────────────────────────────────────────
//
// A single `Workspace` is created on startup and owned by the window state
// for the lifetime of the main window.  All mutations happen on the UI
// thread; there is no global mutable state.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::editor::Notification;
use crate::error::Result;

/// Suffix shown after the document name in the title bar.
pub const APP_NAME: &str = "tack";

// ── DocPhase ──────────────────────────────────────────────────────────────────

/// Lifecycle of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocPhase {
    /// Untitled and never edited (or edited back to its initial state).
    Empty,
    /// Matches what is on disk.
    Loaded,
    /// Has changes not yet saved.
    Modified,
}

// ── Document ──────────────────────────────────────────────────────────────────

/// Per-document state; the text itself lives in the editor widget.
#[derive(Debug)]
pub struct Document {
    /// Absolute path on disk, or `None` for an untitled buffer.
    pub path: Option<PathBuf>,
    /// Display name: the file name, or `Untitled N`.
    pub name: String,
    phase: DocPhase,
    /// Set while the widget is being filled from disk so that the resulting
    /// change notifications do not mark the document modified.
    loading: bool,
    /// `true` once the document has matched a file on disk.
    saved_once: bool,
}

impl Document {
    fn untitled(number: u32) -> Self {
        Self {
            path: None,
            name: format!("Untitled {number}"),
            phase: DocPhase::Empty,
            loading: false,
            saved_once: false,
        }
    }

    pub fn phase(&self) -> DocPhase {
        self.phase
    }

    pub fn is_modified(&self) -> bool {
        self.phase == DocPhase::Modified
    }

    /// Closing this document should first ask whether to save it.
    pub fn needs_save_prompt(&self) -> bool {
        self.is_modified()
    }

    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    pub fn end_load(&mut self) {
        self.loading = false;
    }

    /// The widget left its save point.  Ignored while loading.
    pub fn mark_modified(&mut self) {
        if !self.loading {
            self.phase = DocPhase::Modified;
        }
    }

    /// The widget is back at its save point (after a save, or via undo).
    pub fn mark_clean(&mut self) {
        self.phase = if self.saved_once {
            DocPhase::Loaded
        } else {
            DocPhase::Empty
        };
    }

    /// Apply a widget notification.  Returns `true` when the phase may have
    /// changed and the title needs refreshing.
    pub fn apply_notification(&mut self, notification: Notification) -> bool {
        match notification {
            Notification::SavePointLeft => self.mark_modified(),
            Notification::SavePointReached => self.mark_clean(),
            Notification::UpdateUi | Notification::Modified => return false,
        }
        true
    }

    /// Bring the phase in line with the widget's own modified flag, which is
    /// authoritative even if a notification was missed.
    pub fn sync_modified(&mut self, widget_modified: bool) {
        if widget_modified {
            self.mark_modified();
        } else {
            self.mark_clean();
        }
    }

    /// Record a successful write to `path`.
    fn saved_as(&mut self, path: PathBuf) {
        self.name = file_name(&path);
        self.path = Some(path);
        self.saved_once = true;
        self.phase = DocPhase::Loaded;
    }

    /// Title bar text: `"name - tack"`, with a leading `*` when modified.
    pub fn window_title(&self) -> String {
        let dirty = if self.is_modified() { "*" } else { "" };
        format!("{dirty}{} - {APP_NAME}", self.name)
    }

    /// Write `content` to the document's path.  The caller falls back to
    /// Save As when there is no path yet.
    pub fn save(&mut self, content: &str) -> Result<bool> {
        match self.path.clone() {
            Some(path) => {
                self.save_as(path, content)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Write `content` to `path` and adopt it as the document's path.
    pub fn save_as(&mut self, path: PathBuf, content: &str) -> Result<()> {
        std::fs::write(&path, content.as_bytes())?;
        info!("saved {}", path.display());
        self.saved_as(path);
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Decode file bytes for the editor: strips a UTF-8 BOM, replaces invalid
/// sequences with U+FFFD.
pub fn decode_file(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Status bar text for a 0-based caret position.
pub fn status_text(line: usize, column: usize) -> String {
    format!("Line: {} Column: {}", line + 1, column)
}

// ── Workspace ─────────────────────────────────────────────────────────────────

/// All open documents and which one is shown.
#[derive(Debug)]
pub struct Workspace {
    docs: Vec<Document>,
    active: usize,
    untitled_counter: u32,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// A workspace holding one fresh `Untitled 1`.
    pub fn new() -> Self {
        Self {
            docs: vec![Document::untitled(1)],
            active: 0,
            untitled_counter: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &Document {
        &self.docs[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Document {
        &mut self.docs[self.active]
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    pub fn document_mut(&mut self, index: usize) -> Option<&mut Document> {
        self.docs.get_mut(index)
    }

    /// `true` when the next `open_document` will reuse the only document
    /// (a pristine `Untitled`) instead of adding one.
    pub fn open_reuses_active(&self) -> bool {
        self.docs.len() == 1 && self.docs[0].phase == DocPhase::Empty
    }

    /// Add an untitled document and make it active.  Returns its index.
    pub fn new_document(&mut self) -> usize {
        self.untitled_counter += 1;
        self.push(Document::untitled(self.untitled_counter))
    }

    /// Read `path` and add it as a new active document.
    ///
    /// Returns the index and the decoded text for the widget.  If the only
    /// document is a pristine `Untitled`, it is replaced rather than kept.
    pub fn open_document(&mut self, path: PathBuf) -> Result<(usize, String)> {
        let bytes = std::fs::read(&path)?;
        let text = decode_file(&bytes);
        info!("opened {} ({} bytes)", path.display(), bytes.len());

        let mut doc = Document::untitled(0);
        doc.saved_as(path);

        let idx = if self.open_reuses_active() {
            self.docs[0] = doc;
            self.active = 0;
            0
        } else {
            self.push(doc)
        };
        Ok((idx, text))
    }

    fn push(&mut self, doc: Document) -> usize {
        self.docs.push(doc);
        self.active = self.docs.len() - 1;
        debug!("document {} active ({} open)", self.active, self.docs.len());
        self.active
    }

    /// Remove the active document.  If it was the last one, a fresh untitled
    /// document takes its place.  Returns the removed document's index.
    pub fn close_active(&mut self) -> usize {
        let removed = self.active;
        self.docs.remove(removed);
        if self.docs.is_empty() {
            self.untitled_counter += 1;
            self.docs.push(Document::untitled(self.untitled_counter));
        }
        self.active = removed.min(self.docs.len() - 1);
        removed
    }

    /// Activate the document at `index`, clamped to the open range.
    pub fn set_active(&mut self, index: usize) -> usize {
        self.active = index.min(self.docs.len() - 1);
        self.active
    }

    /// Activate the next document, wrapping.  Returns the new active index.
    pub fn next(&mut self) -> usize {
        self.active = (self.active + 1) % self.docs.len();
        self.active
    }

    /// Activate the previous document, wrapping.
    pub fn previous(&mut self) -> usize {
        self.active = (self.active + self.docs.len() - 1) % self.docs.len();
        self.active
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_document_is_untitled_one() {
        let ws = Workspace::new();
        assert_eq!(ws.active().name, "Untitled 1");
        assert_eq!(ws.active().phase(), DocPhase::Empty);
        assert_eq!(ws.active().window_title(), "Untitled 1 - tack");
    }

    #[test]
    fn new_document_counts_up() {
        let mut ws = Workspace::new();
        assert_eq!(ws.new_document(), 1);
        assert_eq!(ws.active().name, "Untitled 2");
        assert_eq!(ws.len(), 2);
    }

    #[test]
    fn modified_title_has_star() {
        let mut ws = Workspace::new();
        ws.active_mut().mark_modified();
        assert_eq!(ws.active().window_title(), "*Untitled 1 - tack");
        assert!(ws.active().needs_save_prompt());
    }

    #[test]
    fn loading_suppresses_modified() {
        let mut ws = Workspace::new();
        let doc = ws.active_mut();
        doc.begin_load();
        doc.mark_modified();
        doc.end_load();
        assert_eq!(doc.phase(), DocPhase::Empty);
        doc.mark_modified();
        assert_eq!(doc.phase(), DocPhase::Modified);
    }

    #[test]
    fn leaving_save_point_marks_loaded_document_modified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.txt");
        std::fs::write(&path, "abc").unwrap();
        let mut ws = Workspace::new();
        ws.open_document(path).unwrap();

        // A Delete keystroke reports only SCN_SAVEPOINTLEFT (2003).
        let left = Notification::from_code(2003).unwrap();
        assert!(ws.active_mut().apply_notification(left));
        assert_eq!(ws.active().phase(), DocPhase::Modified);
        assert!(ws.active().needs_save_prompt());
        assert_eq!(ws.active().window_title(), "*c.txt - tack");

        let reached = Notification::from_code(2002).unwrap();
        assert!(ws.active_mut().apply_notification(reached));
        assert_eq!(ws.active().phase(), DocPhase::Loaded);
        assert!(!ws.active_mut().apply_notification(Notification::UpdateUi));
    }

    #[test]
    fn widget_modified_flag_drives_save_prompt() {
        let mut ws = Workspace::new();
        let doc = ws.active_mut();
        doc.sync_modified(true);
        assert!(doc.needs_save_prompt());
        doc.sync_modified(false);
        assert_eq!(doc.phase(), DocPhase::Empty);
    }

    #[test]
    fn undo_to_save_point_returns_to_empty_when_never_saved() {
        let mut ws = Workspace::new();
        let doc = ws.active_mut();
        doc.mark_modified();
        doc.mark_clean();
        assert_eq!(doc.phase(), DocPhase::Empty);
    }

    #[test]
    fn save_without_path_asks_for_one() {
        let mut ws = Workspace::new();
        assert!(!ws.active_mut().save("text").unwrap());
    }

    #[test]
    fn save_as_writes_and_renames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let mut ws = Workspace::new();
        let doc = ws.active_mut();
        doc.mark_modified();
        doc.save_as(path.clone(), "hello").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
        assert_eq!(doc.phase(), DocPhase::Loaded);
        assert_eq!(doc.window_title(), "notes.txt - tack");

        doc.mark_modified();
        assert!(doc.save("again").unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "again");
        doc.mark_modified();
        doc.mark_clean();
        assert_eq!(doc.phase(), DocPhase::Loaded);
    }

    #[test]
    fn open_replaces_pristine_untitled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"\xEF\xBB\xBFbody").unwrap();

        let mut ws = Workspace::new();
        assert!(ws.open_reuses_active());
        let (idx, text) = ws.open_document(path).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(ws.len(), 1);
        assert_eq!(text, "body");
        assert_eq!(ws.active().name, "a.txt");
        assert_eq!(ws.active().phase(), DocPhase::Loaded);
    }

    #[test]
    fn open_keeps_modified_untitled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.txt");
        std::fs::write(&path, "x").unwrap();

        let mut ws = Workspace::new();
        ws.active_mut().mark_modified();
        assert!(!ws.open_reuses_active());
        let (idx, _) = ws.open_document(path).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(ws.len(), 2);
    }

    #[test]
    fn open_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = Workspace::new();
        assert!(ws.open_document(dir.path().join("missing.txt")).is_err());
        assert_eq!(ws.len(), 1);
    }

    #[test]
    fn cycling_wraps_both_ways() {
        let mut ws = Workspace::new();
        ws.new_document();
        ws.new_document();
        assert_eq!(ws.active_index(), 2);
        assert_eq!(ws.next(), 0);
        assert_eq!(ws.previous(), 2);
        assert_eq!(ws.previous(), 1);
    }

    #[test]
    fn set_active_clamps() {
        let mut ws = Workspace::new();
        ws.new_document();
        assert_eq!(ws.set_active(0), 0);
        assert_eq!(ws.active().name, "Untitled 1");
        assert_eq!(ws.set_active(7), 1);
    }

    #[test]
    fn closing_last_document_leaves_fresh_untitled() {
        let mut ws = Workspace::new();
        ws.close_active();
        assert!(!ws.is_empty());
        assert_eq!(ws.len(), 1);
        assert_eq!(ws.active().name, "Untitled 2");
    }

    #[test]
    fn closing_middle_document_activates_neighbour() {
        let mut ws = Workspace::new();
        ws.new_document();
        ws.new_document();
        ws.previous();
        assert_eq!(ws.close_active(), 1);
        assert_eq!(ws.active_index(), 1);
        assert_eq!(ws.active().name, "Untitled 3");
    }

    #[test]
    fn decode_replaces_invalid_utf8() {
        assert_eq!(decode_file(b"a\xFFb"), "a\u{FFFD}b");
    }

    #[test]
    fn status_text_is_one_based_line() {
        assert_eq!(status_text(0, 4), "Line: 1 Column: 4");
    }
}
