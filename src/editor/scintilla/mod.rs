// ── Scintilla child-window hosting ────────────────────────────────────────────
//
// This is one of exactly two modules where `unsafe` is permitted.
// Every `unsafe` block MUST carry a `// SAFETY:` comment.
//
// ── DLL ownership model ───────────────────────────────────────────────────────
//
// `SciDll` owns the single `LoadLibraryW` call for `SciLexer.dll`.  It is
// stored in `WindowState` and lives longer than all `ScintillaView` instances.
// `ScintillaView` holds only a child `HWND`; it does not own the DLL.
//
// Drop order inside `WindowState` (Rust drops fields in declaration order):
//   1. `views`: structs with stale HWNDs (Windows destroyed the children
//      before the parent's WM_NCDESTROY frees the state); no-op drop
//   2. `sci`: `FreeLibrary` called here, after all windows are gone

#![allow(unsafe_code)]

pub mod messages;

use messages::*;

use windows::{
    core::PCWSTR,
    Win32::{
        Foundation::{HINSTANCE, HMODULE, HWND, LPARAM, WPARAM},
        System::LibraryLoader::{FreeLibrary, LoadLibraryW},
        UI::WindowsAndMessaging::{
            CreateWindowExW, DestroyWindow, SendMessageW, ShowWindow, HMENU, SW_HIDE, SW_SHOW,
            WINDOW_EX_STYLE, WINDOW_STYLE, WS_CHILD, WS_CLIPSIBLINGS,
        },
    },
};

use super::{EditorSurface, Selection, Span, TextBuffer};
use crate::{
    error::{Result, TackError},
    search::SearchFlags,
    settings::FontSpec,
};

// ── DLL identity ──────────────────────────────────────────────────────────────

const DLL_NAME: &str = "SciLexer.dll";
const CLASS_NAME: &str = "Scintilla";

// ── SciDll ────────────────────────────────────────────────────────────────────

/// RAII handle to the loaded `SciLexer.dll`.
///
/// Loading the DLL causes it to register the `"Scintilla"` window class.
/// `FreeLibrary` is called on `Drop`, which should happen after all
/// `ScintillaView` child windows have been destroyed.
pub struct SciDll(HMODULE);

impl SciDll {
    /// Load `SciLexer.dll` from the application directory.
    pub fn load() -> Result<Self> {
        let path = crate::platform::win32::wide(DLL_NAME);
        // SAFETY: path is a valid null-terminated UTF-16 string.
        // LoadLibraryW searches the application directory first on Win10/11.
        let dll = unsafe { LoadLibraryW(PCWSTR(path.as_ptr())) }.map_err(TackError::from)?;
        Ok(Self(dll))
    }
}

impl Drop for SciDll {
    fn drop(&mut self) {
        // SAFETY: self.0 was returned by a successful LoadLibraryW and has not
        // been freed since.  All ScintillaView HWNDs are already destroyed.
        unsafe {
            let _ = FreeLibrary(self.0);
        }
    }
}

// ── Text range ────────────────────────────────────────────────────────────────

/// `Sci_TextRange` for `SCI_GETTEXTRANGE` (`Sci_PositionCR` is a C `long`).
#[repr(C)]
struct SciTextRange {
    cp_min: i32,
    cp_max: i32,
    text: *mut u8,
}

// ── ScintillaView ─────────────────────────────────────────────────────────────

/// A hosted Scintilla editor child window.
///
/// Does **not** own the `SciLexer.dll` module handle.  The child `HWND` is
/// destroyed automatically by Windows when the parent is destroyed.
pub struct ScintillaView {
    hwnd: HWND,
}

impl ScintillaView {
    /// Create a hidden Scintilla child window inside `hwnd_parent`.
    ///
    /// `_dll` proves that `SciLexer.dll` is loaded and the `"Scintilla"` class
    /// is registered.
    pub fn create(hwnd_parent: HWND, hinstance: HINSTANCE, _dll: &SciDll) -> Result<Self> {
        let class_wide = crate::platform::win32::wide(CLASS_NAME);

        // SAFETY: class_wide is null-terminated UTF-16 for the class registered
        // by SciLexer.dll.  hwnd_parent and hinstance are valid handles owned
        // by the caller.  New views start hidden (no WS_VISIBLE).
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                PCWSTR(class_wide.as_ptr()),
                PCWSTR::null(),
                WS_CHILD | WS_CLIPSIBLINGS | WINDOW_STYLE(0x0200_0000), // WS_CLIPCHILDREN
                0,
                0,
                0,
                0,
                hwnd_parent,
                HMENU::default(),
                hinstance,
                None,
            )
        }
        .map_err(TackError::from)?;

        let view = Self { hwnd };
        view.send(SCI_SETCODEPAGE, SC_CP_UTF8, 0);
        view.send(SCI_SETMARGINTYPEN, LINE_NUMBER_MARGIN, SC_MARGIN_NUMBER);
        view.send(SCI_SETMARGINWIDTHN, LINE_NUMBER_MARGIN, 0);
        Ok(view)
    }

    /// The Scintilla child window handle.  Valid until the parent is destroyed.
    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// Show or hide this view.  Only the active document's view is shown.
    pub fn show(&self, visible: bool) {
        let cmd = if visible { SW_SHOW } else { SW_HIDE };
        // SAFETY: hwnd is a valid child window handle.
        unsafe {
            let _ = ShowWindow(self.hwnd, cmd);
        }
    }

    /// Explicitly destroy the child HWND when its document closes while the
    /// parent is still alive.  The view must be dropped right after.
    pub fn destroy(&self) {
        // SAFETY: hwnd is a valid child window whose parent is still alive;
        // destroying a child posts no WM_QUIT.
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
    }

    /// Send a Scintilla message with integer arguments.
    fn send(&self, msg: u32, wparam: usize, lparam: isize) -> isize {
        // SAFETY: hwnd is a valid Scintilla window; every message routed
        // through here takes plain integers, no pointers.
        unsafe { SendMessageW(self.hwnd, msg, WPARAM(wparam), LPARAM(lparam)).0 }
    }

    /// Send a Scintilla message whose LPARAM points at `bytes`.
    fn send_bytes(&self, msg: u32, wparam: usize, bytes: &[u8]) -> isize {
        // SAFETY: hwnd valid; bytes outlives the synchronous SendMessageW call
        // and the message only reads the WPARAM-bounded or null-terminated
        // range the caller supplies.
        unsafe {
            SendMessageW(self.hwnd, msg, WPARAM(wparam), LPARAM(bytes.as_ptr() as isize)).0
        }
    }

    fn doc_len(&self) -> usize {
        self.send(SCI_GETLENGTH, 0, 0) as usize
    }

    /// UTF-8 bytes in `[start, end)`.
    fn text_range(&self, start: usize, end: usize) -> String {
        if end <= start {
            return String::new();
        }
        let mut buf = vec![0u8; end - start + 1];
        let mut range = SciTextRange {
            cp_min: start as i32,
            cp_max: end as i32,
            text: buf.as_mut_ptr(),
        };
        // SAFETY: buf holds end-start bytes plus the null terminator Scintilla
        // writes; range and buf outlive the synchronous call.
        unsafe {
            let _ = SendMessageW(
                self.hwnd,
                SCI_GETTEXTRANGE,
                WPARAM(0),
                LPARAM(&mut range as *mut SciTextRange as isize),
            );
        }
        buf.truncate(end - start);
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn line_clamped(&self, line: usize) -> usize {
        line.min(self.line_count() - 1)
    }

    /// Run `SCI_SEARCHINTARGET` over `[from, to)` (or backward if from > to).
    fn search_target(&self, from: usize, to: usize, pattern: &str, flags: SearchFlags) -> Option<Span> {
        if pattern.is_empty() {
            return None;
        }
        self.send(SCI_SETTARGETSTART, from, 0);
        self.send(SCI_SETTARGETEND, to, 0);
        self.send(SCI_SETSEARCHFLAGS, flags.bits() as usize, 0);
        let pos = self.send_bytes(SCI_SEARCHINTARGET, pattern.len(), pattern.as_bytes());
        if pos < 0 {
            None
        } else {
            Some(Span::new(pos as usize, self.send(SCI_GETTARGETEND, 0, 0) as usize))
        }
    }

    /// 0-based caret `(line, column)` for the status bar.
    pub fn caret_line_col(&self) -> (usize, usize) {
        self.offset_to_line_column(self.insertion_point())
    }
}

// ── TextBuffer ────────────────────────────────────────────────────────────────

impl TextBuffer for ScintillaView {
    fn text(&self) -> String {
        let len = self.doc_len();
        let mut buf = vec![0u8; len + 1];
        // SAFETY: buf is len+1 bytes; SCI_GETTEXT with matching buffer size
        // writes at most that many bytes.
        unsafe {
            let _ = SendMessageW(
                self.hwnd,
                SCI_GETTEXT,
                WPARAM(len + 1),
                LPARAM(buf.as_mut_ptr() as isize),
            );
        }
        buf.truncate(len);
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn selected_text(&self) -> String {
        let sel = self.selection();
        self.text_range(sel.start(), sel.end())
    }

    fn selection(&self) -> Selection {
        Selection::new(
            self.send(SCI_GETANCHOR, 0, 0) as usize,
            self.send(SCI_GETCURRENTPOS, 0, 0) as usize,
        )
    }

    fn set_selection(&mut self, anchor: usize, caret: usize) {
        self.send(SCI_SETSEL, anchor, caret as isize);
    }

    fn insertion_point(&self) -> usize {
        self.send(SCI_GETCURRENTPOS, 0, 0) as usize
    }

    fn set_insertion_point(&mut self, pos: usize) {
        self.send(SCI_GOTOPOS, pos, 0);
    }

    fn offset_to_line_column(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.doc_len());
        let line = self.send(SCI_LINEFROMPOSITION, offset, 0) as usize;
        let start = self.send(SCI_POSITIONFROMLINE, line, 0) as usize;
        let column = self.send(SCI_COUNTCHARACTERS, start, offset as isize) as usize;
        (line, column)
    }

    fn line_column_to_offset(&self, line: usize, column: usize) -> usize {
        let line = self.line_clamped(line);
        let start = self.send(SCI_POSITIONFROMLINE, line, 0) as usize;
        let end = self.send(SCI_GETLINEENDPOSITION, line, 0) as usize;
        let len = self.send(SCI_COUNTCHARACTERS, start, end as isize) as usize;
        if column >= len {
            end
        } else {
            self.send(SCI_POSITIONRELATIVE, start, column as isize) as usize
        }
    }

    fn line_count(&self) -> usize {
        (self.send(SCI_GETLINECOUNT, 0, 0) as usize).max(1)
    }

    fn line_length(&self, line: usize) -> usize {
        let line = self.line_clamped(line);
        let start = self.send(SCI_POSITIONFROMLINE, line, 0) as usize;
        let end = self.send(SCI_GETLINEENDPOSITION, line, 0) as usize;
        self.send(SCI_COUNTCHARACTERS, start, end as isize) as usize
    }

    fn search_forward(&mut self, anchor: usize, pattern: &str, flags: SearchFlags) -> Option<Span> {
        let len = self.doc_len();
        self.search_target(anchor.min(len), len, pattern, flags)
    }

    fn search_backward(
        &mut self,
        anchor: usize,
        pattern: &str,
        flags: SearchFlags,
    ) -> Option<Span> {
        // Reversed target (start > end) makes Scintilla search backward.
        self.search_target(anchor.min(self.doc_len()), 0, pattern, flags)
    }

    fn replace_range(&mut self, start: usize, end: usize, text: &str) {
        self.send(SCI_SETTARGETSTART, start, 0);
        self.send(SCI_SETTARGETEND, end, 0);
        self.send_bytes(SCI_REPLACETARGET, text.len(), text.as_bytes());
    }

    fn replace_selection(&mut self, text: &str) {
        let mut buf = Vec::with_capacity(text.len() + 1);
        buf.extend_from_slice(text.as_bytes());
        buf.push(0);
        self.send_bytes(SCI_REPLACESEL, 0, &buf);
    }

    fn ensure_visible(&mut self, offset: usize) {
        self.send(SCI_SCROLLRANGE, offset, offset as isize);
    }

    fn begin_undo_action(&mut self) {
        self.send(SCI_BEGINUNDOACTION, 0, 0);
    }

    fn end_undo_action(&mut self) {
        self.send(SCI_ENDUNDOACTION, 0, 0);
    }
}

// ── EditorSurface ─────────────────────────────────────────────────────────────

impl EditorSurface for ScintillaView {
    /// Replace all document text and reset the undo history.
    fn set_text(&mut self, text: &str) {
        let mut buf = Vec::with_capacity(text.len() + 1);
        buf.extend_from_slice(text.as_bytes());
        buf.push(0);
        self.send_bytes(SCI_SETTEXT, 0, &buf);
        self.send(SCI_EMPTYUNDOBUFFER, 0, 0);
        self.send(SCI_GOTOPOS, 0, 0);
    }

    fn undo(&mut self) {
        self.send(SCI_UNDO, 0, 0);
    }

    fn redo(&mut self) {
        self.send(SCI_REDO, 0, 0);
    }

    fn can_undo(&self) -> bool {
        self.send(SCI_CANUNDO, 0, 0) != 0
    }

    fn can_redo(&self) -> bool {
        self.send(SCI_CANREDO, 0, 0) != 0
    }

    fn cut(&mut self) {
        self.send(SCI_CUT, 0, 0);
    }

    fn copy(&mut self) {
        self.send(SCI_COPY, 0, 0);
    }

    fn paste(&mut self) {
        self.send(SCI_PASTE, 0, 0);
    }

    fn select_all(&mut self) {
        self.send(SCI_SELECTALL, 0, 0);
    }

    fn is_modified(&self) -> bool {
        self.send(SCI_GETMODIFY, 0, 0) != 0
    }

    fn set_save_point(&mut self) {
        self.send(SCI_SETSAVEPOINT, 0, 0);
    }

    /// Apply `font` to the default style, then copy it to every style.
    fn set_font(&mut self, font: &FontSpec) {
        let mut face = Vec::with_capacity(font.face.len() + 1);
        face.extend_from_slice(font.face.as_bytes());
        face.push(0);
        self.send_bytes(SCI_STYLESETFONT, STYLE_DEFAULT, &face);
        self.send(SCI_STYLESETSIZE, STYLE_DEFAULT, font.size as isize);
        self.send(SCI_STYLESETBOLD, STYLE_DEFAULT, font.bold as isize);
        self.send(SCI_STYLESETITALIC, STYLE_DEFAULT, font.italic as isize);
        self.send(SCI_STYLECLEARALL, 0, 0);
    }

    fn set_line_number_margin(&mut self, width: u32) {
        self.send(SCI_SETMARGINWIDTHN, LINE_NUMBER_MARGIN, width as isize);
    }
}
