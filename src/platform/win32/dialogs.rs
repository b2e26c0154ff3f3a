// ── Common dialogs ─────────────────────────────────────────────────────────────
//
// Thin wrappers around the Win32 common-dialog APIs plus the small Go To
// window.  Modal helpers return `Some(..)` on confirmation and `None` on
// cancel or error; the modeless Find / Replace dialog is a `FindDialog` owned
// by the window state for as long as it is open.
//
// This is inside `platform::win32` so `unsafe` is permitted per crate policy.

#![allow(unsafe_code)]

use std::{cell::Cell, path::PathBuf};

use log::warn;
use windows::{
    core::{w, PCWSTR, PWSTR},
    Win32::{
        Foundation::{BOOL, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM},
        Graphics::Gdi::{GetStockObject, FW_BOLD, FW_NORMAL, HBRUSH, LOGFONTW, WHITE_BRUSH},
        UI::{
            Controls::Dialogs::{
                ChooseFontW, FindTextW, GetOpenFileNameW, GetSaveFileNameW, ReplaceTextW,
                CF_INITTOLOGFONTSTRUCT, CF_SCREENFONTS, CHOOSEFONTW, FINDREPLACEW,
                FINDREPLACE_FLAGS, FR_DIALOGTERM, FR_DOWN, FR_FINDNEXT, FR_MATCHCASE,
                FR_REPLACE, FR_REPLACEALL, FR_WHOLEWORD, OFN_FILEMUSTEXIST, OFN_HIDEREADONLY,
                OFN_OVERWRITEPROMPT, OFN_PATHMUSTEXIST, OPENFILENAMEW,
            },
            Input::KeyboardAndMouse::{EnableWindow, SetFocus},
            WindowsAndMessaging::{
                CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW,
                GetMessageW, GetWindowLongPtrW, GetWindowTextW, IsDialogMessageW, LoadCursorW,
                MessageBoxW, PostQuitMessage, RegisterClassExW, SetWindowLongPtrW, ShowWindow,
                TranslateMessage, BS_DEFPUSHBUTTON, BS_PUSHBUTTON, CW_USEDEFAULT,
                ES_AUTOHSCROLL, ES_NUMBER, GWLP_USERDATA, HMENU, IDC_ARROW, IDCANCEL, IDOK,
                IDYES, MB_ICONQUESTION, MB_YESNO, MSG, SW_SHOW, WINDOW_EX_STYLE, WINDOW_STYLE,
                WM_CLOSE, WM_COMMAND, WNDCLASSEXW, WS_BORDER, WS_CAPTION, WS_CHILD, WS_POPUP,
                WS_SYSMENU, WS_TABSTOP, WS_VISIBLE, WS_EX_DLGMODALFRAME,
            },
        },
    },
};

use super::{from_wide, wide};
use crate::{
    search::{GotoBounds, GotoRequest, SearchFlags},
    settings::FontSpec,
};

// ── Buffer sizes ──────────────────────────────────────────────────────────────

/// Maximum path length in `WCHAR`s, including the null terminator.
/// `MAX_PATH` (260) is too short for modern Windows paths; use 32 768 which
/// is the documented maximum for `\\?\` extended paths.
const PATH_BUF_LEN: usize = 32_768;

/// Find / replace edit-box capacity in `WCHAR`s.
const FIND_BUF_LEN: usize = 512;

/// The filter string is null-separated pairs ending with a double null.
const FILE_FILTER: &str = "All Files (*.*)\0*.*\0Text Files (*.txt)\0*.txt\0\0";

// ── Open dialog ───────────────────────────────────────────────────────────────

/// Show the standard "Open File" dialog.
pub(crate) fn show_open_dialog(hwnd_owner: HWND) -> Option<PathBuf> {
    let mut buf = vec![0u16; PATH_BUF_LEN];
    let filter: Vec<u16> = FILE_FILTER.encode_utf16().collect();

    let mut ofn = OPENFILENAMEW {
        lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
        hwndOwner: hwnd_owner,
        lpstrFilter: PCWSTR(filter.as_ptr()),
        lpstrFile: PWSTR(buf.as_mut_ptr()),
        nMaxFile: PATH_BUF_LEN as u32,
        Flags: OFN_FILEMUSTEXIST | OFN_PATHMUSTEXIST | OFN_HIDEREADONLY,
        ..Default::default()
    };

    // SAFETY: `ofn` is fully initialised; `buf` and `filter` outlive this
    // call.  GetOpenFileNameW reads and writes only within the buffers we
    // provided and runs on the UI thread.
    let ok = unsafe { GetOpenFileNameW(&mut ofn) };
    ok.as_bool().then(|| PathBuf::from(from_wide(&buf)))
}

// ── Save dialog ───────────────────────────────────────────────────────────────

/// Show the standard "Save As" dialog with `default_name` pre-filled.
pub(crate) fn show_save_dialog(hwnd_owner: HWND, default_name: &str) -> Option<PathBuf> {
    let mut buf: Vec<u16> = default_name
        .encode_utf16()
        .chain(std::iter::repeat(0).take(PATH_BUF_LEN))
        .take(PATH_BUF_LEN)
        .collect();
    let filter: Vec<u16> = FILE_FILTER.encode_utf16().collect();

    let mut ofn = OPENFILENAMEW {
        lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
        hwndOwner: hwnd_owner,
        lpstrFilter: PCWSTR(filter.as_ptr()),
        lpstrFile: PWSTR(buf.as_mut_ptr()),
        nMaxFile: PATH_BUF_LEN as u32,
        Flags: OFN_OVERWRITEPROMPT | OFN_PATHMUSTEXIST,
        ..Default::default()
    };

    // SAFETY: same invariants as show_open_dialog above.
    let ok = unsafe { GetSaveFileNameW(&mut ofn) };
    ok.as_bool().then(|| PathBuf::from(from_wide(&buf)))
}

// ── Yes / No prompt ───────────────────────────────────────────────────────────

/// Modal Yes/No question.  Returns `true` for Yes.
pub(crate) fn ask_yes_no(hwnd_owner: HWND, message: &str, title: &str) -> bool {
    let msg = wide(message);
    let caption = wide(title);
    // SAFETY: msg and caption are null-terminated and outlive the call;
    // hwnd_owner is the caller's live window.
    let answer = unsafe {
        MessageBoxW(
            hwnd_owner,
            PCWSTR(msg.as_ptr()),
            PCWSTR(caption.as_ptr()),
            MB_YESNO | MB_ICONQUESTION,
        )
    };
    answer == IDYES
}

// ── Font dialog ───────────────────────────────────────────────────────────────

/// Show the font chooser initialised to `current`.
pub(crate) fn show_font_dialog(hwnd_owner: HWND, current: &FontSpec) -> Option<FontSpec> {
    let mut logfont = LOGFONTW {
        // Negative height selects by character height; 96 DPI logical inches.
        lfHeight: -((current.size as i32 * 96) / 72),
        lfWeight: if current.bold { FW_BOLD.0 as i32 } else { FW_NORMAL.0 as i32 },
        lfItalic: current.italic as u8,
        ..Default::default()
    };
    for (dst, src) in logfont
        .lfFaceName
        .iter_mut()
        .zip(current.face.encode_utf16().take(31))
    {
        *dst = src;
    }

    let mut cf = CHOOSEFONTW {
        lStructSize: std::mem::size_of::<CHOOSEFONTW>() as u32,
        hwndOwner: hwnd_owner,
        lpLogFont: &mut logfont,
        Flags: CF_SCREENFONTS | CF_INITTOLOGFONTSTRUCT,
        ..Default::default()
    };

    // SAFETY: cf is fully initialised and points at logfont, both of which
    // live on this stack frame for the duration of the modal call.
    let ok = unsafe { ChooseFontW(&mut cf) };
    if !ok.as_bool() {
        return None;
    }

    let face = from_wide(&logfont.lfFaceName);
    if face.is_empty() {
        return None;
    }
    Some(FontSpec {
        face,
        // iPointSize is in tenths of a point.
        size: ((cf.iPointSize + 5) / 10).max(1) as u32,
        bold: logfont.lfWeight >= FW_BOLD.0 as i32,
        italic: logfont.lfItalic != 0,
    })
}

// ── Find / Replace dialog ─────────────────────────────────────────────────────

/// What the user did in the Find / Replace dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FindEvent {
    FindNext { text: String, flags: SearchFlags },
    Replace { text: String, replacement: String, flags: SearchFlags },
    ReplaceAll { text: String, replacement: String },
    Closed,
}

/// A live modeless Find (or Find and Replace) dialog.
///
/// The `FINDREPLACEW` block and its text buffers are referenced by Windows
/// until `FR_DIALOGTERM` arrives, so they are heap-pinned here and this value
/// must outlive the dialog window.
pub(crate) struct FindDialog {
    hwnd: HWND,
    data: Box<FINDREPLACEW>,
    find_buf: Vec<u16>,
    replace_buf: Vec<u16>,
}

impl FindDialog {
    /// Open the dialog with `initial` in the find box.
    pub(crate) fn open(hwnd_owner: HWND, replace: bool, initial: &str) -> Option<Self> {
        let mut find_buf = vec![0u16; FIND_BUF_LEN];
        for (dst, src) in find_buf.iter_mut().zip(initial.encode_utf16().take(FIND_BUF_LEN - 1)) {
            *dst = src;
        }
        let mut replace_buf = vec![0u16; FIND_BUF_LEN];

        let mut data = Box::new(FINDREPLACEW {
            lStructSize: std::mem::size_of::<FINDREPLACEW>() as u32,
            hwndOwner: hwnd_owner,
            Flags: FR_DOWN,
            lpstrFindWhat: PWSTR(find_buf.as_mut_ptr()),
            lpstrReplaceWith: PWSTR(replace_buf.as_mut_ptr()),
            wFindWhatLen: FIND_BUF_LEN as u16,
            wReplaceWithLen: FIND_BUF_LEN as u16,
            ..Default::default()
        });

        // SAFETY: data and both buffers are heap allocations that move into
        // the returned FindDialog unchanged; the window state keeps it alive
        // until FR_DIALOGTERM.  Called on the UI thread.
        let hwnd = unsafe {
            if replace {
                ReplaceTextW(&mut *data)
            } else {
                FindTextW(&mut *data)
            }
        };
        if hwnd == HWND::default() {
            warn!("find dialog could not be created");
            return None;
        }

        Some(Self {
            hwnd,
            data,
            find_buf,
            replace_buf,
        })
    }

    pub(crate) fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// Decode the registered `FINDMSGSTRING` notification.
    pub(crate) fn read_event(&self) -> Option<FindEvent> {
        let flags = self.data.Flags;
        let has = |f: FINDREPLACE_FLAGS| flags.0 & f.0 != 0;

        if has(FR_DIALOGTERM) {
            return Some(FindEvent::Closed);
        }
        let text = from_wide(&self.find_buf);
        let replacement = from_wide(&self.replace_buf);
        let search = SearchFlags::from_dialog(has(FR_DOWN), has(FR_MATCHCASE), has(FR_WHOLEWORD));

        if has(FR_REPLACEALL) {
            Some(FindEvent::ReplaceAll { text, replacement })
        } else if has(FR_REPLACE) {
            Some(FindEvent::Replace { text, replacement, flags: search })
        } else if has(FR_FINDNEXT) {
            Some(FindEvent::FindNext { text, flags: search })
        } else {
            None
        }
    }
}

// ── Go To dialog ──────────────────────────────────────────────────────────────

const GOTO_CLASS: PCWSTR = w!("TackGotoDialog");
const ID_LINE: i32 = 101;
const ID_COLUMN: i32 = 102;

/// Shared between `show_goto_dialog`'s modal loop and `goto_proc`.
struct GotoState {
    done: Cell<bool>,
    result: Cell<Option<GotoRequest>>,
    line_edit: Cell<HWND>,
    column_edit: Cell<HWND>,
}

/// Ask for a 1-based line and a 0-based column within `bounds`.
///
/// Runs a nested modal loop with the owner disabled.  Returns `None` on
/// Cancel, Escape or close.
pub(crate) fn show_goto_dialog(
    hwnd_owner: HWND,
    hinstance: HINSTANCE,
    bounds: GotoBounds,
) -> Option<GotoRequest> {
    register_goto_class(hinstance);

    let state = GotoState {
        done: Cell::new(false),
        result: Cell::new(None),
        line_edit: Cell::new(HWND::default()),
        column_edit: Cell::new(HWND::default()),
    };

    // SAFETY: GOTO_CLASS was registered above; hwnd_owner is the live main
    // window.  The popup is destroyed before `state` goes out of scope, so
    // the GWLP_USERDATA pointer never dangles while messages can arrive.
    unsafe {
        let dlg = CreateWindowExW(
            WS_EX_DLGMODALFRAME,
            GOTO_CLASS,
            w!("Go To"),
            WS_POPUP | WS_CAPTION | WS_SYSMENU,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            260,
            170,
            hwnd_owner,
            HMENU::default(),
            hinstance,
            None,
        )
        .ok()?;
        SetWindowLongPtrW(dlg, GWLP_USERDATA, &state as *const GotoState as isize);

        let line_label = format!("Line (1-{}):", bounds.max_line);
        let column_label = format!("Column (0-{}):", bounds.max_column);
        let edit_style = WS_BORDER.0 | WS_TABSTOP.0 | (ES_NUMBER | ES_AUTOHSCROLL) as u32;
        child(dlg, hinstance, w!("STATIC"), &line_label, 0, 0, (12, 15), 110);
        state.line_edit.set(child(
            dlg,
            hinstance,
            w!("EDIT"),
            "1",
            edit_style,
            ID_LINE,
            (130, 12),
            100,
        ));
        child(dlg, hinstance, w!("STATIC"), &column_label, 0, 0, (12, 51), 110);
        state.column_edit.set(child(
            dlg,
            hinstance,
            w!("EDIT"),
            "0",
            edit_style,
            ID_COLUMN,
            (130, 48),
            100,
        ));
        button(dlg, hinstance, "Jump To", IDOK.0, BS_DEFPUSHBUTTON as u32, 40);
        button(dlg, hinstance, "Cancel", IDCANCEL.0, BS_PUSHBUTTON as u32, 140);

        let _ = EnableWindow(hwnd_owner, BOOL::from(false));
        let _ = ShowWindow(dlg, SW_SHOW);
        let _ = SetFocus(state.line_edit.get());

        let mut msg = MSG::default();
        while !state.done.get() {
            match GetMessageW(&mut msg, HWND::default(), 0, 0).0 {
                -1 => break,
                0 => {
                    // WM_QUIT: hand it back to the main loop.
                    PostQuitMessage(msg.wParam.0 as i32);
                    break;
                }
                _ => {
                    if !IsDialogMessageW(dlg, &msg).as_bool() {
                        let _ = TranslateMessage(&msg);
                        let _ = DispatchMessageW(&msg);
                    }
                }
            }
        }

        let _ = EnableWindow(hwnd_owner, BOOL::from(true));
        SetWindowLongPtrW(dlg, GWLP_USERDATA, 0);
        let _ = DestroyWindow(dlg);
        let _ = SetFocus(hwnd_owner);
    }

    state.result.get()
}

fn register_goto_class(hinstance: HINSTANCE) {
    // SAFETY: IDC_ARROW is a built-in cursor; GetStockObject(WHITE_BRUSH)
    // always returns a valid brush.  Registering twice fails harmlessly with
    // ERROR_CLASS_ALREADY_EXISTS, which is ignored.
    unsafe {
        let wndclass = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            lpfnWndProc: Some(goto_proc),
            hInstance: hinstance,
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            hbrBackground: HBRUSH(GetStockObject(WHITE_BRUSH).0),
            lpszClassName: GOTO_CLASS,
            ..Default::default()
        };
        let _ = RegisterClassExW(&wndclass);
    }
}

/// Create a child control; returns its handle (null on failure).
///
/// # Safety
/// `parent` must be a live window owned by this thread.
#[allow(clippy::too_many_arguments)]
unsafe fn child(
    parent: HWND,
    hinstance: HINSTANCE,
    class: PCWSTR,
    text: &str,
    style: u32,
    id: i32,
    (x, y): (i32, i32),
    width: i32,
) -> HWND {
    let text = wide(text);
    CreateWindowExW(
        WINDOW_EX_STYLE(0),
        class,
        PCWSTR(text.as_ptr()),
        WS_CHILD | WS_VISIBLE | WINDOW_STYLE(style),
        x,
        y,
        width,
        24,
        parent,
        HMENU(id as isize as *mut core::ffi::c_void),
        hinstance,
        None,
    )
    .unwrap_or_default()
}

/// # Safety
/// Same as `child`.
unsafe fn button(parent: HWND, hinstance: HINSTANCE, text: &str, id: i32, style: u32, x: i32) {
    let text = wide(text);
    let _ = CreateWindowExW(
        WINDOW_EX_STYLE(0),
        w!("BUTTON"),
        PCWSTR(text.as_ptr()),
        WS_CHILD | WS_VISIBLE | WS_TABSTOP | WINDOW_STYLE(style),
        x,
        88,
        90,
        28,
        parent,
        HMENU(id as isize as *mut core::ffi::c_void),
        hinstance,
        None,
    );
}

/// Read an `ES_NUMBER` edit box; empty or overflowing input yields `None`.
fn read_number(edit: HWND) -> Option<usize> {
    let mut buf = [0u16; 32];
    // SAFETY: edit is a live child edit control; buf is writable for its
    // full length.
    let len = unsafe { GetWindowTextW(edit, &mut buf) };
    from_wide(&buf[..len.max(0) as usize]).trim().parse().ok()
}

// SAFETY: registered as lpfnWndProc for GOTO_CLASS.  GWLP_USERDATA holds a
// pointer to the GotoState on show_goto_dialog's stack (or 0), which outlives
// the window.
unsafe extern "system" fn goto_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const GotoState;
    let Some(state) = ptr.as_ref() else {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    };

    match msg {
        WM_COMMAND => {
            let id = (wparam.0 & 0xFFFF) as i32;
            if id == IDOK.0 {
                let line = read_number(state.line_edit.get()).unwrap_or(1);
                let column = read_number(state.column_edit.get()).unwrap_or(0);
                state.result.set(Some(GotoRequest { line, column }));
                state.done.set(true);
                LRESULT(0)
            } else if id == IDCANCEL.0 {
                state.done.set(true);
                LRESULT(0)
            } else {
                DefWindowProcW(hwnd, msg, wparam, lparam)
            }
        }
        WM_CLOSE => {
            state.done.set(true);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}
