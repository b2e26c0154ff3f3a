// ── Main window ───────────────────────────────────────────────────────────────
//
// Responsibilities in this file (unsafe confined here):
//   • Register the main window class and build the menu bar and accelerator
//     table from `commands::Command`.
//   • Own one `ScintillaView` per open document; only the active one is shown.
//   • Run the Win32 message loop, routing the modeless Find dialog through
//     IsDialogMessageW.
//   • Dispatch WM_COMMAND through a `Dispatcher<WindowState>`.
//   • Expose a safe error-dialog helper for use by main().
//
// Re-entrancy: modal dialogs and synchronous Scintilla messages re-enter
// wnd_proc while a handler holds the `RefCell` borrow.  Such messages are not
// handled in place; they set `Host::stale` and the handler resynchronises the
// window from the active view before releasing the borrow.

#![allow(unsafe_code)]

use std::{
    cell::{Cell, RefCell},
    path::PathBuf,
};

use log::{debug, error, info, warn};
use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{GetLastError, BOOL, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM},
        Graphics::Gdi::{GetStockObject, UpdateWindow, HBRUSH, WHITE_BRUSH},
        System::{Diagnostics::Debug::MessageBeep, LibraryLoader::GetModuleHandleW},
        UI::{
            Controls::{InitCommonControlsEx, ICC_BAR_CLASSES, INITCOMMONCONTROLSEX, NMHDR},
            Input::KeyboardAndMouse::{SetFocus, VK_TAB},
            WindowsAndMessaging::{
                AppendMenuW, CheckMenuItem, CreateAcceleratorTableW, CreateMenu,
                CreatePopupMenu, CreateWindowExW, DefWindowProcW, DestroyAcceleratorTable,
                DestroyWindow, DispatchMessageW, EnableMenuItem, GetClientRect, GetMessageW,
                GetWindowLongPtrW, GetWindowRect, IsDialogMessageW, LoadCursorW, LoadIconW,
                MessageBoxW, MoveWindow, PostMessageW, PostQuitMessage, RegisterClassExW,
                RegisterWindowMessageW, SendMessageW, SetMenu, SetWindowLongPtrW,
                SetWindowTextW, ShowWindow, TranslateAcceleratorW, TranslateMessage, ACCEL,
                CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, FCONTROL, FSHIFT, FVIRTKEY,
                GWLP_USERDATA, HACCEL, HMENU, IDC_ARROW, IDI_APPLICATION, MB_ICONERROR,
                MB_ICONINFORMATION, MB_OK, MF_BYCOMMAND, MF_CHECKED, MF_ENABLED, MF_GRAYED,
                MF_POPUP, MF_SEPARATOR, MF_STRING, MF_UNCHECKED, MSG, SW_SHOW,
                WINDOW_EX_STYLE, WINDOW_STYLE, WM_CLOSE, WM_COMMAND, WM_DESTROY,
                WM_INITMENUPOPUP, WM_NCDESTROY, WM_NOTIFY, WM_SETFOCUS, WM_SIZE, WNDCLASSEXW,
                WS_CHILD, WS_OVERLAPPEDWINDOW, WS_VISIBLE,
            },
        },
    },
};

use super::{
    dialogs::{self, FindDialog, FindEvent},
    wide,
};
use crate::{
    app::{status_text, Workspace, APP_NAME},
    commands::{Command, Dispatcher, Key, Menu},
    editor::{
        line_number_margin_width,
        scintilla::{SciDll, ScintillaView},
        EditorSurface, Notification, TextBuffer,
    },
    error::{Result, TackError},
    search::{self, GotoBounds, SearchOptions, SearchState},
    settings::{Settings, SettingsStore},
};

// ── Window identity ───────────────────────────────────────────────────────────

/// Atom name used to register (and later find) the main window class.
const CLASS_NAME: PCWSTR = w!("TackMainWindow");

/// Default window width in device pixels.
const DEFAULT_WIDTH: i32 = 960;

/// Default window height in device pixels.
const DEFAULT_HEIGHT: i32 = 640;

// ── Status bar ────────────────────────────────────────────────────────────────

const STATUS_CLASS: PCWSTR = w!("msctls_statusbar32");
/// `SB_SETTEXTW` (WM_USER + 11).  WPARAM=part index; LPARAM=text.
const SB_SETTEXTW: u32 = 0x040B;
const SBARS_SIZEGRIP: u32 = 0x0100;

/// Registered message the Find / Replace dialog notifies through.
const FIND_MSG_STRING: PCWSTR = w!("commdlg_FindReplace");

// ── Public API ────────────────────────────────────────────────────────────────

/// Register the main window class, create the window, open `path` if given,
/// and drive the message loop until the user closes the application.
pub fn run(path: Option<PathBuf>) -> Result<()> {
    let t0 = std::time::Instant::now();

    // SAFETY: GetModuleHandleW(None) returns the .exe's own HMODULE, which is
    // valid for the process lifetime.
    let hmodule = unsafe { GetModuleHandleW(None) }?;
    let hinstance = HINSTANCE(hmodule.0);

    init_common_controls();
    register_class(hinstance)?;
    let sci = SciDll::load()?;
    let hwnd = create_window(hinstance)?;

    let state = match create_state(hwnd, hinstance, sci) {
        Ok(state) => state,
        Err(e) => {
            // SAFETY: hwnd is our top-level window and has no host attached,
            // so wnd_proc falls through to DefWindowProcW while it dies.
            unsafe {
                let _ = DestroyWindow(hwnd);
            }
            return Err(e);
        }
    };

    // SAFETY: FIND_MSG_STRING is a static null-terminated literal.
    let find_msg = unsafe { RegisterWindowMessageW(FIND_MSG_STRING) };
    let host = Box::new(Host {
        shell: RefCell::new(Shell {
            state,
            commands: command_table(),
        }),
        stale: Cell::new(false),
        find_msg,
        find_hwnd: Cell::new(HWND::default()),
    });

    // SAFETY: ownership of the Box moves into the window; it is reclaimed
    // exactly once in WM_NCDESTROY, after which GWLP_USERDATA is 0.
    unsafe {
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, Box::into_raw(host) as isize);
    }

    if let Some(path) = path {
        // SAFETY: the host was installed above and nothing else borrows it yet.
        if let Some(host) = unsafe { host_of(hwnd) } {
            host.with_shell(|shell| shell.state.open_path(path));
        }
    }

    // SAFETY: hwnd is a valid top-level window.  ShowWindow returns the
    // previous visibility state and UpdateWindow a success BOOL; both are
    // intentionally ignored.
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = UpdateWindow(hwnd);
    }
    debug!("window visible in {:.1} ms", t0.elapsed().as_secs_f64() * 1000.0);

    let accel = build_accelerators()?;
    let result = message_loop(hwnd, accel);
    // SAFETY: accel came from CreateAcceleratorTableW and is not used after
    // the loop.
    unsafe {
        let _ = DestroyAcceleratorTable(accel);
    }
    result
}

/// Show a modal error dialog with the given message.
///
/// Used by `main()` when `run()` returns an error.
pub fn show_error_dialog(message: &str) {
    message_box(HWND::default(), message, &format!("{APP_NAME}: fatal error"), true);
}

// ── Host ──────────────────────────────────────────────────────────────────────

/// Heap block stored in the main window's `GWLP_USERDATA`.
struct Host {
    shell: RefCell<Shell>,
    /// A message needing a resync arrived while the shell was borrowed.
    stale: Cell<bool>,
    /// Id of the registered `commdlg_FindReplace` message.
    find_msg: u32,
    /// Mirror of the open Find dialog's HWND for the message loop.
    find_hwnd: Cell<HWND>,
}

impl Host {
    /// Run `f` with the shell borrowed, or mark the host stale and return
    /// `None` if a handler further up the stack already holds it.
    fn with_shell<R>(&self, f: impl FnOnce(&mut Shell) -> R) -> Option<R> {
        let Ok(mut shell) = self.shell.try_borrow_mut() else {
            self.stale.set(true);
            return None;
        };
        let result = f(&mut shell);
        if self.stale.take() {
            shell.state.sync_active();
        }
        self.find_hwnd.set(shell.state.find_dialog_hwnd());
        Some(result)
    }
}

struct Shell {
    state: WindowState,
    commands: Dispatcher<WindowState>,
}

/// # Safety
/// `hwnd` must be the main window (or a destroyed handle, which yields
/// `None`).  The returned reference must not outlive the current message.
unsafe fn host_of<'a>(hwnd: HWND) -> Option<&'a Host> {
    (GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const Host).as_ref()
}

// ── Command table ─────────────────────────────────────────────────────────────

fn command_table() -> Dispatcher<WindowState> {
    Dispatcher::new()
        .on(Command::New, WindowState::new_document)
        .on(Command::Open, WindowState::open)
        .on(Command::Save, |s| {
            s.save();
        })
        .on(Command::SaveAs, |s| {
            s.save_as();
        })
        .on(Command::Close, WindowState::close_document)
        .on(Command::Exit, |s| post_close(s.hwnd))
        .on(Command::Undo, |s| s.active_view_mut().undo())
        .on(Command::Redo, |s| s.active_view_mut().redo())
        .on(Command::Cut, |s| s.active_view_mut().cut())
        .on(Command::Copy, |s| s.active_view_mut().copy())
        .on(Command::Paste, |s| s.active_view_mut().paste())
        .on(Command::SelectAll, |s| s.active_view_mut().select_all())
        .on(Command::Find, |s| s.open_find_dialog(false))
        .on(Command::Replace, |s| s.open_find_dialog(true))
        .on(Command::FindNext, |s| s.find(false))
        .on(Command::FindPrevious, |s| s.find(true))
        .on(Command::GoTo, WindowState::go_to)
        .on(Command::SelectFont, WindowState::select_font)
        .on(Command::ToggleLineNumbers, WindowState::toggle_line_numbers)
        .on(Command::NextDocument, |s| {
            s.workspace.next();
            s.show_active();
        })
        .on(Command::PreviousDocument, |s| {
            s.workspace.previous();
            s.show_active();
        })
        .on(Command::About, |s| about_dialog(s.hwnd))
}

// ── WindowState ───────────────────────────────────────────────────────────────

/// Everything the main window owns.  `views[i]` displays
/// `workspace.documents()[i]`.
struct WindowState {
    hwnd: HWND,
    hinstance: HINSTANCE,
    status: HWND,
    workspace: Workspace,
    views: Vec<ScintillaView>,
    search: SearchState,
    options: SearchOptions,
    find_dialog: Option<FindDialog>,
    settings: Settings,
    store: Option<SettingsStore>,
    // Declared last: dropped after the views' windows are gone.
    sci: SciDll,
}

fn create_state(hwnd: HWND, hinstance: HINSTANCE, sci: SciDll) -> Result<WindowState> {
    let (settings, store) = load_settings();
    let mut state = WindowState {
        hwnd,
        hinstance,
        status: create_status_bar(hwnd, hinstance)?,
        workspace: Workspace::new(),
        views: Vec::new(),
        search: SearchState::new(),
        options: SearchOptions::default(),
        find_dialog: None,
        settings,
        store,
        sci,
    };
    let first = state.create_view()?;
    state.views.push(first);
    state.show_active();
    Ok(state)
}

fn load_settings() -> (Settings, Option<SettingsStore>) {
    let Some(store) = SettingsStore::default_location() else {
        warn!("no config directory; settings will not be saved");
        return (Settings::default(), None);
    };
    let settings = store.load().unwrap_or_else(|e| {
        warn!("ignoring {}: {e}", store.path().display());
        Settings::default()
    });
    (settings, Some(store))
}

fn update_margin(view: &mut ScintillaView, show: bool) {
    let width = line_number_margin_width(view.line_count(), show);
    view.set_line_number_margin(width);
}

impl WindowState {
    fn active_view(&self) -> &ScintillaView {
        &self.views[self.workspace.active_index()]
    }

    fn active_view_mut(&mut self) -> &mut ScintillaView {
        &mut self.views[self.workspace.active_index()]
    }

    fn find_dialog_hwnd(&self) -> HWND {
        self.find_dialog.as_ref().map(FindDialog::hwnd).unwrap_or_default()
    }

    fn create_view(&self) -> Result<ScintillaView> {
        let mut view = ScintillaView::create(self.hwnd, self.hinstance, &self.sci)?;
        view.set_font(&self.settings.font_spec());
        update_margin(&mut view, self.settings.show_line_numbers);
        Ok(view)
    }

    // ── Presentation ──────────────────────────────────────────────────────────

    /// Show only the active document's view and bring the chrome in line
    /// with it.
    fn show_active(&mut self) {
        debug_assert_eq!(self.views.len(), self.workspace.len());
        let active = self.workspace.active_index();
        for (i, view) in self.views.iter().enumerate() {
            view.show(i == active);
        }
        self.sync_active();
        focus(self.active_view().hwnd());
    }

    /// Re-read the active view's modified flag, margin and caret.
    fn sync_active(&mut self) {
        self.layout();
        let show = self.settings.show_line_numbers;
        let view = &mut self.views[self.workspace.active_index()];
        update_margin(view, show);
        self.workspace.active_mut().sync_modified(view.is_modified());
        self.refresh_title();
        self.refresh_status();
    }

    fn refresh_title(&self) {
        set_window_text(self.hwnd, &self.workspace.active().window_title());
    }

    fn refresh_status(&self) {
        let (line, column) = self.active_view().caret_line_col();
        set_status_text(self.status, &status_text(line, column));
    }

    /// Status bar along the bottom, every view filling the rest.
    fn layout(&self) {
        let Some(client) = client_rect(self.hwnd) else {
            return;
        };
        // The status bar positions itself on any WM_SIZE.
        send(self.status, WM_SIZE, 0, 0);
        let height = (client.bottom - window_height(self.status)).max(0);
        for view in &self.views {
            move_window(view.hwnd(), client.right, height);
        }
    }

    fn on_editor_notify(&mut self, from: HWND, code: u32) {
        let Some(notification) = Notification::from_code(code) else {
            return;
        };
        let Some(idx) = self.views.iter().position(|v| v.hwnd() == from) else {
            return;
        };
        let active = idx == self.workspace.active_index();
        match notification {
            Notification::SavePointLeft | Notification::SavePointReached => {
                let changed = self
                    .workspace
                    .document_mut(idx)
                    .is_some_and(|doc| doc.apply_notification(notification));
                if changed && active {
                    self.refresh_title();
                }
            }
            Notification::Modified if self.settings.show_line_numbers => {
                update_margin(&mut self.views[idx], true);
            }
            Notification::UpdateUi if active => self.refresh_status(),
            _ => {}
        }
    }

    /// Enabled and checked state for a menu item.
    fn menu_state(&self, cmd: Command) -> (bool, bool) {
        let view = self.active_view();
        let enabled = match cmd {
            Command::Undo => view.can_undo(),
            Command::Redo => view.can_redo(),
            _ => cmd.is_enabled(!view.selection().is_empty()),
        };
        let checked = cmd == Command::ToggleLineNumbers && self.settings.show_line_numbers;
        (enabled, checked)
    }

    fn report_error(&self, context: &str, err: &TackError) {
        error!("{context}: {err}");
        message_box(self.hwnd, &format!("{context}\n\n{err}"), APP_NAME, true);
    }

    // ── File commands ─────────────────────────────────────────────────────────

    fn new_document(&mut self) {
        match self.create_view() {
            Ok(view) => {
                self.views.push(view);
                self.workspace.new_document();
                self.show_active();
            }
            Err(e) => self.report_error("Could not create a new document.", &e),
        }
    }

    fn open(&mut self) {
        if let Some(path) = dialogs::show_open_dialog(self.hwnd) {
            self.open_path(path);
        }
    }

    fn open_path(&mut self, path: PathBuf) {
        // The view is created up front so that views and documents never
        // disagree, even if creating it fails.
        let spare = if self.workspace.open_reuses_active() {
            None
        } else {
            match self.create_view() {
                Ok(view) => Some(view),
                Err(e) => {
                    self.report_error("Could not create a new document.", &e);
                    return;
                }
            }
        };

        match self.workspace.open_document(path.clone()) {
            Ok((idx, text)) => {
                if let Some(view) = spare {
                    self.views.push(view);
                }
                self.load_into(idx, &text);
                self.show_active();
            }
            Err(e) => {
                if let Some(view) = spare {
                    view.destroy();
                }
                self.report_error(&format!("Could not open {}.", path.display()), &e);
            }
        }
    }

    fn load_into(&mut self, idx: usize, text: &str) {
        let show = self.settings.show_line_numbers;
        let view = &mut self.views[idx];
        let doc = self.workspace.document_mut(idx);
        if let Some(doc) = doc {
            doc.begin_load();
            view.set_text(text);
            view.set_save_point();
            update_margin(view, show);
            doc.end_load();
            doc.mark_clean();
        }
    }

    /// Save the active document, asking for a path if it has none.
    /// Returns `true` once the content is on disk.
    fn save(&mut self) -> bool {
        let content = self.active_view().text();
        match self.workspace.active_mut().save(&content) {
            Ok(true) => {
                self.active_view_mut().set_save_point();
                self.refresh_title();
                true
            }
            Ok(false) => self.save_as(),
            Err(e) => {
                self.report_error("Could not save the file.", &e);
                false
            }
        }
    }

    fn save_as(&mut self) -> bool {
        let name = self.workspace.active().name.clone();
        let Some(path) = dialogs::show_save_dialog(self.hwnd, &name) else {
            return false;
        };
        let content = self.active_view().text();
        match self.workspace.active_mut().save_as(path, &content) {
            Ok(()) => {
                self.active_view_mut().set_save_point();
                self.refresh_title();
                true
            }
            Err(e) => {
                self.report_error("Could not save the file.", &e);
                false
            }
        }
    }

    /// Ask about unsaved changes in the active document.  Returns `false`
    /// when the user chose to save but the save did not happen.
    fn confirm_discard_active(&mut self) -> bool {
        let modified = self.active_view().is_modified();
        self.workspace.active_mut().sync_modified(modified);
        if !self.workspace.active().needs_save_prompt() {
            return true;
        }
        let message = format!(
            "There are unsaved changes in {}.\nDo you want to save?",
            self.workspace.active().name
        );
        if !dialogs::ask_yes_no(self.hwnd, &message, "Unsaved Changes") {
            return true;
        }
        self.save()
    }

    fn confirm_close_all(&mut self) -> bool {
        for idx in 0..self.workspace.len() {
            let modified = self.views[idx].is_modified();
            if let Some(doc) = self.workspace.document_mut(idx) {
                doc.sync_modified(modified);
            }
            if self.workspace.documents()[idx].needs_save_prompt() {
                self.workspace.set_active(idx);
                self.show_active();
                if !self.confirm_discard_active() {
                    return false;
                }
            }
        }
        true
    }

    fn close_document(&mut self) {
        if !self.confirm_discard_active() {
            return;
        }
        let replacement = if self.workspace.len() == 1 {
            match self.create_view() {
                Ok(view) => Some(view),
                Err(e) => {
                    self.report_error("Could not close the document.", &e);
                    return;
                }
            }
        } else {
            None
        };

        let removed = self.workspace.close_active();
        self.views.remove(removed).destroy();
        if let Some(view) = replacement {
            self.views.push(view);
        }
        self.show_active();
    }

    // ── Search commands ───────────────────────────────────────────────────────

    fn open_find_dialog(&mut self, replace: bool) {
        if let Some(dialog) = &self.find_dialog {
            focus(dialog.hwnd());
            return;
        }
        let selected = self.active_view().selected_text();
        let initial = if selected.contains('\n') { "" } else { selected.as_str() };
        self.find_dialog = FindDialog::open(self.hwnd, replace, initial);
    }

    fn on_find_message(&mut self) {
        let Some(event) = self.find_dialog.as_ref().and_then(FindDialog::read_event) else {
            return;
        };
        debug!("find dialog: {event:?}");
        match event {
            FindEvent::FindNext { text, flags } => {
                self.options.text = text;
                self.options.flags = flags;
                self.find(flags.backward());
            }
            FindEvent::Replace { text, replacement, flags } => {
                if !search::replace(self.active_view_mut(), &replacement, &text) {
                    debug!("replace skipped: selection is not {text:?}");
                }
                self.options = SearchOptions { text, replacement, flags };
            }
            FindEvent::ReplaceAll { text, replacement } => {
                let result = search::replace_all(self.active_view_mut(), &replacement, &text);
                self.options.text = text;
                self.options.replacement = replacement;
                match result {
                    Ok(0) => beep(),
                    Ok(n) => info!("replaced {n} occurrences"),
                    Err(e) => self.report_error("Invalid search pattern.", &e),
                }
            }
            FindEvent::Closed => {
                self.find_dialog = None;
                self.search.reset();
                focus(self.active_view().hwnd());
            }
        }
    }

    /// Search with the remembered options; also backs Find Next / Find
    /// Previous.
    fn find(&mut self, backward: bool) {
        let flags = self.options.repeat_flags(backward);
        let view = &mut self.views[self.workspace.active_index()];
        if !self.search.find(view, flags, &self.options.text) {
            beep();
        }
    }

    fn go_to(&mut self) {
        let (line, _) = self.active_view().caret_line_col();
        let bounds = GotoBounds::for_line(self.active_view(), line + 1);
        if let Some(request) = dialogs::show_goto_dialog(self.hwnd, self.hinstance, bounds) {
            let view = self.active_view_mut();
            let (line, column) = request.resolve(&*view);
            search::goto_location(view, line, column);
        }
        focus(self.active_view().hwnd());
    }

    // ── View commands ─────────────────────────────────────────────────────────

    fn select_font(&mut self) {
        let current = self.settings.font_spec();
        let Some(font) = dialogs::show_font_dialog(self.hwnd, &current) else {
            return;
        };
        info!("font changed to {font}");
        self.settings = self.settings.with_font(&font);
        self.persist_settings();
        for view in &mut self.views {
            view.set_font(&font);
        }
    }

    fn toggle_line_numbers(&mut self) {
        let show = !self.settings.show_line_numbers;
        self.settings = self.settings.with_line_numbers(show);
        self.persist_settings();
        for view in &mut self.views {
            update_margin(view, show);
        }
    }

    fn persist_settings(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.settings) {
                warn!("could not save settings to {}: {e}", store.path().display());
            }
        }
    }
}

// ── Window class registration ─────────────────────────────────────────────────

fn register_class(hinstance: HINSTANCE) -> Result<()> {
    // SAFETY: IDI_APPLICATION and IDC_ARROW are built-in resources that exist
    // on all Windows versions.
    let icon = unsafe { LoadIconW(None, IDI_APPLICATION) }?;
    let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }?;

    // SAFETY: GetStockObject with WHITE_BRUSH always returns a valid HGDIOBJ.
    let bg_brush = unsafe { HBRUSH(GetStockObject(WHITE_BRUSH).0) };

    let wndclass = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wnd_proc),
        hInstance: hinstance,
        hIcon: icon,
        hCursor: cursor,
        hbrBackground: bg_brush,
        lpszClassName: CLASS_NAME,
        hIconSm: icon,
        ..Default::default()
    };

    // SAFETY: wndclass is fully initialised with valid handles;
    // CLASS_NAME is a valid null-terminated UTF-16 string literal.
    let atom = unsafe { RegisterClassExW(&wndclass) };
    if atom == 0 {
        return Err(last_error("RegisterClassExW"));
    }
    Ok(())
}

fn init_common_controls() {
    let icc = INITCOMMONCONTROLSEX {
        dwSize: std::mem::size_of::<INITCOMMONCONTROLSEX>() as u32,
        dwICC: ICC_BAR_CLASSES,
    };
    // SAFETY: icc is fully initialised.  Failure only means the status bar
    // class is unavailable, which create_status_bar then reports.
    unsafe {
        let _ = InitCommonControlsEx(&icc);
    }
}

// ── Window creation ───────────────────────────────────────────────────────────

fn create_window(hinstance: HINSTANCE) -> Result<HWND> {
    let title = wide(APP_NAME);
    // SAFETY: CLASS_NAME was just registered; hinstance is the exe's module.
    // No creation data: the host is attached after the state is built.
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            CLASS_NAME,
            PCWSTR(title.as_ptr()),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            HWND::default(),
            HMENU::default(),
            hinstance,
            None,
        )
    }?;

    let menu = build_menu()?;
    // SAFETY: hwnd and menu are valid handles; the window takes ownership of
    // the menu and destroys it with itself.
    unsafe { SetMenu(hwnd, menu) }?;
    Ok(hwnd)
}

fn create_status_bar(parent: HWND, hinstance: HINSTANCE) -> Result<HWND> {
    // SAFETY: the status bar class is registered by InitCommonControlsEx;
    // parent is our live top-level window.
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            STATUS_CLASS,
            PCWSTR::null(),
            WS_CHILD | WS_VISIBLE | WINDOW_STYLE(SBARS_SIZEGRIP),
            0,
            0,
            0,
            0,
            parent,
            HMENU::default(),
            hinstance,
            None,
        )
    }?;
    Ok(hwnd)
}

// ── Menu and accelerators ─────────────────────────────────────────────────────

fn build_menu() -> Result<HMENU> {
    // SAFETY: CreateMenu / CreatePopupMenu have no preconditions.  Every
    // string passed to AppendMenuW lives until the call returns; the menu
    // copies it.
    unsafe {
        let bar = CreateMenu()?;
        for menu in Menu::ALL {
            let popup = CreatePopupMenu()?;
            for cmd in Command::ALL.into_iter().filter(|c| c.menu() == menu) {
                if cmd.separator_before() {
                    AppendMenuW(popup, MF_SEPARATOR, 0, PCWSTR::null())?;
                }
                let text = wide(&cmd.menu_text());
                AppendMenuW(popup, MF_STRING, usize::from(cmd.id()), PCWSTR(text.as_ptr()))?;
            }
            // The uIDNewItem parameter for MF_POPUP is the child HMENU.
            let label = wide(menu.label());
            AppendMenuW(bar, MF_POPUP, popup.0 as usize, PCWSTR(label.as_ptr()))?;
        }
        Ok(bar)
    }
}

fn accel_entry(cmd: Command) -> Option<ACCEL> {
    let acc = cmd.accelerator()?;
    let mut virt = FVIRTKEY;
    if acc.ctrl {
        virt = virt | FCONTROL;
    }
    if acc.shift {
        virt = virt | FSHIFT;
    }
    let key = match acc.key {
        // Virtual-key codes for letters are their uppercase ASCII values.
        Key::Char(c) => c.to_ascii_uppercase() as u16,
        Key::Tab => VK_TAB.0,
    };
    Some(ACCEL {
        fVirt: virt,
        key,
        cmd: cmd.id(),
    })
}

fn build_accelerators() -> Result<HACCEL> {
    let table: Vec<ACCEL> = Command::ALL.into_iter().filter_map(accel_entry).collect();
    // SAFETY: table is a valid slice of ACCEL entries; the system copies it.
    let accel = unsafe { CreateAcceleratorTableW(&table) }?;
    Ok(accel)
}

// ── Message loop ──────────────────────────────────────────────────────────────

fn message_loop(hwnd: HWND, accel: HACCEL) -> Result<()> {
    let mut msg = MSG::default();

    loop {
        // SAFETY: &mut msg is a valid MSG pointer; HWND::default() retrieves
        // messages for all windows on this thread; 0,0 filter accepts all.
        let ret = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };

        match ret.0 {
            -1 => return Err(last_error("GetMessageW")),
            // WM_QUIT.
            0 => break,
            // SAFETY: msg was populated by a successful GetMessageW call.
            // host_of returns None once the main window is gone.
            _ => unsafe {
                let find = host_of(hwnd).map(|h| h.find_hwnd.get()).unwrap_or_default();
                if find != HWND::default() && IsDialogMessageW(find, &msg).as_bool() {
                    continue;
                }
                if TranslateAcceleratorW(hwnd, accel, &msg) != 0 {
                    continue;
                }
                let _ = TranslateMessage(&msg);
                let _ = DispatchMessageW(&msg);
            },
        }
    }

    Ok(())
}

// ── Window procedure ──────────────────────────────────────────────────────────

// SAFETY: wnd_proc is registered as lpfnWndProc in WNDCLASSEXW.
// Windows guarantees that hwnd, msg, wparam, and lparam are valid for the
// lifetime of this call.  GWLP_USERDATA is either 0 or a live Box<Host>.
unsafe extern "system" fn wnd_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let Some(host) = host_of(hwnd) else {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    };

    if msg == host.find_msg {
        host.with_shell(|shell| shell.state.on_find_message());
        return LRESULT(0);
    }

    match msg {
        // ── Lifecycle ─────────────────────────────────────────────────────────
        WM_CLOSE => {
            if host.with_shell(|shell| shell.state.confirm_close_all()) == Some(true) {
                // DestroyWindow runs outside the borrow: WM_NCDESTROY frees
                // the host.
                let _ = DestroyWindow(hwnd);
            }
            LRESULT(0)
        }

        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }

        WM_NCDESTROY => {
            let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut Host;
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
            // SAFETY: ptr came from Box::into_raw in run() and is reclaimed
            // only here.  No borrow of the shell is live: WM_NCDESTROY is
            // only reached via DestroyWindow in WM_CLOSE above.
            drop(Box::from_raw(ptr));
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }

        // ── Layout & focus ────────────────────────────────────────────────────
        WM_SIZE => {
            host.with_shell(|shell| shell.state.layout());
            LRESULT(0)
        }

        WM_SETFOCUS => {
            if let Ok(shell) = host.shell.try_borrow() {
                focus(shell.state.active_view().hwnd());
            }
            LRESULT(0)
        }

        // ── Menus & commands ──────────────────────────────────────────────────
        WM_INITMENUPOPUP => {
            let menu = HMENU(wparam.0 as *mut core::ffi::c_void);
            host.with_shell(|shell| update_menu(menu, &shell.state));
            LRESULT(0)
        }

        WM_COMMAND => {
            // Controls report through WM_COMMAND with their HWND in LPARAM;
            // menus and accelerators leave it 0.
            let Some(cmd) = (lparam.0 == 0)
                .then(|| Command::from_id((wparam.0 & 0xFFFF) as u16))
                .flatten()
            else {
                return DefWindowProcW(hwnd, msg, wparam, lparam);
            };
            let handled = host.with_shell(|shell| {
                let Shell { state, commands } = shell;
                commands.dispatch(cmd, state)
            });
            if handled.is_none() {
                debug!("{cmd:?} ignored while another command runs");
            }
            LRESULT(0)
        }

        // ── Editor notifications ──────────────────────────────────────────────
        WM_NOTIFY => {
            // SAFETY: for WM_NOTIFY, LPARAM points at an NMHDR (the head of
            // Scintilla's SCNotification) valid for this message.
            if let Some(header) = (lparam.0 as *const NMHDR).as_ref() {
                let (from, code) = (header.hwndFrom, header.code);
                host.with_shell(|shell| shell.state.on_editor_notify(from, code));
            }
            LRESULT(0)
        }

        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

fn update_menu(menu: HMENU, state: &WindowState) {
    for cmd in Command::ALL {
        let (enabled, checked) = state.menu_state(cmd);
        let id = u32::from(cmd.id());
        // SAFETY: menu is the popup being opened.  Ids that are not in this
        // popup are ignored by both calls.
        unsafe {
            let _ = EnableMenuItem(menu, id, MF_BYCOMMAND | if enabled { MF_ENABLED } else { MF_GRAYED });
            if cmd.is_toggle() {
                CheckMenuItem(menu, id, (MF_BYCOMMAND | if checked { MF_CHECKED } else { MF_UNCHECKED }).0);
            }
        }
    }
}

// ── Small Win32 helpers ───────────────────────────────────────────────────────

fn send(hwnd: HWND, msg: u32, wparam: usize, lparam: isize) -> isize {
    // SAFETY: callers pass integer-only messages to a live window.
    unsafe { SendMessageW(hwnd, msg, WPARAM(wparam), LPARAM(lparam)) }.0
}

fn set_window_text(hwnd: HWND, text: &str) {
    let text = wide(text);
    // SAFETY: text is null-terminated and outlives the call.
    unsafe {
        let _ = SetWindowTextW(hwnd, PCWSTR(text.as_ptr()));
    }
}

fn set_status_text(status: HWND, text: &str) {
    let text = wide(text);
    // SAFETY: SB_SETTEXTW copies the string; text outlives the call.
    unsafe {
        SendMessageW(status, SB_SETTEXTW, WPARAM(0), LPARAM(text.as_ptr() as isize));
    }
}

fn client_rect(hwnd: HWND) -> Option<RECT> {
    let mut rect = RECT::default();
    // SAFETY: rect is a valid out-pointer.
    unsafe { GetClientRect(hwnd, &mut rect) }.ok()?;
    Some(rect)
}

fn window_height(hwnd: HWND) -> i32 {
    let mut rect = RECT::default();
    // SAFETY: rect is a valid out-pointer.
    match unsafe { GetWindowRect(hwnd, &mut rect) } {
        Ok(()) => rect.bottom - rect.top,
        Err(_) => 0,
    }
}

fn move_window(hwnd: HWND, width: i32, height: i32) {
    // SAFETY: hwnd is a live child window of the main window.
    unsafe {
        let _ = MoveWindow(hwnd, 0, 0, width, height, BOOL::from(true));
    }
}

fn focus(hwnd: HWND) {
    // SAFETY: hwnd belongs to this thread.
    unsafe {
        let _ = SetFocus(hwnd);
    }
}

fn beep() {
    // SAFETY: MessageBeep has no preconditions.
    unsafe {
        let _ = MessageBeep(MB_OK);
    }
}

fn post_close(hwnd: HWND) {
    // Posted, not sent: WM_CLOSE must run after the current command has
    // released the shell.
    // SAFETY: hwnd is the main window.
    unsafe {
        let _ = PostMessageW(hwnd, WM_CLOSE, WPARAM(0), LPARAM(0));
    }
}

fn message_box(owner: HWND, message: &str, title: &str, is_error: bool) {
    let msg = wide(message);
    let caption = wide(title);
    let style = if is_error { MB_OK | MB_ICONERROR } else { MB_OK | MB_ICONINFORMATION };
    // SAFETY: msg and caption are null-terminated and outlive the call.
    // The button pressed is irrelevant for an OK-only box.
    unsafe {
        let _ = MessageBoxW(owner, PCWSTR(msg.as_ptr()), PCWSTR(caption.as_ptr()), style);
    }
}

/// Display the About box.
fn about_dialog(hwnd: HWND) {
    let body = format!(
        "{APP_NAME} {}\n\nA small text editor built on Scintilla.\n\nLicensed under MIT OR Apache-2.0.",
        env!("CARGO_PKG_VERSION"),
    );
    message_box(hwnd, &body, &format!("About {APP_NAME}"), false);
}

// ── Error helpers ─────────────────────────────────────────────────────────────

/// Capture the current Win32 last-error code and wrap it in a `TackError`.
///
/// Call immediately after a Win32 function that signals failure; the code
/// is thread-local and any later API call may overwrite it.
fn last_error(function: &'static str) -> TackError {
    // SAFETY: GetLastError reads thread-local state and never fails.
    let code = unsafe { GetLastError() };
    TackError::Win32 {
        function,
        code: code.0,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accelerator_entries_use_virtual_keys() {
        let entry = accel_entry(Command::FindPrevious).unwrap();
        assert_eq!(entry.key, u16::from(b'G'));
        assert_eq!(entry.cmd, Command::FindPrevious.id());
        assert_eq!(entry.fVirt, FVIRTKEY | FCONTROL | FSHIFT);

        let tab = accel_entry(Command::NextDocument).unwrap();
        assert_eq!(tab.key, VK_TAB.0);
        assert!(accel_entry(Command::About).is_none());
    }
}
