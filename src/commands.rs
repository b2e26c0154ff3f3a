// ── Menu commands ─────────────────────────────────────────────────────────────
//
// Every menu item and accelerator maps to one `Command`.  The window shell
// builds its menus and accelerator table from this list and routes
// `WM_COMMAND` through a `Dispatcher`, so the mapping from command to handler
// is an explicit table rather than scattered match arms.

use std::collections::HashMap;

use log::trace;

// ── Command ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    New,
    Open,
    Save,
    SaveAs,
    Close,
    Exit,
    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
    SelectAll,
    Find,
    FindNext,
    FindPrevious,
    Replace,
    GoTo,
    SelectFont,
    ToggleLineNumbers,
    NextDocument,
    PreviousDocument,
    About,
}

/// Top-level menu a command lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    File,
    Edit,
    Search,
    View,
    Window,
    Help,
}

impl Menu {
    pub const ALL: [Menu; 6] = [
        Menu::File,
        Menu::Edit,
        Menu::Search,
        Menu::View,
        Menu::Window,
        Menu::Help,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Menu::File => "&File",
            Menu::Edit => "&Edit",
            Menu::Search => "&Search",
            Menu::View => "&View",
            Menu::Window => "&Window",
            Menu::Help => "&Help",
        }
    }
}

/// A keyboard shortcut.  `key` is an uppercase ASCII letter or one of the
/// named keys below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accelerator {
    pub ctrl: bool,
    pub shift: bool,
    pub key: Key,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Tab,
}

impl Accelerator {
    const fn ctrl(c: char) -> Self {
        Self { ctrl: true, shift: false, key: Key::Char(c) }
    }

    const fn ctrl_shift(c: char) -> Self {
        Self { ctrl: true, shift: true, key: Key::Char(c) }
    }

    /// Text shown right-aligned in the menu, e.g. `"Shift+Ctrl+G"`.
    pub fn display(self) -> String {
        let mut s = String::new();
        if self.shift {
            s.push_str("Shift+");
        }
        if self.ctrl {
            s.push_str("Ctrl+");
        }
        match self.key {
            Key::Char(c) => s.push(c),
            Key::Tab => s.push_str("Tab"),
        }
        s
    }
}

impl Command {
    /// Menu order.  Separators go before the commands listed in
    /// `separator_before`.
    pub const ALL: [Command; 22] = [
        Command::New,
        Command::Open,
        Command::Save,
        Command::SaveAs,
        Command::Close,
        Command::Exit,
        Command::Undo,
        Command::Redo,
        Command::Cut,
        Command::Copy,
        Command::Paste,
        Command::SelectAll,
        Command::Find,
        Command::FindNext,
        Command::FindPrevious,
        Command::Replace,
        Command::GoTo,
        Command::SelectFont,
        Command::ToggleLineNumbers,
        Command::NextDocument,
        Command::PreviousDocument,
        Command::About,
    ];

    /// Stable `WM_COMMAND` identifier.
    pub fn id(self) -> u16 {
        match self {
            Command::New => 1001,
            Command::Open => 1002,
            Command::Save => 1003,
            Command::SaveAs => 1004,
            Command::Close => 1005,
            Command::Exit => 1006,
            Command::Undo => 2001,
            Command::Redo => 2002,
            Command::Cut => 2003,
            Command::Copy => 2004,
            Command::Paste => 2005,
            Command::SelectAll => 2006,
            Command::Find => 3001,
            Command::FindNext => 3002,
            Command::FindPrevious => 3003,
            Command::Replace => 3004,
            Command::GoTo => 3005,
            Command::SelectFont => 4001,
            Command::ToggleLineNumbers => 4002,
            Command::NextDocument => 5001,
            Command::PreviousDocument => 5002,
            Command::About => 9001,
        }
    }

    pub fn from_id(id: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    pub fn menu(self) -> Menu {
        match self {
            Command::New
            | Command::Open
            | Command::Save
            | Command::SaveAs
            | Command::Close
            | Command::Exit => Menu::File,
            Command::Undo
            | Command::Redo
            | Command::Cut
            | Command::Copy
            | Command::Paste
            | Command::SelectAll => Menu::Edit,
            Command::Find
            | Command::FindNext
            | Command::FindPrevious
            | Command::Replace
            | Command::GoTo => Menu::Search,
            Command::SelectFont | Command::ToggleLineNumbers => Menu::View,
            Command::NextDocument | Command::PreviousDocument => Menu::Window,
            Command::About => Menu::Help,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Command::New => "&New",
            Command::Open => "&Open…",
            Command::Save => "&Save",
            Command::SaveAs => "Save &As…",
            Command::Close => "&Close",
            Command::Exit => "E&xit",
            Command::Undo => "&Undo",
            Command::Redo => "&Redo",
            Command::Cut => "Cu&t",
            Command::Copy => "&Copy",
            Command::Paste => "&Paste",
            Command::SelectAll => "Select &All",
            Command::Find => "&Find…",
            Command::FindNext => "Find &Next",
            Command::FindPrevious => "Find &Previous",
            Command::Replace => "Find and &Replace…",
            Command::GoTo => "&Go To…",
            Command::SelectFont => "Select &Font…",
            Command::ToggleLineNumbers => "Show &Line Numbers",
            Command::NextDocument => "&Next Document",
            Command::PreviousDocument => "&Previous Document",
            Command::About => "&About tack…",
        }
    }

    pub fn accelerator(self) -> Option<Accelerator> {
        Some(match self {
            Command::New => Accelerator::ctrl('N'),
            Command::Open => Accelerator::ctrl('O'),
            Command::Save => Accelerator::ctrl('S'),
            Command::Close => Accelerator::ctrl('W'),
            Command::Undo => Accelerator::ctrl('Z'),
            Command::Redo => Accelerator::ctrl('Y'),
            Command::Cut => Accelerator::ctrl('X'),
            Command::Copy => Accelerator::ctrl('C'),
            Command::Paste => Accelerator::ctrl('V'),
            Command::SelectAll => Accelerator::ctrl('A'),
            Command::Find => Accelerator::ctrl('F'),
            Command::FindNext => Accelerator::ctrl('G'),
            Command::FindPrevious => Accelerator::ctrl_shift('G'),
            Command::Replace => Accelerator::ctrl('H'),
            Command::GoTo => Accelerator::ctrl('L'),
            Command::NextDocument => Accelerator { ctrl: true, shift: false, key: Key::Tab },
            Command::PreviousDocument => Accelerator { ctrl: true, shift: true, key: Key::Tab },
            Command::SaveAs
            | Command::Exit
            | Command::SelectFont
            | Command::ToggleLineNumbers
            | Command::About => return None,
        })
    }

    /// Menu text including the tab-separated accelerator hint.
    pub fn menu_text(self) -> String {
        match self.accelerator() {
            Some(acc) => format!("{}\t{}", self.label(), acc.display()),
            None => self.label().to_owned(),
        }
    }

    pub fn separator_before(self) -> bool {
        matches!(
            self,
            Command::Save | Command::Close | Command::Cut | Command::SelectAll | Command::GoTo
        )
    }

    /// Checkable menu items.
    pub fn is_toggle(self) -> bool {
        self == Command::ToggleLineNumbers
    }

    /// Cut and Copy need something selected; everything else is always on.
    pub fn is_enabled(self, has_selection: bool) -> bool {
        match self {
            Command::Cut | Command::Copy => has_selection,
            _ => true,
        }
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

type Handler<C> = Box<dyn FnMut(&mut C)>;

/// Command → handler table over some context `C` (the window state).
pub struct Dispatcher<C> {
    handlers: HashMap<Command, Handler<C>>,
}

impl<C> Default for Dispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Dispatcher<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for `cmd`, replacing any earlier one.
    pub fn on(mut self, cmd: Command, handler: impl FnMut(&mut C) + 'static) -> Self {
        self.handlers.insert(cmd, Box::new(handler));
        self
    }

    pub fn handles(&self, cmd: Command) -> bool {
        self.handlers.contains_key(&cmd)
    }

    /// Run the handler for `cmd`.  Returns `false` if none is registered.
    pub fn dispatch(&mut self, cmd: Command, ctx: &mut C) -> bool {
        match self.handlers.get_mut(&cmd) {
            Some(handler) => {
                trace!("dispatch {cmd:?}");
                handler(ctx);
                true
            }
            None => false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::memory::MemoryBuffer;
    use crate::editor::{EditorSurface, TextBuffer};

    #[test]
    fn ids_are_unique_and_round_trip() {
        for cmd in Command::ALL {
            assert_eq!(Command::from_id(cmd.id()), Some(cmd));
        }
        let mut ids: Vec<u16> = Command::ALL.iter().map(|c| c.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), Command::ALL.len());
        assert_eq!(Command::from_id(0), None);
    }

    #[test]
    fn every_menu_has_a_command() {
        for menu in Menu::ALL {
            assert!(Command::ALL.iter().any(|c| c.menu() == menu), "{menu:?}");
        }
    }

    #[test]
    fn menu_text_includes_accelerator() {
        assert_eq!(Command::FindPrevious.menu_text(), "Find &Previous\tShift+Ctrl+G");
        assert_eq!(Command::NextDocument.menu_text(), "&Next Document\tCtrl+Tab");
        assert_eq!(Command::SaveAs.menu_text(), "Save &As…");
    }

    #[test]
    fn accelerators_do_not_collide() {
        let accs: Vec<Accelerator> = Command::ALL.iter().filter_map(|c| c.accelerator()).collect();
        for (i, a) in accs.iter().enumerate() {
            assert!(!accs[i + 1..].contains(a), "{a:?} bound twice");
        }
    }

    #[test]
    fn cut_copy_follow_selection() {
        assert!(!Command::Cut.is_enabled(false));
        assert!(!Command::Copy.is_enabled(false));
        assert!(Command::Cut.is_enabled(true));
        assert!(Command::Paste.is_enabled(false));
    }

    #[test]
    fn dispatcher_routes_edit_commands() {
        let mut table = Dispatcher::<MemoryBuffer>::new()
            .on(Command::SelectAll, |b| b.select_all())
            .on(Command::Copy, |b| b.copy())
            .on(Command::Paste, |b| b.paste());

        let mut buf = MemoryBuffer::with_text("ab");
        assert!(table.dispatch(Command::SelectAll, &mut buf));
        assert!(table.dispatch(Command::Copy, &mut buf));
        buf.set_insertion_point(2);
        assert!(table.dispatch(Command::Paste, &mut buf));
        assert_eq!(buf.text(), "abab");
        assert!(!table.dispatch(Command::About, &mut buf));
        assert!(!table.handles(Command::About));
    }

    #[test]
    fn later_registration_wins() {
        let mut table = Dispatcher::<u32>::new()
            .on(Command::New, |n| *n += 1)
            .on(Command::New, |n| *n += 10);
        let mut n = 0;
        table.dispatch(Command::New, &mut n);
        assert_eq!(n, 10);
    }
}
