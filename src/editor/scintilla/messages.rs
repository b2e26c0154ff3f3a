// ── Scintilla message constants ───────────────────────────────────────────────
//
// Source of truth: Scintilla.h (https://www.scintilla.org/ScintillaDoc.html)
// Only the subset tack sends is listed here.
// All SCI_* values are sent via SendMessageW(hwnd_sci, SCI_*, wparam, lparam).

// ── Code page ─────────────────────────────────────────────────────────────────

/// Set the code page.  Pass `SC_CP_UTF8` as WPARAM.
pub(super) const SCI_SETCODEPAGE: u32 = 2037;
/// UTF-8 code page value for `SCI_SETCODEPAGE`.
pub(super) const SC_CP_UTF8: usize = 65001;

// ── Document content ──────────────────────────────────────────────────────────

/// Replace all document text.  WPARAM=0; LPARAM=null-terminated UTF-8 string.
pub(super) const SCI_SETTEXT: u32 = 2181;
/// Return byte count of the document (excluding null terminator).
pub(super) const SCI_GETLENGTH: u32 = 2006;
/// Copy document bytes.  WPARAM=buffer len (incl. null); LPARAM=buffer ptr.
pub(super) const SCI_GETTEXT: u32 = 2182;
/// Copy a byte range.  LPARAM=`*mut SciTextRange`.
pub(super) const SCI_GETTEXTRANGE: u32 = 2162;
/// Mark the current state as the save point.
pub(super) const SCI_SETSAVEPOINT: u32 = 2014;
/// Non-zero when the document differs from the save point.
pub(super) const SCI_GETMODIFY: u32 = 2159;

// ── Caret / selection ─────────────────────────────────────────────────────────

/// Return the byte position of the caret.
pub(super) const SCI_GETCURRENTPOS: u32 = 2008;
/// Return the byte position of the selection anchor.
pub(super) const SCI_GETANCHOR: u32 = 2009;
/// Move the caret to a byte position, collapsing the selection.
pub(super) const SCI_GOTOPOS: u32 = 2025;
/// Set anchor (WPARAM) and caret (LPARAM).
pub(super) const SCI_SETSEL: u32 = 2160;
/// Replace the selection with LPARAM (null-terminated UTF-8).
pub(super) const SCI_REPLACESEL: u32 = 2170;
/// Select the whole document.
pub(super) const SCI_SELECTALL: u32 = 2013;

// ── Lines / columns ───────────────────────────────────────────────────────────

/// Convert a byte position to a 0-based line number.
pub(super) const SCI_LINEFROMPOSITION: u32 = 2166;
/// Byte position of the first character on a line.
pub(super) const SCI_POSITIONFROMLINE: u32 = 2167;
/// Byte position of the end of a line, before the EOL characters.
pub(super) const SCI_GETLINEENDPOSITION: u32 = 2136;
/// Number of lines in the document (at least 1).
pub(super) const SCI_GETLINECOUNT: u32 = 2154;
/// Characters between two byte positions.
pub(super) const SCI_COUNTCHARACTERS: u32 = 2633;
/// Byte position `LPARAM` characters after `WPARAM`; 0 if out of range.
pub(super) const SCI_POSITIONRELATIVE: u32 = 2670;

// ── Scroll ────────────────────────────────────────────────────────────────────

/// Scroll so that both WPARAM and LPARAM positions are visible.
pub(super) const SCI_SCROLLRANGE: u32 = 2569;

// ── Search / target ───────────────────────────────────────────────────────────

pub(super) const SCI_SETTARGETSTART: u32 = 2190;
pub(super) const SCI_SETTARGETEND: u32 = 2192;
pub(super) const SCI_GETTARGETEND: u32 = 2193;
/// Replace the target.  WPARAM=length; LPARAM=text.
pub(super) const SCI_REPLACETARGET: u32 = 2194;
/// Search the target range.  Start > end searches backward.
pub(super) const SCI_SEARCHINTARGET: u32 = 2197;
/// Set `SCFIND_*` flags for `SCI_SEARCHINTARGET`.
pub(super) const SCI_SETSEARCHFLAGS: u32 = 2198;

// ── Edit operations ───────────────────────────────────────────────────────────

pub(super) const SCI_UNDO: u32 = 2176;
pub(super) const SCI_REDO: u32 = 2011;
pub(super) const SCI_CANUNDO: u32 = 2174;
pub(super) const SCI_CANREDO: u32 = 2016;
pub(super) const SCI_EMPTYUNDOBUFFER: u32 = 2175;
pub(super) const SCI_BEGINUNDOACTION: u32 = 2078;
pub(super) const SCI_ENDUNDOACTION: u32 = 2079;
pub(super) const SCI_CUT: u32 = 2177;
pub(super) const SCI_COPY: u32 = 2178;
pub(super) const SCI_PASTE: u32 = 2179;

// ── Styles ────────────────────────────────────────────────────────────────────

/// Style every other style is reset to by `SCI_STYLECLEARALL`.
pub(super) const STYLE_DEFAULT: usize = 32;
pub(super) const SCI_STYLECLEARALL: u32 = 2050;
pub(super) const SCI_STYLESETBOLD: u32 = 2053;
pub(super) const SCI_STYLESETITALIC: u32 = 2054;
pub(super) const SCI_STYLESETSIZE: u32 = 2055;
/// LPARAM = null-terminated UTF-8 face name.
pub(super) const SCI_STYLESETFONT: u32 = 2056;

// ── Margins ───────────────────────────────────────────────────────────────────

/// Margin index used for line numbers.
pub(super) const LINE_NUMBER_MARGIN: usize = 1;
pub(super) const SCI_SETMARGINTYPEN: u32 = 2240;
pub(super) const SCI_SETMARGINWIDTHN: u32 = 2242;
pub(super) const SC_MARGIN_NUMBER: isize = 1;

// Notification codes (SCN_*) live in `editor::Notification`, which the
// portable core decodes.
