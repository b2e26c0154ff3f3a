// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except:
//   • `platform::win32`   – Win32 / WinAPI FFI
//   • `editor::scintilla` – Scintilla child-window hosting
// Each unsafe block in those modules MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

//! tack: a minimal text editor.
//!
//! The library holds everything that does not need a window: the text-buffer
//! traits and an in-memory implementation, the find / replace / go-to helper,
//! documents, settings and the command table.  The Win32 shell lives in
//! `platform::win32` and is compiled on Windows only.

pub mod app;
pub mod commands;
pub mod editor;
pub mod error;
pub mod search;
pub mod settings;

#[cfg(windows)]
pub mod platform;
