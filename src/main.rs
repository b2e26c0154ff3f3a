// Release builds run as a GUI application (no console window).
// Debug builds keep the console so that log output is visible.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
#![deny(unsafe_code)]

use std::path::PathBuf;

use clap::Parser;

/// A minimal text editor.
#[derive(Debug, Parser)]
#[command(name = "tack", version, about)]
struct Cli {
    /// File to open on startup.
    path: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    std::process::exit(run(cli));
}

#[cfg(windows)]
fn run(cli: Cli) -> i32 {
    use tack::platform::win32::window;

    if let Err(e) = window::run(cli.path) {
        // Startup failed before or during the message loop.
        // A modal dialog is the only output a GUI process is sure to show.
        log::error!("{e}");
        window::show_error_dialog(&e.to_string());
        return 1;
    }
    0
}

#[cfg(not(windows))]
fn run(cli: Cli) -> i32 {
    log::error!(
        "tack's editor window needs Windows; nothing to show for {:?}",
        cli.path
    );
    1
}
