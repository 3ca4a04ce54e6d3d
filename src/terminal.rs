use anyhow::Context;
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    terminal::{self, ClearType, SetTitle},
    ExecutableCommand,
};
use std::io::{stdout, Stdout, Write};

/// Puts the terminal into sketch mode: raw input, alternate screen, no cursor
/// and mouse reporting. Dropping the guard restores whatever was switched on,
/// newest first.
pub struct TerminalGuard {
    raw: bool,
    alt_screen: bool,
    mouse: bool,
}

impl TerminalGuard {
    pub fn new() -> anyhow::Result<Self> {
        let mut guard = Self {
            raw: false,
            alt_screen: false,
            mouse: false,
        };
        let mut out = stdout();

        terminal::enable_raw_mode().context("enable raw mode")?;
        guard.raw = true;

        out.execute(terminal::EnterAlternateScreen)
            .context("enter alternate screen")?;
        guard.alt_screen = true;
        out.execute(terminal::Clear(ClearType::All))
            .context("clear screen")?;
        out.execute(cursor::Hide).context("hide cursor")?;
        // Not every terminal honors titles; ignore failures.
        let _ = out.execute(SetTitle("70s Melt"));

        out.execute(EnableMouseCapture)
            .context("enable mouse capture")?;
        guard.mouse = true;

        Ok(guard)
    }

    pub fn stdout() -> Stdout {
        stdout()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut out = stdout();
        if self.mouse {
            let _ = out.execute(DisableMouseCapture);
        }
        // Sync output and autowrap may still be toggled from a cut-off frame.
        let _ = out.write_all(b"\x1b[?2026l\x1b[?7h\x1b[0m");
        let _ = out.flush();
        let _ = out.execute(cursor::Show);
        if self.alt_screen {
            let _ = out.execute(terminal::LeaveAlternateScreen);
        }
        if self.raw {
            let _ = terminal::disable_raw_mode();
        }
    }
}
