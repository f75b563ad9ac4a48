//! Color-coded terminal output for pipeline status lines.
//!
//! Informational and success lines go to stdout, warnings and errors to
//! stderr. Color is applied only when the chosen stream is a terminal and
//! color has not been disabled.

use std::io::{IsTerminal, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// User preference for colored output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorPreference {
    /// Color when the stream is a terminal
    #[default]
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Severity-aware status line printer.
#[derive(Clone, Copy, Debug)]
pub struct OutputManager {
    color: ColorPreference,
    verbose: bool,
}

impl OutputManager {
    pub fn new(color: ColorPreference, verbose: bool) -> Self {
        Self { color, verbose }
    }

    fn stdout(&self) -> StandardStream {
        let choice = match self.color {
            ColorPreference::Always => ColorChoice::Always,
            ColorPreference::Never => ColorChoice::Never,
            ColorPreference::Auto => {
                if std::io::stdout().is_terminal() {
                    ColorChoice::Auto
                } else {
                    ColorChoice::Never
                }
            }
        };
        StandardStream::stdout(choice)
    }

    fn stderr(&self) -> StandardStream {
        let choice = match self.color {
            ColorPreference::Always => ColorChoice::Always,
            ColorPreference::Never => ColorChoice::Never,
            ColorPreference::Auto => {
                if std::io::stderr().is_terminal() {
                    ColorChoice::Auto
                } else {
                    ColorChoice::Never
                }
            }
        };
        StandardStream::stderr(choice)
    }

    fn colored(stream: &mut StandardStream, color: Color, prefix: &str, message: &str) {
        // Print failures are swallowed; a broken pipe must not fail the run.
        let _ = stream.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = write!(stream, "{prefix}");
        let _ = stream.reset();
        let _ = writeln!(stream, "{message}");
    }

    /// Plain informational line on stdout.
    pub fn info(&self, message: &str) {
        let mut out = self.stdout();
        let _ = writeln!(out, "{message}");
    }

    /// Success line on stdout, colored as a whole.
    pub fn success(&self, message: &str) {
        let mut out = self.stdout();
        let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
        let _ = writeln!(out, "{message}");
        let _ = out.reset();
    }

    /// Progress line on stdout, used for subprocess invocations.
    pub fn progress(&self, message: &str) {
        Self::colored(&mut self.stdout(), Color::Cyan, "> ", message);
    }

    /// Informational line on stdout, shown only in verbose mode.
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            self.info(message);
        }
    }

    /// Warning line on stderr.
    pub fn warn(&self, message: &str) {
        Self::colored(&mut self.stderr(), Color::Yellow, "warning: ", message);
    }

    /// Error line on stderr.
    pub fn error(&self, message: &str) {
        Self::colored(&mut self.stderr(), Color::Red, "error: ", message);
    }
}
