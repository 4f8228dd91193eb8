use std::io::{self, Write};

/// Escape sequence moving the cursor home and clearing the terminal.
const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";

/// Destination of rendered dashboard frames.
///
/// Writing a frame is assumed to succeed, implementations swallow their own failures.
pub trait DisplaySink {
    fn write_frame(&mut self, frame: &str);
}

/// Sink redrawing the frame on standard output.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl DisplaySink for TerminalSink {
    fn write_frame(&mut self, frame: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(CLEAR_SCREEN.as_bytes());
        let _ = stdout.write_all(frame.as_bytes());
        let _ = stdout.flush();
    }
}
