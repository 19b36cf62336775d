//! Everything that talks to the host: drawing the display and reading keys.

use crate::{emulator::Framebuffer, keymap::Action};

pub mod terminal;
#[cfg(feature = "sdl")]
pub mod window;

/// A place to draw the display and read input from.
///
/// The run loop polls once per frame and renders only when the emulator
/// says the display changed.
pub trait Frontend {
    /// Actions for all host input received since the last poll.
    fn poll(&mut self) -> Result<Vec<Action>, anyhow::Error>;

    /// Paint the whole display.
    fn render(&mut self, display: &Framebuffer) -> Result<(), anyhow::Error>;
}
