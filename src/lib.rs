//! A chip-8 virtual machine, plus the run loop and frontends to play it.

pub mod app;
pub mod emulator;
pub mod frontend;
pub mod instruction;
pub mod keymap;
pub mod random;
