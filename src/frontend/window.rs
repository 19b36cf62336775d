use anyhow::Context;
use sdl2::{
    event::Event,
    keyboard::{Keycode, Mod},
    pixels::Color,
    rect::Rect,
    render::Canvas,
    video::Window,
    EventPump,
};
use thiserror::Error;

use super::Frontend;
use crate::{
    emulator::{Framebuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH},
    keymap::{Action, HostKey, Keymap, QUIT_CHAR},
};

#[derive(Error, Debug)]
enum FrontendError {
    #[error("SDL error: {0}")]
    Sdl(String),
}

impl From<String> for FrontendError {
    fn from(s: String) -> Self {
        FrontendError::Sdl(s)
    }
}

fn host_key(keycode: Keycode, keymod: Mod) -> Option<HostKey> {
    if keycode == Keycode::Escape {
        return Some(HostKey::Escape);
    }
    if keycode == Keycode::Q && keymod.intersects(Mod::LCTRLMOD | Mod::RCTRLMOD) {
        return Some(HostKey::Char(QUIT_CHAR));
    }

    // single character key names ("Q", "1", ...) map straight to the keymap
    let name = keycode.name();
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(HostKey::Char(c)),
        _ => None,
    }
}

/// Draws on an SDL window, each display pixel as a `scale` sized square.
pub struct WindowFrontend {
    canvas: Canvas<Window>,
    event_pump: EventPump,
    keymap: Keymap,
    scale: u32,
}

impl WindowFrontend {
    pub fn new(scale: u32) -> Result<Self, anyhow::Error> {
        // initialize SDL context and subsystems
        let sdl_context = sdl2::init()
            .map_err(FrontendError::from)
            .context("failed to initialize SDL context")?;
        let sdl_video = sdl_context
            .video()
            .map_err(FrontendError::from)
            .context("failed to initialize video subsystem")?;

        // build the window
        let window = sdl_video
            .window(
                "RC8",
                DISPLAY_WIDTH as u32 * scale,
                DISPLAY_HEIGHT as u32 * scale,
            )
            .position_centered()
            .build()
            .context("error creating window")?;

        // get the drawing canvas
        let canvas = window
            .into_canvas()
            .build()
            .context("error creating window canvas")?;

        // get the event pump
        let event_pump = sdl_context
            .event_pump()
            .map_err(FrontendError::from)
            .context("error obtaining the event pump")?;

        Ok(WindowFrontend {
            canvas,
            event_pump,
            keymap: Keymap::Chip8,
            scale,
        })
    }
}

impl Frontend for WindowFrontend {
    fn poll(&mut self) -> Result<Vec<Action>, anyhow::Error> {
        let mut actions = Vec::new();

        for event in self.event_pump.poll_iter() {
            let action = match event {
                Event::Quit { .. } => Some(Action::Quit),
                Event::KeyDown {
                    keycode: Some(keycode),
                    keymod,
                    repeat: false,
                    ..
                } => host_key(keycode, keymod)
                    .and_then(|key| self.keymap.translate_action(key, true)),
                Event::KeyUp {
                    keycode: Some(keycode),
                    keymod,
                    ..
                } => host_key(keycode, keymod)
                    .and_then(|key| self.keymap.translate_action(key, false)),
                _ => None,
            };
            actions.extend(action);
        }

        Ok(actions)
    }

    fn render(&mut self, display: &Framebuffer) -> Result<(), anyhow::Error> {
        self.canvas.set_draw_color(Color::RGB(0x00, 0x00, 0x00));
        self.canvas.clear();

        self.canvas.set_draw_color(Color::RGB(0xFF, 0xFF, 0xFF));
        for (y, row) in display.iter().enumerate() {
            for (x, pixel) in row.iter().enumerate() {
                if *pixel {
                    let rect = Rect::new(
                        x as i32 * self.scale as i32,
                        y as i32 * self.scale as i32,
                        self.scale,
                        self.scale,
                    );
                    self.canvas
                        .fill_rect(rect)
                        .map_err(FrontendError::from)
                        .context("error drawing to canvas")?;
                }
            }
        }
        self.canvas.present();
        Ok(())
    }
}
