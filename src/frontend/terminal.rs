use std::{
    io::{self, Stdout, Write},
    time::{Duration, Instant},
};

use anyhow::Context;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use super::Frontend;
use crate::{
    emulator::{Framebuffer, DISPLAY_WIDTH, KEY_COUNT},
    keymap::{Action, HostKey, Keymap},
};

// terminals only report presses, so a key counts as held for this long
// after its last press (or auto-repeat)
const KEY_HOLD: Duration = Duration::from_millis(150);

/// Tracks which keypad keys are held, from press events alone.
struct KeyHold {
    pressed_at: [Option<Instant>; KEY_COUNT],
    hold: Duration,
}

impl KeyHold {
    fn new(hold: Duration) -> Self {
        KeyHold {
            pressed_at: [None; KEY_COUNT],
            hold,
        }
    }

    /// Record a press; returns true if the key was not already held.
    fn press(&mut self, key: usize, now: Instant) -> bool {
        self.pressed_at[key].replace(now).is_none()
    }

    /// Release every key not pressed again within the hold time.
    fn release_expired(&mut self, now: Instant, actions: &mut Vec<Action>) {
        for (key, pressed_at) in self.pressed_at.iter_mut().enumerate() {
            if let Some(at) = *pressed_at {
                if now.duration_since(at) >= self.hold {
                    *pressed_at = None;
                    actions.push(Action::EmulateKeyState(key, false));
                }
            }
        }
    }
}

/// Strip a crossterm key event down to what the keymap understands.
fn host_key(key: &KeyEvent) -> Option<HostKey> {
    match key.code {
        KeyCode::Esc => Some(HostKey::Escape),
        // raw mode reports Ctrl-<letter> as the letter plus a modifier;
        // turn it back into the control character
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() {
                char::from_u32(c as u32 - 'a' as u32 + 1).map(HostKey::Char)
            } else {
                None
            }
        }
        KeyCode::Char(c) => Some(HostKey::Char(c)),
        _ => None,
    }
}

/// Two display rows per text line, using half block glyphs.
fn render_lines(display: &Framebuffer) -> Vec<String> {
    display
        .chunks(2)
        .map(|rows| {
            (0..DISPLAY_WIDTH)
                .map(|x| match (rows[0][x], rows.get(1).map_or(false, |r| r[x])) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                })
                .collect()
        })
        .collect()
}

/// Draws on the terminal, in raw mode on the alternate screen.
/// The terminal is restored when this is dropped.
pub struct TerminalFrontend {
    stdout: Stdout,
    keymap: Keymap,
    keys: KeyHold,
}

impl TerminalFrontend {
    pub fn new() -> Result<Self, anyhow::Error> {
        let mut frontend = TerminalFrontend {
            stdout: io::stdout(),
            keymap: Keymap::Chip8,
            keys: KeyHold::new(KEY_HOLD),
        };

        // if this fails, dropping `frontend` puts the terminal back
        terminal::enable_raw_mode().context("failed to enable raw mode")?;
        execute!(
            frontend.stdout,
            EnterAlternateScreen,
            Hide,
            Clear(ClearType::All)
        )
        .context("failed to set up the terminal")?;

        Ok(frontend)
    }
}

impl Drop for TerminalFrontend {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

impl Frontend for TerminalFrontend {
    fn poll(&mut self) -> Result<Vec<Action>, anyhow::Error> {
        let now = Instant::now();
        let mut actions = Vec::new();

        while event::poll(Duration::ZERO).context("error polling terminal events")? {
            let event = event::read().context("error reading terminal event")?;
            let key = match event {
                Event::Key(key) if key.kind != KeyEventKind::Release => key,
                _ => continue,
            };

            match host_key(&key).and_then(|k| self.keymap.translate_action(k, true)) {
                Some(Action::EmulateKeyState(index, _)) => {
                    if self.keys.press(index, now) {
                        actions.push(Action::EmulateKeyState(index, true));
                    }
                }
                Some(action) => actions.push(action),
                None => {}
            }
        }

        self.keys.release_expired(now, &mut actions);
        Ok(actions)
    }

    fn render(&mut self, display: &Framebuffer) -> Result<(), anyhow::Error> {
        for (row, line) in render_lines(display).iter().enumerate() {
            queue!(self.stdout, MoveTo(0, row as u16), Print(line))
                .context("error drawing to terminal")?;
        }
        self.stdout.flush().context("error drawing to terminal")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::DISPLAY_HEIGHT;
    use crate::keymap::QUIT_CHAR;

    #[test]
    fn test_host_key_plain_chars() {
        let key = KeyEvent::new(KeyCode::Char('w'), KeyModifiers::NONE);
        assert_eq!(host_key(&key), Some(HostKey::Char('w')));

        let key = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(host_key(&key), Some(HostKey::Escape));

        let key = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(host_key(&key), None);
    }

    #[test]
    fn test_host_key_ctrl_q_quits() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert_eq!(host_key(&key), Some(HostKey::Char(QUIT_CHAR)));
        assert_eq!(
            Keymap::Chip8.translate_action(HostKey::Char(QUIT_CHAR), true),
            Some(Action::Quit)
        );

        // other control chords do not reach the keypad
        let key = KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL);
        let host = host_key(&key).unwrap();
        assert_eq!(Keymap::Chip8.translate_action(host, true), None);
    }

    #[test]
    fn test_key_hold_releases_after_timeout() {
        let start = Instant::now();
        let mut keys = KeyHold::new(Duration::from_millis(100));
        let mut actions = Vec::new();

        assert!(keys.press(0x5, start));
        assert!(!keys.press(0x5, start + Duration::from_millis(50)));

        keys.release_expired(start + Duration::from_millis(120), &mut actions);
        assert!(actions.is_empty());

        keys.release_expired(start + Duration::from_millis(150), &mut actions);
        assert_eq!(actions, vec![Action::EmulateKeyState(0x5, false)]);

        // released keys are reported as new presses
        assert!(keys.press(0x5, start + Duration::from_millis(200)));
    }

    #[test]
    fn test_render_lines() {
        let mut display = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
        display[0][0] = true;
        display[1][0] = true;
        display[0][1] = true;
        display[1][2] = true;
        display[31][63] = true;

        let lines = render_lines(&display);
        assert_eq!(lines.len(), DISPLAY_HEIGHT / 2);
        assert!(lines.iter().all(|l| l.chars().count() == DISPLAY_WIDTH));
        assert!(lines[0].starts_with("█▀▄ "));
        assert!(lines[15].ends_with(" ▄"));
        assert!(lines[1].chars().all(|c| c == ' '));
    }
}
