use std::time::{Duration, Instant};

use log::info;

use crate::{
    emulator::Emulator,
    frontend::Frontend,
    keymap::Action,
};

const TIMER_DELAY: u128 = 1_000_000 / 60;

// how long to sleep between frames
const FRAME_SLEEP: Duration = Duration::from_millis(1);

/// Run loop settings
pub struct Config {
    /// instructions executed per second
    pub frequency: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config { frequency: 700 }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum AppState {
    Running,
    Quit,
}

/// Turns elapsed time (in microseconds) into cpu cycles and timer ticks.
/// Leftover time carries over to the next call.
struct Scheduler {
    frequency: u128,
    // elapsed microseconds, times the frequency
    cpu_delta: u128,
    timer_delta: u128,
}

impl Scheduler {
    fn new(frequency: u32) -> Self {
        Scheduler {
            frequency: frequency.max(1) as u128,
            cpu_delta: 0,
            timer_delta: 0,
        }
    }

    fn advance(&mut self, elapsed: u128) -> (u128, u128) {
        self.cpu_delta += elapsed * self.frequency;
        self.timer_delta += elapsed;

        let cycles = self.cpu_delta / 1_000_000;
        self.cpu_delta %= 1_000_000;

        let ticks = self.timer_delta / TIMER_DELAY;
        self.timer_delta %= TIMER_DELAY;

        (cycles, ticks)
    }
}

/// One pass of the loop: input, cpu, timers, then drawing.
fn frame<F: Frontend>(
    emu: &mut Emulator,
    frontend: &mut F,
    scheduler: &mut Scheduler,
    elapsed: u128,
) -> Result<AppState, anyhow::Error> {
    // process input events
    for action in frontend.poll()? {
        match action {
            Action::EmulateKeyState(key, state) => emu.set_key(key, state),
            Action::Quit => return Ok(AppState::Quit),
        }
    }

    let (cycles, ticks) = scheduler.advance(elapsed);

    // run cpu
    for _ in 0..cycles {
        emu.execute();
    }

    // update timers
    for _ in 0..ticks {
        emu.decrease_timers();
    }

    if emu.take_redraw() {
        frontend.render(emu.display())?;
    }

    Ok(AppState::Running)
}

/// Main application loop
pub fn run<F: Frontend>(
    mut emu: Emulator,
    frontend: &mut F,
    config: &Config,
) -> Result<(), anyhow::Error> {
    info!("running at {}Hz", config.frequency);

    let mut scheduler = Scheduler::new(config.frequency);
    let mut previous = Instant::now();

    frontend.render(emu.display())?;

    loop {
        let now = Instant::now();
        let elapsed = now.duration_since(previous).as_micros();
        previous = now;

        if frame(&mut emu, frontend, &mut scheduler, elapsed)? == AppState::Quit {
            break;
        }

        std::thread::sleep(FRAME_SLEEP);
    }

    info!("quit requested");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::emulator::Framebuffer;

    /// Replays canned input, one batch per poll, and records renders.
    struct FakeFrontend {
        input: VecDeque<Vec<Action>>,
        renders: Vec<Framebuffer>,
    }

    impl FakeFrontend {
        fn new(input: Vec<Vec<Action>>) -> Self {
            FakeFrontend {
                input: input.into(),
                renders: Vec::new(),
            }
        }
    }

    impl Frontend for FakeFrontend {
        fn poll(&mut self) -> Result<Vec<Action>, anyhow::Error> {
            Ok(self.input.pop_front().unwrap_or_default())
        }

        fn render(&mut self, display: &Framebuffer) -> Result<(), anyhow::Error> {
            self.renders.push(*display);
            Ok(())
        }
    }

    fn emulator(program: &[u8]) -> Emulator {
        let mut emu = Emulator::new();
        emu.load_program(program).unwrap();
        emu
    }

    #[test]
    fn test_scheduler_one_second() {
        let mut scheduler = Scheduler::new(700);
        assert_eq!(scheduler.advance(1_000_000), (700, 60));
    }

    #[test]
    fn test_scheduler_uneven_frequency() {
        let mut scheduler = Scheduler::new(3000);
        assert_eq!(scheduler.advance(1_000_000), (3000, 60));

        let mut scheduler = Scheduler::new(600_000);
        assert_eq!(scheduler.advance(1_000_000), (600_000, 60));

        // 0.7 cycles per millisecond
        let mut scheduler = Scheduler::new(700);
        let cycles: u128 = (0..1000).map(|_| scheduler.advance(1000).0).sum();
        assert_eq!(cycles, 700);
    }

    #[test]
    fn test_scheduler_carries_leftover_time() {
        let mut scheduler = Scheduler::new(1000);

        assert_eq!(scheduler.advance(600), (0, 0));
        assert_eq!(scheduler.advance(600), (1, 0));
        assert_eq!(scheduler.advance(800), (1, 0));
        assert_eq!(scheduler.advance(TIMER_DELAY), (16, 1));
    }

    #[test]
    fn test_frame_applies_key_actions() {
        let mut emu = emulator(&[]);
        let mut frontend = FakeFrontend::new(vec![
            vec![
                Action::EmulateKeyState(0x3, true),
                Action::EmulateKeyState(0x7, true),
            ],
            vec![Action::EmulateKeyState(0x3, false)],
        ]);
        let mut scheduler = Scheduler::new(700);

        frame(&mut emu, &mut frontend, &mut scheduler, 0).unwrap();
        assert!(emu.key(0x3));
        assert!(emu.key(0x7));

        frame(&mut emu, &mut frontend, &mut scheduler, 0).unwrap();
        assert!(!emu.key(0x3));
        assert!(emu.key(0x7));
    }

    #[test]
    fn test_frame_quit_stops_before_executing() {
        let mut emu = emulator(&[0x60, 0x01]);
        let mut frontend = FakeFrontend::new(vec![vec![Action::Quit]]);
        let mut scheduler = Scheduler::new(1000);

        let state = frame(&mut emu, &mut frontend, &mut scheduler, 10_000).unwrap();
        assert_eq!(state, AppState::Quit);
        assert_eq!(emu.PC, 0x200);
        assert_eq!(emu.V[0x0], 0x00);
    }

    #[test]
    fn test_frame_renders_only_on_change() {
        let rom: [u8; 6] = [
            0x60, 0x01, // 0x200: SET V0 = 0x01
            0xA0, 0x50, // 0x202: SET I = 0x050 (glyph "0")
            0xD0, 0x05, // 0x204: DRAW 8x5 at V0,V0
        ];

        let mut emu = emulator(&rom[..]);
        let mut frontend = FakeFrontend::new(vec![]);
        let mut scheduler = Scheduler::new(1000);

        frame(&mut emu, &mut frontend, &mut scheduler, 2000).unwrap();
        assert!(frontend.renders.is_empty());

        frame(&mut emu, &mut frontend, &mut scheduler, 1000).unwrap();
        assert_eq!(frontend.renders.len(), 1);
        assert!(frontend.renders[0][1][1]);
        assert!(!frontend.renders[0][0][0]);
        assert!(!emu.needs_redraw());
    }

    #[test]
    fn test_frame_ticks_timers() {
        let mut emu = emulator(&[0x12, 0x00]); // 0x200: JMP 0x200
        emu.DT = 100;
        emu.ST = 30;
        let mut frontend = FakeFrontend::new(vec![]);
        let mut scheduler = Scheduler::new(700);

        frame(&mut emu, &mut frontend, &mut scheduler, 1_000_000).unwrap();
        assert_eq!(emu.DT, 40);
        assert_eq!(emu.ST, 0);
    }

    #[test]
    fn test_frame_wait_key_blocks_until_pressed() {
        let rom: [u8; 4] = [
            0xF3, 0x0A, // 0x200: Set V3 = <pressed key> (wait)
            0x61, 0x01, // 0x202: Set V1 = 0x01
        ];

        let mut emu = emulator(&rom[..]);
        let mut frontend = FakeFrontend::new(vec![
            vec![],
            vec![],
            vec![Action::EmulateKeyState(0xB, true)],
        ]);
        let mut scheduler = Scheduler::new(1000);

        frame(&mut emu, &mut frontend, &mut scheduler, 1000).unwrap();
        frame(&mut emu, &mut frontend, &mut scheduler, 1000).unwrap();
        assert_eq!(emu.PC, 0x200);

        frame(&mut emu, &mut frontend, &mut scheduler, 1000).unwrap();
        assert_eq!(emu.V[0x3], 0xB);
        assert_eq!(emu.PC, 0x202);
    }
}
