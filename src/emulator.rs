use std::io::Read;

use log::{debug, warn};
use thiserror::Error;

use crate::{
    instruction::Instruction,
    random::{RandomSource, WyRandSource},
};

// memory size
pub const MEM_SIZE: usize = 4096;

// display size, in pixels
pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

// number of keys on the keypad
pub const KEY_COUNT: usize = 16;

// depth of the subroutine stack
const STACK_SIZE: usize = 16;

// start of the font data
const FONT_START: usize = 0x050;

// built-in font
const FONT_DATA: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

// bytes per font glyph
const GLYPH_SIZE: u16 = 5;

// start of the area for user programs
pub const ADDR_START: usize = 0x200;

// rom size
pub const MAX_ROM_SIZE: usize = MEM_SIZE - ADDR_START;

pub type Framebuffer = [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

#[derive(Error, Debug)]
pub enum Error {
    #[error("error reading program: {0}")]
    ProgramRead(#[from] std::io::Error),
    #[error("program is too large: {size} bytes (max {max})")]
    ProgramTooLarge { size: usize, max: usize },
}

#[allow(non_snake_case)]
pub struct Emulator {
    // program counter
    pub PC: u16,

    // full memory
    pub memory: [u8; MEM_SIZE],

    // data registers: V0 - VF
    pub V: [u8; 16],

    // address register
    pub I: u16,

    // subroutine stack and its pointer
    pub stack: [u16; STACK_SIZE],
    pub SP: u8,

    // delay timer
    pub DT: u8,

    // sound timer
    pub ST: u8,

    // display pixels, indexed as [y][x]
    display: Framebuffer,

    // set when the display changes, cleared by whoever draws it
    redraw: bool,

    // which keys are pressed
    keys: [bool; KEY_COUNT],

    // random number generator
    rng: Box<dyn RandomSource>,
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Emulator {
    /// A blank machine: font loaded, PC at the start of the program area.
    pub fn new() -> Self {
        let mut emu = Emulator {
            PC: ADDR_START as u16,
            memory: [0u8; MEM_SIZE],
            V: [0u8; 16],
            I: 0,
            stack: [0u16; STACK_SIZE],
            SP: 0,
            DT: 0,
            ST: 0,
            display: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            redraw: false,
            keys: [false; KEY_COUNT],
            rng: Box::new(WyRandSource::new()),
        };

        let font_area = &mut emu.memory[FONT_START..FONT_START + FONT_DATA.len()];
        font_area.copy_from_slice(&FONT_DATA[..]);

        emu
    }

    /// Build a machine and load a whole chip-8 rom from `rom`.
    pub fn load_rom<T>(mut rom: T) -> Result<Self, Error>
    where
        T: Read,
    {
        // read one byte past the limit, so oversized roms can be detected
        let mut program = Vec::with_capacity(MAX_ROM_SIZE);
        rom.by_ref()
            .take((MAX_ROM_SIZE + 1) as u64)
            .read_to_end(&mut program)?;

        if program.len() > MAX_ROM_SIZE {
            // skip the rest, only to report the real size
            let rest = std::io::copy(&mut rom, &mut std::io::sink())?;
            return Err(Error::ProgramTooLarge {
                size: program.len() + rest as usize,
                max: MAX_ROM_SIZE,
            });
        }

        let mut emu = Emulator::new();
        emu.load_program(&program)?;
        Ok(emu)
    }

    /// Copy `program` into memory at the start of the program area.
    /// Nothing is written if it does not fit.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Error> {
        if program.len() > MAX_ROM_SIZE {
            return Err(Error::ProgramTooLarge {
                size: program.len(),
                max: MAX_ROM_SIZE,
            });
        }

        let program_area = &mut self.memory[ADDR_START..ADDR_START + program.len()];
        program_area.copy_from_slice(program);
        Ok(())
    }

    pub fn set_rng(&mut self, rng: Box<dyn RandomSource>) {
        self.rng = rng;
    }

    pub fn set_key(&mut self, key: usize, state: bool) {
        self.keys[key & 0xF] = state;
    }

    #[cfg(test)]
    pub fn key(&self, key: usize) -> bool {
        self.keys[key & 0xF]
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> bool {
        self.display[y % DISPLAY_HEIGHT][x % DISPLAY_WIDTH]
    }

    pub fn display(&self) -> &Framebuffer {
        &self.display
    }

    /// Whether the display changed since the last `take_redraw`.
    #[cfg(test)]
    pub fn needs_redraw(&self) -> bool {
        self.redraw
    }

    /// Consume the redraw signal.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::replace(&mut self.redraw, false)
    }

    /// Decrease both timers by one, stopping at zero.
    /// Should be called at 60Hz.
    pub fn decrease_timers(&mut self) {
        self.DT = self.DT.saturating_sub(1);
        self.ST = self.ST.saturating_sub(1);
    }

    fn get_pressed_key(&self) -> Option<u8> {
        self.keys.iter().position(|state| *state).map(|k| k as u8)
    }

    #[inline(always)]
    fn read_mem(&self, addr: usize) -> u8 {
        self.memory[addr % MEM_SIZE]
    }

    #[inline(always)]
    fn write_mem(&mut self, addr: usize, value: u8) {
        self.memory[addr % MEM_SIZE] = value;
    }

    /// Execute a single chip-8 CPU instruction.
    pub fn execute(&mut self) {
        // read a command
        let pc = self.PC as usize;
        let opcode = u16::from_be_bytes([self.read_mem(pc), self.read_mem(pc + 1)]);
        self.PC = self.PC.wrapping_add(2);

        self.apply(Instruction::decode(opcode));
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.PC = self.PC.wrapping_add(2);
        }
    }

    fn apply(&mut self, instruction: Instruction) {
        use Instruction::*;

        match instruction {
            Cls => {
                self.display = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
                self.redraw = true;
            }
            Ret => {
                if self.SP == 0 {
                    warn!("stack empty at {:#05X}, wrapping around", self.PC.wrapping_sub(2));
                }
                self.SP = ((self.SP as usize + STACK_SIZE - 1) % STACK_SIZE) as u8;
                self.PC = self.stack[self.SP as usize];
            }
            Jump(addr) => self.PC = addr,
            Call(addr) => {
                self.stack[self.SP as usize] = self.PC;
                if self.SP as usize == STACK_SIZE - 1 {
                    warn!("stack full at {:#05X}, wrapping around", self.PC.wrapping_sub(2));
                }
                self.SP = (self.SP + 1) % STACK_SIZE as u8;
                self.PC = addr;
            }
            SkipEqByte(x, kk) => self.skip_if(self.V[x] == kk),
            SkipNeqByte(x, kk) => self.skip_if(self.V[x] != kk),
            SkipEqReg(x, y) => self.skip_if(self.V[x] == self.V[y]),
            SkipNeqReg(x, y) => self.skip_if(self.V[x] != self.V[y]),
            LoadByte(x, kk) => self.V[x] = kk,
            AddByte(x, kk) => self.V[x] = self.V[x].wrapping_add(kk),
            LoadReg(x, y) => self.V[x] = self.V[y],
            Or(x, y) => self.V[x] |= self.V[y],
            And(x, y) => self.V[x] &= self.V[y],
            Xor(x, y) => self.V[x] ^= self.V[y],
            // both flag and result come from the values before the operation;
            // the result is written last, so it wins when X is F
            AddReg(x, y) => {
                let (result, carry) = self.V[x].overflowing_add(self.V[y]);
                self.V[0xF] = carry as u8;
                self.V[x] = result;
            }
            SubReg(x, y) => {
                let (vx, vy) = (self.V[x], self.V[y]);
                self.V[0xF] = (vx > vy) as u8;
                self.V[x] = vx.wrapping_sub(vy);
            }
            SubNeg(x, y) => {
                let (vx, vy) = (self.V[x], self.V[y]);
                self.V[0xF] = (vy > vx) as u8;
                self.V[x] = vy.wrapping_sub(vx);
            }
            ShiftRight(x) => {
                let vx = self.V[x];
                self.V[0xF] = vx & 1;
                self.V[x] = vx >> 1;
            }
            ShiftLeft(x) => {
                let vx = self.V[x];
                self.V[0xF] = vx >> 7;
                self.V[x] = vx << 1;
            }
            LoadIndex(addr) => self.I = addr,
            JumpOffset(addr) => self.PC = addr + self.V[0x0] as u16,
            Random(x, kk) => self.V[x] = self.rng.next_byte() & kk,
            Draw(x, y, n) => self.draw_sprite(self.V[x] as usize, self.V[y] as usize, n),
            SkipKeyPressed(x) => self.skip_if(self.keys[(self.V[x] & 0xF) as usize]),
            SkipKeyNotPressed(x) => self.skip_if(!self.keys[(self.V[x] & 0xF) as usize]),
            LoadDelay(x) => self.V[x] = self.DT,
            WaitKey(x) => match self.get_pressed_key() {
                Some(key) => self.V[x] = key,
                // fetch this same instruction again on the next cycle
                None => self.PC = self.PC.wrapping_sub(2),
            },
            SetDelay(x) => self.DT = self.V[x],
            SetSound(x) => self.ST = self.V[x],
            // VX is read again after the flag write, so FF1E adds the new VF
            AddIndex(x) => {
                self.V[0xF] = (self.I as u32 + self.V[x] as u32 > 0xFFF) as u8;
                self.I = self.I.wrapping_add(self.V[x] as u16);
            }
            LoadGlyph(x) => self.I = FONT_START as u16 + self.V[x] as u16 * GLYPH_SIZE,
            StoreBcd(x) => {
                let i = self.I as usize;
                let value = self.V[x];
                self.write_mem(i, value / 100);
                self.write_mem(i + 1, value / 10 % 10);
                self.write_mem(i + 2, value % 10);
            }
            StoreRegs(x) => {
                let i = self.I as usize;
                for offset in 0..=x {
                    self.write_mem(i + offset, self.V[offset]);
                }
                self.I = self.I.wrapping_add(x as u16 + 1);
            }
            LoadRegs(x) => {
                let i = self.I as usize;
                for offset in 0..=x {
                    self.V[offset] = self.read_mem(i + offset);
                }
                self.I = self.I.wrapping_add(x as u16 + 1);
            }
            Unknown(opcode) => {
                debug!(
                    "ignoring unknown instruction at {:#05X}: {:04X}",
                    self.PC.wrapping_sub(2),
                    opcode
                );
            }
        }
    }

    /// XOR `rows` bytes of sprite data at I onto the display, starting on
    /// (x, y). VF is set if any pixel was turned off.
    fn draw_sprite(&mut self, x: usize, y: usize, rows: u8) {
        self.V[0xF] = 0;

        for row in 0..rows as usize {
            let sprite = self.read_mem(self.I as usize + row);
            let py = (y + row) % DISPLAY_HEIGHT;

            for col in 0..8 {
                if sprite & (0x80 >> col) == 0 {
                    continue;
                }

                let px = (x + col) % DISPLAY_WIDTH;
                let pixel = &mut self.display[py][px];
                if *pixel {
                    self.V[0xF] = 1;
                }
                *pixel = !*pixel;
            }
        }

        self.redraw = true;
    }
}
