/// A decoded chip-8 instruction.
///
/// Register operands are stored as indexes into `V` (`0x0..=0xF`), so they
/// can be used directly without further masking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0 - clear the screen
    Cls,
    /// 00EE - return from subroutine
    Ret,
    /// 1NNN - jump to NNN
    Jump(u16),
    /// 2NNN - call subroutine at NNN
    Call(u16),
    /// 3XNN - skip next if VX == NN
    SkipEqByte(usize, u8),
    /// 4XNN - skip next if VX != NN
    SkipNeqByte(usize, u8),
    /// 5XY0 - skip next if VX == VY
    SkipEqReg(usize, usize),
    /// 6XNN - VX = NN
    LoadByte(usize, u8),
    /// 7XNN - VX = VX + NN, VF untouched
    AddByte(usize, u8),
    /// 8XY0 - VX = VY
    LoadReg(usize, usize),
    /// 8XY1 - VX = VX | VY
    Or(usize, usize),
    /// 8XY2 - VX = VX & VY
    And(usize, usize),
    /// 8XY3 - VX = VX ^ VY
    Xor(usize, usize),
    /// 8XY4 - VX = VX + VY, VF = carry
    AddReg(usize, usize),
    /// 8XY5 - VX = VX - VY, VF = not borrow
    SubReg(usize, usize),
    /// 8XY6 - VX = VX >> 1, VF = shifted out bit
    ShiftRight(usize),
    /// 8XY7 - VX = VY - VX, VF = not borrow
    SubNeg(usize, usize),
    /// 8XYE - VX = VX << 1, VF = shifted out bit
    ShiftLeft(usize),
    /// 9XY0 - skip next if VX != VY
    SkipNeqReg(usize, usize),
    /// ANNN - I = NNN
    LoadIndex(u16),
    /// BNNN - jump to NNN + V0
    JumpOffset(u16),
    /// CXNN - VX = random & NN
    Random(usize, u8),
    /// DXYN - draw N rows of the sprite at I on (VX, VY)
    Draw(usize, usize, u8),
    /// EX9E - skip next if key VX is pressed
    SkipKeyPressed(usize),
    /// EXA1 - skip next if key VX is not pressed
    SkipKeyNotPressed(usize),
    /// FX07 - VX = DT
    LoadDelay(usize),
    /// FX0A - wait for a key press, store it in VX
    WaitKey(usize),
    /// FX15 - DT = VX
    SetDelay(usize),
    /// FX18 - ST = VX
    SetSound(usize),
    /// FX1E - I = I + VX, VF = overflow past 0xFFF
    AddIndex(usize),
    /// FX29 - I = address of the font glyph for VX
    LoadGlyph(usize),
    /// FX33 - BCD of VX into I, I+1, I+2
    StoreBcd(usize),
    /// FX55 - store V0..=VX starting at I
    StoreRegs(usize),
    /// FX65 - load V0..=VX starting at I
    LoadRegs(usize),
    /// Anything else. Executing it has no effect.
    Unknown(u16),
}

#[inline(always)]
fn x(opcode: u16) -> usize {
    ((opcode >> 8) & 0xF) as usize
}

#[inline(always)]
fn y(opcode: u16) -> usize {
    ((opcode >> 4) & 0xF) as usize
}

#[inline(always)]
fn n(opcode: u16) -> u8 {
    (opcode & 0xF) as u8
}

#[inline(always)]
fn kk(opcode: u16) -> u8 {
    (opcode & 0xFF) as u8
}

#[inline(always)]
fn nnn(opcode: u16) -> u16 {
    opcode & 0xFFF
}

impl Instruction {
    /// Decode a big-endian opcode.
    pub fn decode(opcode: u16) -> Instruction {
        use Instruction::*;

        match opcode >> 12 {
            0x0 => match opcode {
                0x00E0 => Cls,
                0x00EE => Ret,
                _ => Unknown(opcode),
            },
            0x1 => Jump(nnn(opcode)),
            0x2 => Call(nnn(opcode)),
            0x3 => SkipEqByte(x(opcode), kk(opcode)),
            0x4 => SkipNeqByte(x(opcode), kk(opcode)),
            0x5 if n(opcode) == 0x0 => SkipEqReg(x(opcode), y(opcode)),
            0x6 => LoadByte(x(opcode), kk(opcode)),
            0x7 => AddByte(x(opcode), kk(opcode)),
            0x8 => match n(opcode) {
                0x0 => LoadReg(x(opcode), y(opcode)),
                0x1 => Or(x(opcode), y(opcode)),
                0x2 => And(x(opcode), y(opcode)),
                0x3 => Xor(x(opcode), y(opcode)),
                0x4 => AddReg(x(opcode), y(opcode)),
                0x5 => SubReg(x(opcode), y(opcode)),
                0x6 => ShiftRight(x(opcode)),
                0x7 => SubNeg(x(opcode), y(opcode)),
                0xE => ShiftLeft(x(opcode)),
                _ => Unknown(opcode),
            },
            0x9 if n(opcode) == 0x0 => SkipNeqReg(x(opcode), y(opcode)),
            0xA => LoadIndex(nnn(opcode)),
            0xB => JumpOffset(nnn(opcode)),
            0xC => Random(x(opcode), kk(opcode)),
            0xD => Draw(x(opcode), y(opcode), n(opcode)),
            0xE => match kk(opcode) {
                0x9E => SkipKeyPressed(x(opcode)),
                0xA1 => SkipKeyNotPressed(x(opcode)),
                _ => Unknown(opcode),
            },
            0xF => match kk(opcode) {
                0x07 => LoadDelay(x(opcode)),
                0x0A => WaitKey(x(opcode)),
                0x15 => SetDelay(x(opcode)),
                0x18 => SetSound(x(opcode)),
                0x1E => AddIndex(x(opcode)),
                0x29 => LoadGlyph(x(opcode)),
                0x33 => StoreBcd(x(opcode)),
                0x55 => StoreRegs(x(opcode)),
                0x65 => LoadRegs(x(opcode)),
                _ => Unknown(opcode),
            },
            _ => Unknown(opcode),
        }
    }
}
