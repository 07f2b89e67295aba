//! Register layout and encoding.
//!
//! Everything in here is pure bit manipulation: no bus access happens in this module, so the
//! word layouts can be inspected (and tested) without a device attached.
//!
//! Every 16-bit word sent to the AD9833 carries a destination tag in its two top bits:
//!
//! | D15 | D14 | D13 | D12 | Destination |
//! |-----|-----|-----|-----|-------------|
//! |  0  |  0  |  -  |  -  | Control register |
//! |  0  |  1  |  -  |  -  | FREQ0 (14 data bits) |
//! |  1  |  0  |  -  |  -  | FREQ1 (14 data bits) |
//! |  1  |  1  |  0  |  0  | PHASE0 (12 data bits) |
//! |  1  |  1  |  0  |  1  | PHASE1 (12 data bits) |

/// Largest value the 28-bit frequency register can hold.
pub const FREQUENCY_MAX: u32 = (1 << 28) - 1;

/// Largest value the 12-bit phase register can hold.
pub const PHASE_MAX: u16 = (1 << 12) - 1;

const DATA_14_MASK: u32 = 0x3FFF;
const CONTROL_MASK: u16 = 0x3FFF;

const B28: u16 = 1 << 13;
const HLB: u16 = 1 << 12;
const FSELECT: u16 = 1 << 11;
const PSELECT: u16 = 1 << 10;
const RESET: u16 = 1 << 8;
const SLEEP1: u16 = 1 << 7;
const SLEEP12: u16 = 1 << 6;
const OPBITEN: u16 = 1 << 5;
const DIV2: u16 = 1 << 3;
const MODE: u16 = 1 << 1;
const RESERVED: u16 = (1 << 9) | (1 << 4) | (1 << 2) | 1;

/// One of the two FREQ/PHASE register pairs of the chip.
///
/// Writing to one bank while the other one feeds the phase accumulator allows glitch-free
/// switching of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bank {
    /// FREQ0 and PHASE0
    #[default]
    Zero,
    /// FREQ1 and PHASE1
    One,
}

impl Bank {
    /// Tag bits (D15, D14) addressing this bank's frequency register.
    pub const fn frequency_tag(self) -> u16 {
        match self {
            Bank::Zero => 0x4000,
            Bank::One => 0x8000,
        }
    }

    /// Tag bits (D15..D12) addressing this bank's phase register.
    pub const fn phase_tag(self) -> u16 {
        match self {
            Bank::Zero => 0xC000,
            Bank::One => 0xD000,
        }
    }
}

/// Output waveform shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Waveform {
    /// Sinusoid (the power-on default)
    Sine,
    /// Triangle, the sine ROM is bypassed
    Triangle,
    /// Square wave taken from the DAC data MSB, at the programmed frequency
    Clock,
}

/// Power-down state of the DAC and the internal clock.
///
/// The numeric form (`0..=3`) is accepted through [`TryFrom<u8>`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    /// Everything running
    On,
    /// DAC powered down (SLEEP12)
    DacPoweredDown,
    /// Internal MCLK disabled (SLEEP1)
    ClockDisabled,
    /// Both the DAC and the internal clock off
    Sleep,
}

/// Returned when converting an out-of-range number into a [`PowerMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidPowerMode(pub u8);

impl TryFrom<u8> for PowerMode {
    type Error = InvalidPowerMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PowerMode::On),
            1 => Ok(PowerMode::DacPoweredDown),
            2 => Ok(PowerMode::ClockDisabled),
            3 => Ok(PowerMode::Sleep),
            other => Err(InvalidPowerMode(other)),
        }
    }
}

/// Mirror of the AD9833 control register.
///
/// The bits are held as named fields and only packed into the on-wire word by
/// [`bits`](ControlRegister::bits). Reserved bits are carried along untouched, so
/// `ControlRegister::from_bits(x).bits() == x & 0x3FFF` for every `x`.
///
/// | Bit | Field |
/// |-----|-------|
/// | D13 | B28 |
/// | D12 | HLB |
/// | D11 | FSELECT |
/// | D10 | PSELECT |
/// | D8  | RESET |
/// | D7  | SLEEP1 |
/// | D6  | SLEEP12 |
/// | D5  | OPBITEN |
/// | D3  | DIV2 |
/// | D1  | MODE |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlRegister {
    pub b28: bool,
    pub hlb: bool,
    pub fselect: bool,
    pub pselect: bool,
    pub reset: bool,
    pub sleep1: bool,
    pub sleep12: bool,
    pub opbiten: bool,
    pub div2: bool,
    pub mode: bool,
    reserved: u16,
}

impl Default for ControlRegister {
    /// `0x2000`: 28-bit loads, bank 0, sine output, running.
    fn default() -> Self {
        Self::from_bits(B28)
    }
}

impl ControlRegister {
    /// Unpack a raw control word. The two tag bits (D15, D14) are dropped.
    pub const fn from_bits(bits: u16) -> Self {
        let bits = bits & CONTROL_MASK;
        Self {
            b28: bits & B28 != 0,
            hlb: bits & HLB != 0,
            fselect: bits & FSELECT != 0,
            pselect: bits & PSELECT != 0,
            reset: bits & RESET != 0,
            sleep1: bits & SLEEP1 != 0,
            sleep12: bits & SLEEP12 != 0,
            opbiten: bits & OPBITEN != 0,
            div2: bits & DIV2 != 0,
            mode: bits & MODE != 0,
            reserved: bits & RESERVED,
        }
    }

    /// Pack into the 16-bit word sent to the chip. D15 and D14 are always zero.
    pub const fn bits(&self) -> u16 {
        let mut bits = self.reserved;
        if self.b28 {
            bits |= B28;
        }
        if self.hlb {
            bits |= HLB;
        }
        if self.fselect {
            bits |= FSELECT;
        }
        if self.pselect {
            bits |= PSELECT;
        }
        if self.reset {
            bits |= RESET;
        }
        if self.sleep1 {
            bits |= SLEEP1;
        }
        if self.sleep12 {
            bits |= SLEEP12;
        }
        if self.opbiten {
            bits |= OPBITEN;
        }
        if self.div2 {
            bits |= DIV2;
        }
        if self.mode {
            bits |= MODE;
        }
        bits
    }

    pub fn set_power_mode(&mut self, mode: PowerMode) {
        let (sleep1, sleep12) = match mode {
            PowerMode::On => (false, false),
            PowerMode::DacPoweredDown => (false, true),
            PowerMode::ClockDisabled => (true, false),
            PowerMode::Sleep => (true, true),
        };
        self.sleep1 = sleep1;
        self.sleep12 = sleep12;
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        // DIV2 must accompany OPBITEN, otherwise the square output runs at half frequency
        let (opbiten, div2, mode) = match waveform {
            Waveform::Sine => (false, false, false),
            Waveform::Triangle => (false, false, true),
            Waveform::Clock => (true, true, false),
        };
        self.opbiten = opbiten;
        self.div2 = div2;
        self.mode = mode;
    }

    pub fn set_bank(&mut self, bank: Bank) {
        let selected = bank == Bank::One;
        self.fselect = selected;
        self.pselect = selected;
    }
}

/// Compute the 28-bit frequency register value for `frequency` Hz, rounded to nearest.
///
/// The output frequency of the chip is `f_out = mclk / 2^28 * FREQREG`.
///
/// Frequencies above Nyquist (`mclk / 2`) saturate to [`FREQUENCY_MAX`].
///
/// ```
/// # use ad9833::register::frequency_word;
/// assert_eq!(0xAAAAAB, frequency_word(1_000_000, 24_000_000));
/// assert_eq!(0, frequency_word(0, 24_000_000));
/// ```
pub fn frequency_word(frequency: u32, mclk: u32) -> u32 {
    if frequency > mclk / 2 {
        return FREQUENCY_MAX;
    }
    let mclk = u64::from(mclk);
    let word = ((u64::from(frequency) << 28) + mclk / 2) / mclk;
    word.min(u64::from(FREQUENCY_MAX)) as u32
}

/// Split a 28-bit frequency register value into the `[LSW, MSW]` pair addressed to `bank`.
///
/// The chip latches the new value only after both halves arrived, LSW first.
pub fn frequency_words(word: u32, bank: Bank) -> [u16; 2] {
    let tag = bank.frequency_tag();
    let lsw = (word & DATA_14_MASK) as u16 | tag;
    let msw = ((word >> 14) & DATA_14_MASK) as u16 | tag;
    [lsw, msw]
}

/// Build the phase word for `phase` (in units of 2π/4096) addressed to `bank`.
///
/// Bits beyond the 12-bit phase field are masked off.
pub fn phase_word(phase: u16, bank: Bank) -> u16 {
    (phase & PHASE_MAX) | bank.phase_tag()
}
