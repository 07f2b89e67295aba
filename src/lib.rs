#![no_std]
//! # `ad9833` - Embedded driver for the AD9833 DDS waveform generator
//!
//! The AD9833 is a low power programmable waveform generator sold by Analog Devices. Check the [datasheet](https://www.analog.com/media/en/technical-documentation/data-sheets/AD9833.pdf) for general information about it.
//!
//! This crate implements an interface for embedded devices to control an AD9833 chip over SPI.
//!
//! The driver needs an SPI bus implementing [`embedded_hal::blocking::spi::Write<u8>`], configured in [`MODE`] (SPI mode 2),
//! and one digital output pin implementing [`embedded_hal::digital::v2::OutputPin`] connected to FSYNC.
//!
//! ## Usage example
//!
//! ```
//! # use embedded_hal_mock::spi::{Mock as Spi, Transaction as SpiTransaction};
//! # use embedded_hal_mock::pin::{Mock as Pin, State, Transaction as PinTransaction};
//! # let spi = Spi::new(&[
//! #     SpiTransaction::write(vec![0x6A, 0xAB]),
//! #     SpiTransaction::write(vec![0x42, 0xAA]),
//! #     SpiTransaction::write(vec![0x20, 0x28]),
//! # ]);
//! # let fsync = Pin::new(&[
//! #     PinTransaction::set(State::Low), PinTransaction::set(State::High),
//! #     PinTransaction::set(State::Low), PinTransaction::set(State::High),
//! #     PinTransaction::set(State::Low), PinTransaction::set(State::High),
//! # ]);
//! use ad9833::{Ad9833, Waveform};
//!
//! // 24 MHz crystal on the MCLK input
//! let mut ad9833 = Ad9833::new(spi, fsync, 24_000_000);
//!
//! // Set output frequency to 1 MHz
//! ad9833.set_frequency(1_000_000).unwrap();
//! // Square wave instead of sine
//! ad9833.set_waveform(Waveform::Clock).unwrap();
//! assert_eq!(ad9833.frequency(), 1_000_000);
//! ```
//!
//! ## Supported features
//!
//! - [x] Frequency (28-bit) and phase (12-bit) registers, both banks
//! - [x] Sine, triangle and square output
//! - [x] Reset, DAC power-down, internal clock disable
//! - [x] Optional diagnostic display of every transmitted word
//! - [ ] Separate MSB/LSB frequency loads (`B28` cleared)
//!
//! ## Out-of-range values
//!
//! Values which do not fit the chip's registers are clamped, never rejected:
//! frequencies above `mclk / 2` become `mclk / 2`, phases
//! outside `0..=4095` end up at the nearest bound. Read the stored value back
//! with [`frequency`](Ad9833::frequency) / [`phase`](Ad9833::phase) to see what was applied.

use core::fmt;
use embedded_hal::blocking::spi::Write;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::spi::{Mode, MODE_2};

pub mod register;

pub use register::{Bank, ControlRegister, InvalidPowerMode, PowerMode, Waveform};

/// SPI mode the AD9833 expects: clock idles high, data sampled on the falling edge.
pub const MODE: Mode = MODE_2;

/// Frequency of the crystal found on most AD9833 breakout boards.
pub const DEFAULT_MCLK: u32 = 25_000_000;

/// Errors raised by the bus or the FSYNC pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<SpiE, PinE> {
    /// SPI write failed
    Spi(SpiE),
    /// Setting FSYNC failed
    Pin(PinE),
}

/// Sink for diagnostic output.
///
/// When one is attached to the driver (see [`Ad9833::new_with_debug`]), every word sent to
/// the chip is passed to [`show`](DebugDisplay::show) formatted as lowercase hex. Where it ends
/// up (a fixed row on a character LCD, a serial console, ...) is up to the implementation.
pub trait DebugDisplay {
    fn show(&mut self, text: fmt::Arguments<'_>);
}

/// The default: no diagnostic output at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDebug;

impl DebugDisplay for NoDebug {
    #[inline(always)]
    fn show(&mut self, _text: fmt::Arguments<'_>) {}
}

impl<T: DebugDisplay + ?Sized> DebugDisplay for &mut T {
    fn show(&mut self, text: fmt::Arguments<'_>) {
        (**self).show(text)
    }
}

/// Represents a connection to an AD9833 device.
///
/// See [crate level documentation](crate), or check the [`new`](Ad9833::new) method for an entry point.
pub struct Ad9833<Spi, Fsync, Dbg = NoDebug> {
    spi: Spi,
    fsync: Fsync,
    debug: Dbg,
    mclk: u32,
    frequency: u32,
    phase: u16,
    bank: Bank,
    control: ControlRegister,
}

impl<Spi, Fsync> Ad9833<Spi, Fsync, NoDebug> {
    /// Construct a new Ad9833 instance.
    ///
    /// This call does not communicate with the device yet. The driver assumes the chip is in
    /// its default state: control register `0x2000`, bank 0, sine output.
    ///
    /// `mclk` is the frequency (in Hz) of the oscillator connected to the MCLK pin. It is used
    /// by [`set_frequency`](Ad9833::set_frequency) to compute the register value.
    ///
    /// | Signal | AD9833 Pin |
    /// |--------|------------|
    /// | fsync  |      5     |
    /// | SCLK   |      6     |
    /// | MOSI   |      7     |
    ///
    /// # Panics
    ///
    /// If `mclk` is zero.
    pub fn new(spi: Spi, fsync: Fsync, mclk: u32) -> Self {
        Self::new_with_debug(spi, fsync, mclk, NoDebug)
    }
}

impl<Spi, Fsync, Dbg> Ad9833<Spi, Fsync, Dbg> {
    /// Same as [`new`](Ad9833::new), but every transmitted word is also rendered to `debug`.
    ///
    /// # Panics
    ///
    /// If `mclk` is zero.
    pub fn new_with_debug(spi: Spi, fsync: Fsync, mclk: u32, debug: Dbg) -> Self {
        assert!(mclk > 0, "master clock frequency must be non-zero");
        Self {
            spi,
            fsync,
            debug,
            mclk,
            frequency: 0,
            phase: 0,
            bank: Bank::Zero,
            control: ControlRegister::default(),
        }
    }

    /// Destroy the driver, giving back the SPI bus and the FSYNC pin.
    pub fn release(self) -> (Spi, Fsync) {
        (self.spi, self.fsync)
    }

    /// Master clock frequency (Hz) given at construction.
    pub fn mclk(&self) -> u32 {
        self.mclk
    }

    /// Last frequency (Hz) successfully written, after clamping.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Last phase (in units of 2π/4096) successfully written, after clamping.
    pub fn phase(&self) -> u16 {
        self.phase
    }

    /// Current value of the control register mirror.
    pub fn control_register(&self) -> u16 {
        self.control.bits()
    }

    /// Bank targeted by frequency and phase writes.
    pub fn bank(&self) -> Bank {
        self.bank
    }
}

impl<Spi, Fsync, Dbg, SpiE, PinE> Ad9833<Spi, Fsync, Dbg>
where
    Spi: Write<u8, Error = SpiE>,
    Fsync: OutputPin<Error = PinE>,
    Dbg: DebugDisplay,
{
    /// Set output frequency to the given value (in Hz).
    ///
    /// Anything above `mclk / 2` is clamped to it, and the register is loaded with its
    /// maximum value. Otherwise the register value is `f * 2^28 / mclk`, rounded
    /// to nearest.
    ///
    /// Two words are sent to the frequency register of the current [`bank`](Ad9833::bank):
    /// first the 14 low bits, then the 14 high bits.
    pub fn set_frequency(&mut self, frequency: u32) -> Result<(), Error<SpiE, PinE>> {
        let word = register::frequency_word(frequency, self.mclk);
        let [lsw, msw] = register::frequency_words(word, self.bank);
        self.transmit_word(lsw)?;
        self.transmit_word(msw)?;
        self.frequency = frequency.min(self.mclk / 2);
        Ok(())
    }

    /// Set the phase offset, in units of 2π/4096.
    ///
    /// Negative values are clamped to `0`, values above `4095` to `4095`.
    pub fn set_phase(&mut self, phase: i32) -> Result<(), Error<SpiE, PinE>> {
        let phase = phase.clamp(0, i32::from(register::PHASE_MAX)) as u16;
        self.transmit_word(register::phase_word(phase, self.bank))?;
        self.phase = phase;
        Ok(())
    }

    /// Replace the control register. The two top bits are forced to zero.
    pub fn set_control_register(&mut self, value: u16) -> Result<(), Error<SpiE, PinE>> {
        self.control = ControlRegister::from_bits(value);
        self.write_control_register()
    }

    /// Send the control register mirror to the chip as is.
    pub fn write_control_register(&mut self) -> Result<(), Error<SpiE, PinE>> {
        self.transmit_word(self.control.bits())
    }

    /// Power down the DAC and/or the internal clock. Other control bits are left unchanged.
    pub fn set_power_mode(&mut self, mode: PowerMode) -> Result<(), Error<SpiE, PinE>> {
        self.control.set_power_mode(mode);
        self.write_control_register()
    }

    /// Hold (`true`) or release (`false`) the internal reset.
    ///
    /// While reset is asserted the output sits at midscale. The frequency and phase registers
    /// are not affected, so this is the way to load new values and start them in sync.
    pub fn set_reset(&mut self, enabled: bool) -> Result<(), Error<SpiE, PinE>> {
        self.control.reset = enabled;
        self.write_control_register()
    }

    /// Select the output waveform.
    pub fn set_waveform(&mut self, waveform: Waveform) -> Result<(), Error<SpiE, PinE>> {
        self.control.set_waveform(waveform);
        self.write_control_register()
    }

    /// Switch the output to `bank`, and direct subsequent frequency and phase writes at it.
    pub fn select_bank(&mut self, bank: Bank) -> Result<(), Error<SpiE, PinE>> {
        self.control.set_bank(bank);
        self.bank = bank;
        self.write_control_register()
    }

    /// Send a raw 16-bit word.
    ///
    /// This is a low-level interface. See the `set_*` methods for a high-level wrapper.
    ///
    /// FSYNC is pulled low, the word is shifted out MSB first, then FSYNC is released. The
    /// chip does not acknowledge anything.
    pub fn transmit_word(&mut self, word: u16) -> Result<(), Error<SpiE, PinE>> {
        #[cfg(feature = "defmt")]
        defmt::trace!("ad9833: {=u16:#x}", word);

        self.fsync.set_low().map_err(Error::Pin)?;
        let result = self.spi.write(&word.to_be_bytes()).map_err(Error::Spi);
        // FSYNC goes back high even when the write failed
        self.fsync.set_high().map_err(Error::Pin)?;
        result?;
        self.debug.show(format_args!("{:x}", word));
        Ok(())
    }
}
