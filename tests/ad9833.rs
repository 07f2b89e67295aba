use ad9833::{Ad9833, Bank, DebugDisplay, Error, PowerMode, Waveform};
use core::fmt;
use embedded_hal::blocking::spi::Write;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal_mock::pin::{Mock as PinMock, State, Transaction as PinTransaction};
use embedded_hal_mock::spi::{Mock as SpiMock, Transaction as SpiTransaction};

const MCLK: u32 = 24_000_000;

/// Expectations for `words` sent in order, each framed by FSYNC low/high.
fn expect_words(words: &[u16]) -> (SpiMock, PinMock) {
    let spi: Vec<_> = words
        .iter()
        .map(|w| SpiTransaction::write(w.to_be_bytes().to_vec()))
        .collect();
    let pin: Vec<_> = words
        .iter()
        .flat_map(|_| [PinTransaction::set(State::Low), PinTransaction::set(State::High)])
        .collect();
    (SpiMock::new(&spi), PinMock::new(&pin))
}

fn check(words: &[u16], f: impl FnOnce(&mut Ad9833<SpiMock, PinMock>)) {
    let (spi, pin) = expect_words(words);
    let mut dev = Ad9833::new(spi, pin, MCLK);
    f(&mut dev);
    let (mut spi, mut pin) = dev.release();
    spi.done();
    pin.done();
}

#[test]
fn one_megahertz_at_24_megahertz_mclk() {
    // round(1e6 * 2^28 / 24e6) = 0xAAAAAB
    check(&[0x6AAB, 0x42AA], |dev| {
        dev.set_frequency(1_000_000).unwrap();
        assert_eq!(dev.frequency(), 1_000_000);
    });
}

#[test]
fn frequency_round_trip() {
    check(&[0x4000, 0x4000], |dev| {
        dev.set_frequency(0).unwrap();
        assert_eq!(dev.frequency(), 0);
    });
    // mclk / 4 -> 2^26
    check(&[0x4000, 0x5000], |dev| {
        dev.set_frequency(MCLK / 4).unwrap();
        assert_eq!(dev.frequency(), MCLK / 4);
    });
    // mclk / 2 is representable -> 2^27
    check(&[0x4000, 0x6000], |dev| {
        dev.set_frequency(MCLK / 2).unwrap();
        assert_eq!(dev.frequency(), MCLK / 2);
    });
}

#[test]
fn frequency_above_nyquist_saturates() {
    check(&[0x7FFF, 0x7FFF], |dev| {
        dev.set_frequency(MCLK).unwrap();
        assert_eq!(dev.frequency(), MCLK / 2);
    });
    check(&[0x7FFF, 0x7FFF], |dev| {
        dev.set_frequency(MCLK * 2).unwrap();
        assert_eq!(dev.frequency(), MCLK / 2);
    });
}

#[test]
fn phase_is_clamped() {
    check(&[0xC000, 0xC000, 0xC800, 0xCFFF, 0xCFFF], |dev| {
        dev.set_phase(-1).unwrap();
        assert_eq!(dev.phase(), 0);
        dev.set_phase(0).unwrap();
        assert_eq!(dev.phase(), 0);
        dev.set_phase(2048).unwrap();
        assert_eq!(dev.phase(), 2048);
        dev.set_phase(4095).unwrap();
        assert_eq!(dev.phase(), 4095);
        dev.set_phase(4096).unwrap();
        assert_eq!(dev.phase(), 4095);
    });
}

#[test]
fn control_register_drops_tag_bits() {
    check(&[0x3FFF, 0x0123], |dev| {
        dev.set_control_register(0xFFFF).unwrap();
        assert_eq!(dev.control_register(), 0x3FFF);
        dev.set_control_register(0xC123).unwrap();
        assert_eq!(dev.control_register(), 0x0123);
    });
}

#[test]
fn write_control_register_resends_mirror() {
    check(&[0x2000], |dev| {
        dev.write_control_register().unwrap();
    });
}

#[test]
fn power_modes() {
    check(&[0x2040, 0x2080, 0x20C0, 0x2000], |dev| {
        dev.set_power_mode(PowerMode::DacPoweredDown).unwrap();
        dev.set_power_mode(PowerMode::ClockDisabled).unwrap();
        dev.set_power_mode(PowerMode::Sleep).unwrap();
        dev.set_power_mode(PowerMode::try_from(0).unwrap()).unwrap();
    });
}

#[test]
fn reset_bit() {
    check(&[0x2100, 0x2000], |dev| {
        dev.set_reset(true).unwrap();
        assert_eq!(dev.control_register(), 0x2100);
        dev.set_reset(false).unwrap();
        assert_eq!(dev.control_register(), 0x2000);
    });
}

#[test]
fn waveform_sequence_returns_to_sine() {
    check(&[0x2000, 0x2028, 0x2002, 0x2000], |dev| {
        dev.set_waveform(Waveform::Sine).unwrap();
        dev.set_waveform(Waveform::Clock).unwrap();
        dev.set_waveform(Waveform::Triangle).unwrap();
        dev.set_waveform(Waveform::Sine).unwrap();
    });
}

#[test]
fn bank_one_retags_frequency_and_phase() {
    check(&[0x2C00, 0xAAAB, 0x82AA, 0xD400, 0x2000, 0xC400], |dev| {
        dev.select_bank(Bank::One).unwrap();
        assert_eq!(dev.bank(), Bank::One);
        dev.set_frequency(1_000_000).unwrap();
        dev.set_phase(1024).unwrap();
        dev.select_bank(Bank::Zero).unwrap();
        dev.set_phase(1024).unwrap();
    });
}

#[derive(Default)]
struct Recorder(Vec<String>);

impl DebugDisplay for Recorder {
    fn show(&mut self, text: fmt::Arguments<'_>) {
        self.0.push(text.to_string());
    }
}

#[test]
fn debug_display_sees_every_word() {
    let (spi, pin) = expect_words(&[0x6AAB, 0x42AA, 0x0100]);
    let mut recorder = Recorder::default();
    let mut dev = Ad9833::new_with_debug(spi, pin, MCLK, &mut recorder);
    dev.set_frequency(1_000_000).unwrap();
    dev.set_control_register(0x0100).unwrap();
    let (mut spi, mut pin) = dev.release();
    spi.done();
    pin.done();
    assert_eq!(recorder.0, ["6aab", "42aa", "100"]);
}

struct BrokenPin;

impl OutputPin for BrokenPin {
    type Error = ();

    fn set_low(&mut self) -> Result<(), ()> {
        Err(())
    }

    fn set_high(&mut self) -> Result<(), ()> {
        Err(())
    }
}

#[test]
fn pin_failure_leaves_stored_values_alone() {
    let mut spi = SpiMock::new(&Vec::<SpiTransaction>::new());
    let mut dev = Ad9833::new(spi.clone(), BrokenPin, MCLK);
    assert!(matches!(dev.set_frequency(1_000_000), Err(Error::Pin(()))));
    assert!(matches!(dev.set_phase(100), Err(Error::Pin(()))));
    assert_eq!(dev.frequency(), 0);
    assert_eq!(dev.phase(), 0);
    spi.done();
}

struct BrokenSpi;

impl Write<u8> for BrokenSpi {
    type Error = ();

    fn write(&mut self, _words: &[u8]) -> Result<(), ()> {
        Err(())
    }
}

#[test]
fn spi_failure_still_releases_fsync() {
    let mut pin = PinMock::new(&[
        PinTransaction::set(State::Low),
        PinTransaction::set(State::High),
        PinTransaction::set(State::Low),
        PinTransaction::set(State::High),
    ]);
    let mut dev = Ad9833::new(BrokenSpi, pin.clone(), MCLK);
    assert!(matches!(dev.set_phase(1), Err(Error::Spi(()))));
    assert!(matches!(dev.set_frequency(1_000_000), Err(Error::Spi(()))));
    assert_eq!(dev.frequency(), 0);
    assert_eq!(dev.phase(), 0);
    pin.done();
}

#[test]
#[should_panic]
fn zero_mclk_panics() {
    let _ = Ad9833::new((), (), 0);
}
