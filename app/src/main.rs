#![no_main]
#![no_std]

use core::fmt::Write;
use cortex_m_rt::entry;
use embedded_hal::digital::v2::InputPin;
use panic_halt as _;

use stm32f0xx_hal as hal;

use piano::hw::{Board, Button, RawSensor};
use piano::instrument::Instrument;
use piano::mode::Mode;
use piano::{Channel, TouchConfig, NUM_CHANNELS};

use crate::hal::delay::Delay;
use crate::hal::gpio::{gpioa::PA8, Input, PullUp};
use crate::hal::pac;
use crate::hal::pac::interrupt;
use crate::hal::prelude::*;
use crate::hal::rcc::Rcc;
use crate::hal::tsc::Tsc;

mod serial;
mod tone;
mod wake;

#[derive(Clone, Copy, Debug)]
struct TscSample {
    group: u8,
    sample: u8,
    channel: u8,
}

/// Touch pad wiring, indexed by `Channel`
static TOUCH_PADS: [TscSample; NUM_CHANNELS] = [
    TscSample { group: 1, sample: 2, channel: 1}, // T1, PA0
    TscSample { group: 2, sample: 3, channel: 1}, // T2, PA4
    TscSample { group: 3, sample: 4, channel: 2}, // T3, PB0
    TscSample { group: 6, sample: 2, channel: 1}, // T4, PB11
];

static TOUCH_CONFIG: TouchConfig = TouchConfig {
    calibration_samples: 16,
    trip_divisor: 8,
    filter_divisor: 16,
};

/// Raw counts from the touch sensing controller, one pad per acquisition
struct TscSensor {
    tsc: Tsc,
}

impl TscSensor {
    pub fn new(tsc: pac::TSC, rcc: &mut Rcc) -> Self {
        let config = hal::tsc::Config {
            clock_prescale: None,
            max_count: Some(hal::tsc::MaxCount::U8191),
            charge_transfer_high: None,
            charge_transfer_low: None,
        };
        Self {
            tsc: Tsc::tsc(tsc, rcc, Some(config)),
        }
    }
}

impl RawSensor for TscSensor {
    fn read(&mut self, channel: Channel) -> Option<u16> {
        // IMHO all HAL peripheral drivers should include a pub register block for just this kind of
        // extension, but they don't so steal our own.
        let regs = unsafe { pac::Peripherals::steal().TSC };
        let s = &TOUCH_PADS[channel.index()];

        let iogcsr: u32 = 1 << (s.group - 1);
        let ioscr: u32 = 1 << ((s.group - 1) * 4 + s.sample - 1);
        let ioccr: u32 = 1 << ((s.group - 1) * 4 + s.channel - 1);

        regs.iogcsr.write(|w| unsafe { w.bits(iogcsr) });
        regs.ioscr.write(|w| unsafe { w.bits(ioscr) });
        regs.ioccr.write(|w| unsafe { w.bits(ioccr) });

        self.tsc.acquire().ok()?;

        // Status bits indicate if the group completed successfully. A group not completed
        // when MAX COUNT is reached will not be set, and its count is meaningless.
        let group_status = regs.iogcsr.read().bits() >> 16;
        if group_status & (1 << (s.group - 1)) != 0 {
            Some(self.tsc.read_unchecked(s.group))
        } else {
            None
        }
    }

    fn enable(&mut self) {
        let regs = unsafe { pac::Peripherals::steal().TSC };
        regs.cr.modify(|_, w| w.tsce().set_bit());
    }

    fn disable(&mut self) {
        let regs = unsafe { pac::Peripherals::steal().TSC };
        regs.cr.modify(|_, w| w.tsce().clear_bit());
    }
}

/// S1, active low against the internal pull-up
struct ModeButton {
    pin: PA8<Input<PullUp>>,
}

impl Button for ModeButton {
    fn is_pressed(&mut self) -> bool {
        matches!(self.pin.is_low(), Ok(true))
    }
}

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();
    let mut cp = cortex_m::Peripherals::take().unwrap();

    let mut flash = dp.FLASH;
    let mut rcc = dp.RCC.configure().sysclk(48.mhz()).freeze(&mut flash);
    let gpioa = dp.GPIOA.split(&mut rcc);
    let gpiob = dp.GPIOB.split(&mut rcc);

    // A library requiring a critical section to set a gpio AF register is bad and I just won't.
    let fake_cs = unsafe { cortex_m::interrupt::CriticalSection::new() };

    // Touch pads and their sampling caps
    let _t1 = gpioa.pa0.into_alternate_af3(&fake_cs);
    let _t2 = gpioa.pa4.into_alternate_af3(&fake_cs);
    let _t3 = gpiob.pb0.into_alternate_af3(&fake_cs);
    let _t4 = gpiob.pb11.into_alternate_af3(&fake_cs);
    let _g1_cap = gpioa.pa1.into_alternate_af3(&fake_cs);
    let _g2_cap = gpioa.pa6.into_alternate_af3(&fake_cs);
    let _g3_cap = gpiob.pb2.into_alternate_af3(&fake_cs);
    let _g6_cap = gpiob.pb12.into_alternate_af3(&fake_cs);

    // Piezo on TIM3 CH1
    let _beeper = gpiob.pb4.into_alternate_af1(&fake_cs);

    let button = ModeButton {
        pin: gpioa.pa8.into_pull_up_input(&fake_cs),
    };

    let tx_pin = gpiob.pb6.into_alternate_af0(&fake_cs);
    let rx_pin = gpiob.pb7.into_alternate_af0(&fake_cs);
    let uart = hal::serial::Serial::usart1(dp.USART1, (tx_pin, rx_pin), 115200.bps(), &mut rcc);
    serial::log::init(uart, 4);
    let mut log = serial::log::writer();

    let sensor = TscSensor::new(dp.TSC, &mut rcc);
    let beeper = tone::Beeper::new(dp.TIM3, rcc.clocks);
    let power = wake::WakeTimer::new(dp.TIM2, &mut rcc, &mut cp.SCB);
    let delay = Delay::new(cp.SYST, &rcc);

    let board = Board::new(sensor, beeper, button, power, delay);
    let mut instrument = Instrument::new(board, Some(&TOUCH_CONFIG));

    let [b1, b2, b3, b4] = instrument.touch.baselines();
    writeln!(log, "baselines: {} {} {} {}", b1, b2, b3, b4).ok();

    let mut dropped = 0;
    loop {
        if let Some(mode) = instrument.step() {
            writeln!(log, "mode: {:?}", mode).ok();
            if mode == Mode::Metronome {
                let m = &instrument.metronome;
                writeln!(log, "bpm: {} beats: {}", m.bpm, m.beats).ok();
            }
            if serial::log::dropped() != dropped {
                dropped = serial::log::dropped();
                writeln!(log, "log dropped {} bytes", dropped).ok();
            }
        }
    }
}
