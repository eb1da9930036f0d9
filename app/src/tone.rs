use crate::hal;
use crate::hal::pac;

use piano::hw::{Tone, ToneDriver};

/// Tick rate of the tone timer. Note periods and on-times are in these units.
pub const TONE_TICK_HZ: u32 = 62_500;

/// Square wave on TIM3 CH1 driving the piezo beeper
pub struct Beeper {
    tim3: pac::TIM3,
}

impl Beeper {
    pub fn new(tim3: pac::TIM3, clocks: hal::rcc::Clocks) -> Self {
        let rcc = unsafe { pac::Peripherals::steal().RCC };

        // Enable and reset the timer
        rcc.apb1enr.modify(|_, w| w.tim3en().set_bit());
        rcc.apb1rstr.modify(|_, w| w.tim3rst().set_bit());
        rcc.apb1rstr.modify(|_, w| w.tim3rst().clear_bit());

        // If pclk is prescaled from hclk, the frequency fed into the timers is doubled
        let tclk = if clocks.hclk().0 == clocks.pclk().0 {
            clocks.pclk().0
        } else {
            clocks.pclk().0 * 2
        };
        let psc = (tclk / TONE_TICK_HZ - 1) as u16;
        tim3.psc.write(|w| w.psc().bits(psc));

        tim3.ccmr1_output().modify(|_, w| {
            w.oc1m().pwm_mode1()
            .oc1pe().enabled()
        });
        tim3.cr1.modify(|_, w| w.arpe().set_bit());

        let mut obj = Self { tim3 };
        obj.stop();
        obj
    }
}

impl ToneDriver for Beeper {
    fn set_tone(&mut self, tone: Tone) {
        self.tim3.arr.write(|w| w.arr().bits(tone.period));
        self.tim3.ccr1.write(|w| w.ccr().bits(tone.duty));
        // Latch the preloaded period and duty now rather than at the next overflow
        self.tim3.egr.write(|w| w.ug().set_bit());
    }

    fn start(&mut self) {
        self.tim3.ccer.modify(|_, w| w.cc1e().set_bit());
        self.tim3.cr1.modify(|_, w| w.cen().set_bit());
    }

    fn stop(&mut self) {
        self.tim3.cr1.modify(|_, w| w.cen().clear_bit());
        self.tim3.ccer.modify(|_, w| w.cc1e().clear_bit());
        self.tim3.cnt.reset();
    }
}
