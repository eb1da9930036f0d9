use cortex_m::peripheral::SCB;

use crate::pac;
use crate::hal::rcc::Rcc;

use piano::hw::PowerManager;

/// Period of the wake-up tick while napping in off mode
pub const WAKE_PERIOD_MS: u32 = 128;

/// Periodic TIM2 overflow used to wake the core from sleep.
///
/// The update interrupt is enabled at the timer but left masked in the NVIC.
/// With SEVONPEND set, the pending interrupt still raises an event, so WFE
/// wakes on each overflow without a handler ever running.
pub struct WakeTimer {
    tim: pac::TIM2,
}

impl WakeTimer {
    pub fn new(tim: pac::TIM2, rcc: &mut Rcc, scb: &mut SCB) -> Self {
        let rccregs = unsafe { pac::Peripherals::steal().RCC };
        rccregs.apb1enr.modify(|_, w| w.tim2en().set_bit());

        // If pclk is prescaled from hclk, the frequency fed into the timers is doubled
        let clk_freq = if rcc.clocks.hclk().0 == rcc.clocks.pclk().0 {
            rcc.clocks.pclk().0
        } else {
            rcc.clocks.pclk().0 * 2
        };

        // TIM2 is 32 bits wide, so the whole period fits without a prescaler
        let arr = clk_freq / 1000 * WAKE_PERIOD_MS;
        tim.arr.write(|w| w.arr().bits(arr));
        tim.egr.write(|w| w.ug().set_bit());
        tim.sr.write(|w| unsafe { w.bits(0) });
        tim.dier.write(|w| w.uie().set_bit());

        scb.set_sevonpend();

        Self { tim }
    }

    fn clear(&mut self) {
        self.tim.sr.write(|w| unsafe { w.bits(0) });
        pac::NVIC::unpend(pac::Interrupt::TIM2);
    }
}

impl PowerManager for WakeTimer {
    fn enter_low_power(&mut self) {
        self.tim.cnt.reset();
        self.clear();
        self.tim.cr1.modify(|_, w| w.cen().set_bit());

        while self.tim.sr.read().uif().bit_is_clear() {
            cortex_m::asm::wfe();
        }

        self.tim.cr1.modify(|_, w| w.cen().clear_bit());
        self.clear();
    }
}
