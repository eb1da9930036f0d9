/// Debug log on USART1, transmit only.
///
/// Lines are queued and drained by the TXE interrupt, so a log call costs a
/// few queue pushes and never waits on the wire. Bytes that do not fit are
/// counted and dropped.
pub mod log {
    use core::sync::atomic::{AtomicU32, Ordering};

    use crate::interrupt;
    use crate::hal::{
        pac,
        prelude::*,
        serial::{Event, Serial},
    };
    use heapless::spsc::{Consumer, Producer, Queue};
    use stm32f0xx_hal::gpio::{gpiob, Alternate, AF0};

    const LOG_Q_SIZE: usize = 128;

    pub type TxPin = gpiob::PB6<Alternate<AF0>>;
    pub type RxPin = gpiob::PB7<Alternate<AF0>>;
    type Port = Serial<pac::USART1, TxPin, RxPin>;

    static mut LOG_Q_CONSUMER: Option<Consumer<u8, LOG_Q_SIZE>> = None;
    static mut LOG_Q_PRODUCER: Option<Producer<u8, LOG_Q_SIZE>> = None;
    static mut PORT: Option<Port> = None;

    static DROPPED: AtomicU32 = AtomicU32::new(0);

    /// Formatter over the log queue. `\n` goes out as `\r\n`.
    pub struct Log {}

    impl core::fmt::Write for Log {
        fn write_str(&mut self, s: &str) -> Result<(), core::fmt::Error> {
            let producer = unsafe { LOG_Q_PRODUCER.as_mut().unwrap_unchecked() };
            for b in s.bytes() {
                if b == b'\n' {
                    push(producer, b'\r');
                }
                push(producer, b);
            }
            let port = unsafe { PORT.as_mut().unwrap_unchecked() };
            port.listen(Event::Txe);
            Ok(())
        }
    }

    fn push(producer: &mut Producer<'static, u8, LOG_Q_SIZE>, b: u8) {
        // Only written from thread mode, and thumbv6m has no atomic read-modify-write
        if producer.enqueue(b).is_err() {
            let dropped = DROPPED.load(Ordering::Relaxed);
            DROPPED.store(dropped + 1, Ordering::Relaxed);
        }
    }

    /// Must be called once during application initialization, before any `writer()`
    pub fn init(port: Port, irq_prio: u8) {
        let core = unsafe { pac::CorePeripherals::steal() };
        let mut nvic = core.NVIC;

        static mut LOG_Q: Queue<u8, LOG_Q_SIZE> = Queue::new();
        let (producer, consumer) = unsafe { LOG_Q.split() };

        unsafe {
            LOG_Q_PRODUCER = Some(producer);
            LOG_Q_CONSUMER = Some(consumer);
            PORT = Some(port);

            nvic.set_priority(pac::Interrupt::USART1, irq_prio);
            pac::NVIC::unmask(pac::Interrupt::USART1);
        }
    }

    pub fn writer() -> Log {
        Log {}
    }

    /// Bytes lost to a full queue since boot
    pub fn dropped() -> u32 {
        DROPPED.load(Ordering::Relaxed)
    }

    #[interrupt]
    fn USART1() {
        let port = unsafe { PORT.as_mut().unwrap_unchecked() };
        let consumer = unsafe { LOG_Q_CONSUMER.as_mut().unwrap_unchecked() };

        match consumer.dequeue() {
            Some(b) => {
                port.write(b).ok();
            }
            None => {
                // Drained: TXE stays masked until the next write
                port.unlisten(Event::Txe);
            }
        }
    }
}
