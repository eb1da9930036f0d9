use crate::hw::RawSensor;
use crate::{Channel, TouchConfig, TouchVector, DEFAULT_TOUCH_CONFIG, NUM_CHANNELS};

/// Sensing state for one touch pad
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TouchChannel {
    /// Running estimate of the untouched count. Frozen while tripped.
    pub baseline: u16,
    /// Most recent reading
    pub raw_count: u16,
    pub tripped: bool,
}

impl TouchChannel {
    /// Count below which the channel is considered touched
    pub fn trip_point(&self, config: &TouchConfig) -> u16 {
        self.baseline - self.baseline / config.trip_divisor.max(1)
    }

    /// Process one new reading, returning whether the channel is tripped
    pub fn push(&mut self, raw_count: u16, config: &TouchConfig) -> bool {
        self.raw_count = raw_count;
        self.tripped = raw_count < self.trip_point(config);

        if !self.tripped {
            if raw_count > self.baseline {
                self.baseline = raw_count;
            } else {
                let filter = config.filter_divisor.max(1);
                self.baseline = self.baseline - self.baseline / filter + raw_count / filter;
            }
        }

        self.tripped
    }
}

/// Adaptive thresholding over all four touch pads
pub struct TouchSensor<'a> {
    pub channels: [TouchChannel; NUM_CHANNELS],
    pub config: &'a TouchConfig,
}

impl<'a> TouchSensor<'a> {
    pub fn new(config: Option<&'a TouchConfig>) -> Self {
        Self {
            channels: [TouchChannel::default(); NUM_CHANNELS],
            config: config.unwrap_or(&DEFAULT_TOUCH_CONFIG),
        }
    }

    /// Establish the initial baselines by averaging `calibration_samples`
    /// readings of each channel in turn.
    ///
    /// Must run once, with the pads untouched, before `update` results mean anything.
    /// Failed readings are left out of the average.
    pub fn calibrate<S: RawSensor>(&mut self, sensor: &mut S) {
        let samples = self.config.calibration_samples.max(1);
        for ch in Channel::ALL {
            let mut sum: u32 = 0;
            let mut good: u32 = 0;
            for _ in 0..samples {
                if let Some(raw) = sensor.read(ch) {
                    sum += raw as u32;
                    good += 1;
                }
            }
            let channel = &mut self.channels[ch.index()];
            channel.baseline = if good == 0 { 0 } else { (sum / good) as u16 };
            channel.tripped = false;
        }
    }

    /// Run one full sensing pass over every channel and return the touch vector.
    ///
    /// A channel whose reading failed keeps its previous state and baseline.
    pub fn update<S: RawSensor>(&mut self, sensor: &mut S) -> TouchVector {
        let mut touched = [false; NUM_CHANNELS];
        for ch in Channel::ALL {
            let channel = &mut self.channels[ch.index()];
            touched[ch.index()] = match sensor.read(ch) {
                Some(raw) => channel.push(raw, self.config),
                None => channel.tripped,
            };
        }
        TouchVector::new(touched)
    }

    pub fn baselines(&self) -> [u16; NUM_CHANNELS] {
        self.channels.map(|c| c.baseline)
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::hw::mock::MockSensor;

    const REF: u16 = 160;

    fn calibrated(level: u16) -> (TouchSensor<'static>, MockSensor) {
        let mut sensor = MockSensor::new(level);
        let mut touch = TouchSensor::new(None);
        touch.calibrate(&mut sensor);
        (touch, sensor)
    }

    #[test]
    fn test_calibration_mean() {
        let mut sensor = MockSensor::new(0);
        // 16 readings for T1 averaging 100.5, truncated
        let mut readings = [100u16; 16];
        for r in readings.iter_mut().step_by(2) {
            *r = 101;
        }
        sensor.queue(Channel::T1, &readings);
        sensor.queue(Channel::T2, &[200; 16]);
        sensor.queue(Channel::T3, &[40; 16]);
        sensor.queue(Channel::T4, &[255, 0, 255, 0, 255, 0, 255, 0, 255, 0, 255, 0, 255, 0, 255, 0]);

        let mut touch = TouchSensor::new(None);
        touch.calibrate(&mut sensor);

        assert_eq!(touch.baselines(), [100, 200, 40, 127]);
        assert_eq!(sensor.reads.len(), 64);
        // Channels are calibrated one at a time, in order
        assert!(sensor.reads[..16].iter().all(|c| *c == Channel::T1));
        assert!(sensor.reads[48..].iter().all(|c| *c == Channel::T4));
    }

    #[test]
    fn test_trip_threshold_boundary() {
        let (mut touch, mut sensor) = calibrated(REF);
        let trip = REF - REF / 8;

        // Exactly at the trip point is not a touch
        sensor.level[0] = trip;
        let v = touch.update(&mut sensor);
        assert!(!v.is_touched(Channel::T1));
        assert!(!touch.channels[0].tripped);

        let (mut touch, mut sensor) = calibrated(REF);
        sensor.level[0] = trip - 1;
        let v = touch.update(&mut sensor);
        assert!(v.is_touched(Channel::T1));
        assert!(touch.channels[0].tripped);
        assert_eq!(v.active(), 1);
    }

    #[test]
    fn test_baseline_frozen_while_tripped() {
        let (mut touch, mut sensor) = calibrated(REF);
        sensor.level[2] = 50;
        for _ in 0..100 {
            let v = touch.update(&mut sensor);
            assert!(v.is_touched(Channel::T3));
        }
        assert_eq!(touch.channels[2].baseline, REF);
        assert_eq!(touch.channels[2].raw_count, 50);
    }

    #[test]
    fn test_baseline_snaps_up() {
        let (mut touch, mut sensor) = calibrated(REF);
        sensor.level[1] = REF + 37;
        let v = touch.update(&mut sensor);
        assert!(!v.is_touched(Channel::T2));
        assert_eq!(touch.channels[1].baseline, REF + 37);
    }

    #[test]
    fn test_baseline_decays_toward_reading() {
        let (mut touch, mut sensor) = calibrated(REF);
        // Untouched but slightly low: 150 >= 160 - 20
        sensor.level[3] = 150;
        touch.update(&mut sensor);
        assert_eq!(touch.channels[3].baseline, REF - REF / 16 + 150 / 16);

        for _ in 0..200 {
            touch.update(&mut sensor);
        }
        let b = touch.channels[3].baseline;
        assert!(b >= 150 && b < REF, "baseline {} did not settle toward reading", b);
    }

    #[test]
    fn test_failed_read_leaves_channel_alone() {
        let (mut touch, mut sensor) = calibrated(1000);
        sensor.fail(Channel::T1, 1);
        let v = touch.update(&mut sensor);
        assert!(!v.is_touched(Channel::T1));
        assert_eq!(touch.channels[0].baseline, 1000);

        for _ in 0..1000 {
            let v = touch.update(&mut sensor);
            assert_eq!(v.active(), 0);
        }
        assert_eq!(touch.channels[0].baseline, 1000);

        // A failure during a held touch does not release it
        sensor.level[1] = 500;
        assert!(touch.update(&mut sensor).is_touched(Channel::T2));
        sensor.fail(Channel::T2, 1);
        assert!(touch.update(&mut sensor).is_touched(Channel::T2));
        sensor.level[1] = 1000;
        assert!(!touch.update(&mut sensor).is_touched(Channel::T2));
    }

    #[test]
    fn test_failed_calibration_samples_skipped() {
        let mut sensor = MockSensor::new(300);
        sensor.fail(Channel::T3, 4);
        let mut touch = TouchSensor::new(None);
        touch.calibrate(&mut sensor);
        assert_eq!(touch.baselines(), [300; NUM_CHANNELS]);
    }

    #[test]
    fn test_zero_divisors_do_not_panic() {
        let config = TouchConfig {
            calibration_samples: 0,
            trip_divisor: 0,
            filter_divisor: 0,
        };
        let mut sensor = MockSensor::new(REF);
        let mut touch = TouchSensor::new(Some(&config));
        touch.calibrate(&mut sensor);
        sensor.level[0] = REF - 10;
        touch.update(&mut sensor);
        assert_eq!(touch.channels[0].baseline, REF - 10);
    }

    #[test]
    fn test_every_channel_read_each_pass() {
        let (mut touch, mut sensor) = calibrated(REF);
        sensor.reads.clear();
        sensor.set_touch([true, false, true, false], REF, 10);
        let v = touch.update(&mut sensor);
        assert_eq!(sensor.reads, Channel::ALL.to_vec());
        assert_eq!(v, TouchVector::new([true, false, true, false]));
        assert_eq!(v.active(), 2);
    }
}
