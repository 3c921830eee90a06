use rand::Rng;

use super::signal::{Signal, clamp};

// Walk parameters follow the physical ranges of the emulated sensors.
// Indoor environmental baselines for the BME688, quiet-room particulate
// levels for the SPS30, negative filter pressure drops for the DP channels.
const TEMPERATURE_C: Signal = Signal::new(21.0, 0.05, 0.002, 10.0, 35.0);
const HUMIDITY_PCT: Signal = Signal::new(45.0, 0.2, 0.002, 15.0, 90.0);
const PRESSURE_PA: Signal = Signal::new(101_325.0, 30.0, 0.002, 98_000.0, 104_000.0);
const GAS_OHM: Signal = Signal::new(50_000.0, 500.0, 0.002, 1_000.0, 200_000.0);
const IAQ: Signal = Signal::new(35.0, 2.5, 0.01, 5.0, 250.0);
const VOC_INDEX: Signal = Signal::new(15.0, 2.0, 0.01, 0.0, 500.0);
const CO2_EQ_PPM: Signal = Signal::new(600.0, 15.0, 0.01, 400.0, 2_000.0);

const PM1_0: Signal = Signal::new(3.0, 0.5, 0.005, 0.0, 100.0);
const PM2_5: Signal = Signal::new(6.0, 0.8, 0.005, 0.0, 200.0);
const PM4_0: Signal = Signal::new(8.0, 1.0, 0.005, 0.0, 250.0);
const PM10: Signal = Signal::new(10.0, 1.2, 0.005, 0.0, 300.0);

/// BME688-class environmental reading, including the BSEC-style derived
/// indices (IAQ, VOC index, CO2 equivalent).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bme688Reading {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub pressure_pa: f64,
    pub gas_ohm: f64,
    pub iaq: f64,
    pub voc_index: f64,
    pub co2_eq_ppm: f64,
}

impl Bme688Reading {
    pub fn initial(rng: &mut impl Rng) -> Self {
        Self {
            temperature_c: TEMPERATURE_C.initial(rng),
            humidity_pct: HUMIDITY_PCT.initial(rng),
            pressure_pa: PRESSURE_PA.initial(rng),
            gas_ohm: GAS_OHM.initial(rng),
            iaq: IAQ.initial(rng),
            voc_index: VOC_INDEX.initial(rng),
            co2_eq_ppm: CO2_EQ_PPM.initial(rng),
        }
    }

    pub fn next(&self, rng: &mut impl Rng) -> Self {
        // Air-quality indices spike occasionally, and the VOC index is
        // loosely coupled to IAQ.
        let mut iaq = IAQ.next(self.iaq, rng);
        if rng.gen_bool(0.02) {
            iaq = clamp(iaq + rng.gen_range(20.0..80.0), IAQ.min, IAQ.max);
        }

        let voc_index = clamp(
            VOC_INDEX.next(self.voc_index, rng)
                + rng.gen_range(-3.0..=3.0)
                + 0.3 * (iaq - IAQ.baseline),
            VOC_INDEX.min,
            VOC_INDEX.max,
        );

        let mut co2_eq_ppm = CO2_EQ_PPM.next(self.co2_eq_ppm, rng);
        if rng.gen_bool(0.02) {
            co2_eq_ppm = clamp(
                co2_eq_ppm + rng.gen_range(100.0..300.0),
                CO2_EQ_PPM.min,
                CO2_EQ_PPM.max,
            );
        }

        Self {
            temperature_c: TEMPERATURE_C.next(self.temperature_c, rng),
            humidity_pct: HUMIDITY_PCT.next(self.humidity_pct, rng),
            pressure_pa: PRESSURE_PA.next(self.pressure_pa, rng),
            gas_ohm: GAS_OHM.next(self.gas_ohm, rng),
            iaq,
            voc_index,
            co2_eq_ppm,
        }
    }
}

/// SPS30-class particulate mass concentrations (µg/m³) at four size cuts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sps30Reading {
    pub pm1_0: f64,
    pub pm2_5: f64,
    pub pm4_0: f64,
    pub pm10: f64,
}

impl Sps30Reading {
    pub fn initial(rng: &mut impl Rng) -> Self {
        Self {
            pm1_0: PM1_0.initial(rng),
            pm2_5: PM2_5.initial(rng),
            pm4_0: PM4_0.initial(rng),
            pm10: PM10.initial(rng),
        }
    }

    pub fn next(&self, rng: &mut impl Rng) -> Self {
        // Rare dust event lifting the coarser fractions together.
        let (mut pm2_5, mut pm10) = (self.pm2_5, self.pm10);
        if rng.gen_bool(0.015) {
            let bump = rng.gen_range(10.0..30.0);
            pm2_5 = clamp(pm2_5 + bump, PM2_5.min, PM2_5.max);
            pm10 = clamp(pm10 + bump * 1.2, PM10.min, PM10.max);
        }

        Self {
            pm1_0: PM1_0.next(self.pm1_0, rng),
            pm2_5: PM2_5.next(pm2_5, rng),
            pm4_0: PM4_0.next(self.pm4_0, rng),
            pm10: PM10.next(pm10, rng),
        }
    }
}

/// Differential pressure across one monitored filter stage, in Pa.
/// Negative values are a pressure drop in flow direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DpReading {
    pub dp_pa: f64,
}

impl DpReading {
    pub fn initial(channel: u32, rng: &mut impl Rng) -> Self {
        let signal = dp_signal(channel);
        Self {
            dp_pa: signal.initial(rng),
        }
    }

    pub fn next(&self, channel: u32, rng: &mut impl Rng) -> Self {
        Self {
            dp_pa: dp_signal(channel).next(self.dp_pa, rng),
        }
    }
}

// Channel 1 sits on the HEPA stage (~ -80 Pa), later channels on denser
// media (~ -95 Pa).
fn dp_signal(channel: u32) -> Signal {
    let baseline = if channel == 1 { -80.0 } else { -95.0 };
    Signal::new(baseline, 3.0, 0.005, -300.0, 20.0)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng as _, rngs::StdRng};

    use super::*;

    #[test]
    fn bme688_fields_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut reading = Bme688Reading::initial(&mut rng);
        for _ in 0..100_000 {
            reading = reading.next(&mut rng);
            assert!((10.0..=35.0).contains(&reading.temperature_c));
            assert!((0.0..=100.0).contains(&reading.humidity_pct));
            assert!((98_000.0..=104_000.0).contains(&reading.pressure_pa));
            assert!((1_000.0..=200_000.0).contains(&reading.gas_ohm));
            assert!((5.0..=250.0).contains(&reading.iaq));
            assert!((0.0..=500.0).contains(&reading.voc_index));
            assert!((400.0..=2_000.0).contains(&reading.co2_eq_ppm));
        }
    }

    #[test]
    fn sps30_fields_stay_non_negative() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut reading = Sps30Reading::initial(&mut rng);
        for _ in 0..100_000 {
            reading = reading.next(&mut rng);
            assert!((0.0..=100.0).contains(&reading.pm1_0));
            assert!((0.0..=200.0).contains(&reading.pm2_5));
            assert!((0.0..=250.0).contains(&reading.pm4_0));
            assert!((0.0..=300.0).contains(&reading.pm10));
        }
    }

    #[test]
    fn dp_stays_in_range_per_channel() {
        let mut rng = StdRng::seed_from_u64(12);
        for channel in [1, 2, 7] {
            let mut reading = DpReading::initial(channel, &mut rng);
            for _ in 0..50_000 {
                reading = reading.next(channel, &mut rng);
                assert!((-300.0..=20.0).contains(&reading.dp_pa));
            }
        }
    }

    #[test]
    fn dp_channel_baselines_differ() {
        let mut rng = StdRng::seed_from_u64(13);
        let hepa = DpReading::initial(1, &mut rng);
        assert!((hepa.dp_pa + 80.0).abs() <= 12.0);
        let wafer = DpReading::initial(2, &mut rng);
        assert!((wafer.dp_pa + 95.0).abs() <= 12.0);
    }

    #[test]
    fn temperature_mean_reverts_to_baseline() {
        let mut rng = StdRng::seed_from_u64(14);
        let mut reading = Bme688Reading::initial(&mut rng);
        reading.temperature_c = 35.0;

        for _ in 0..5_000 {
            reading = reading.next(&mut rng);
        }

        let mut sum = 0.0;
        const SAMPLES: usize = 20_000;
        for _ in 0..SAMPLES {
            reading = reading.next(&mut rng);
            sum += reading.temperature_c;
        }
        let mean = sum / SAMPLES as f64;
        assert!(
            (mean - 21.0).abs() < 5.0,
            "temperature mean {mean} did not settle near 21.0"
        );
    }
}
