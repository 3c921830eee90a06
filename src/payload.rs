use anyhow::{Context as _, Result};
use serde::Serialize;

use crate::sensor::{Bme688Reading, DpReading, Sps30Reading, round_to};

// Field names and precision are parsed by downstream consumers; both are
// fixed. `ts` is supplied by the caller so encoding stays clock-free.

#[derive(Debug, Serialize)]
struct Bme688Payload<'a> {
    t_c: f64,
    rh_pct: f64,
    p_pa: f64,
    gas_ohm: f64,
    iaq: f64,
    voc_index: f64,
    co2_eq: f64,
    ts: &'a str,
}

#[derive(Debug, Serialize)]
struct Sps30Payload<'a> {
    pm1_0: f64,
    pm2_5: f64,
    pm4_0: f64,
    pm10: f64,
    ts: &'a str,
}

#[derive(Debug, Serialize)]
struct DpPayload<'a> {
    dp_pa: f64,
    ts: &'a str,
}

#[derive(Debug, Serialize)]
struct StatusPayload<'a> {
    online: bool,
    fw: &'a str,
    rssi_dbm: i32,
    ts: &'a str,
}

pub fn bme688(reading: &Bme688Reading, ts: &str) -> Result<String> {
    serde_json::to_string(&Bme688Payload {
        t_c: round_to(reading.temperature_c, 2),
        rh_pct: round_to(reading.humidity_pct, 1),
        p_pa: round_to(reading.pressure_pa, 0),
        gas_ohm: round_to(reading.gas_ohm, 0),
        iaq: round_to(reading.iaq, 1),
        voc_index: round_to(reading.voc_index, 1),
        co2_eq: round_to(reading.co2_eq_ppm, 0),
        ts,
    })
    .context("failed to encode bme688 payload")
}

pub fn sps30(reading: &Sps30Reading, ts: &str) -> Result<String> {
    serde_json::to_string(&Sps30Payload {
        pm1_0: round_to(reading.pm1_0, 1),
        pm2_5: round_to(reading.pm2_5, 1),
        pm4_0: round_to(reading.pm4_0, 1),
        pm10: round_to(reading.pm10, 1),
        ts,
    })
    .context("failed to encode sps30 payload")
}

pub fn dp(reading: &DpReading, ts: &str) -> Result<String> {
    serde_json::to_string(&DpPayload {
        dp_pa: round_to(reading.dp_pa, 1),
        ts,
    })
    .context("failed to encode dp payload")
}

pub fn status(online: bool, fw: &str, rssi_dbm: i32, ts: &str) -> Result<String> {
    serde_json::to_string(&StatusPayload {
        online,
        fw,
        rssi_dbm,
        ts,
    })
    .context("failed to encode status payload")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2026-08-23T12:00:00.000Z";

    fn bme688_reading() -> Bme688Reading {
        Bme688Reading {
            temperature_c: 21.4567,
            humidity_pct: 45.23,
            pressure_pa: 101_325.4,
            gas_ohm: 50_000.6,
            iaq: 35.04,
            voc_index: 15.99,
            co2_eq_ppm: 600.4,
        }
    }

    #[test]
    fn bme688_field_names_and_order() {
        let json = bme688(&bme688_reading(), TS).unwrap();
        assert_eq!(
            json,
            r#"{"t_c":21.46,"rh_pct":45.2,"p_pa":101325.0,"gas_ohm":50001.0,"iaq":35.0,"voc_index":16.0,"co2_eq":600.0,"ts":"2026-08-23T12:00:00.000Z"}"#
        );
    }

    #[test]
    fn sps30_field_names_and_order() {
        let reading = Sps30Reading {
            pm1_0: 3.14,
            pm2_5: 6.06,
            pm4_0: 8.0,
            pm10: 10.55,
        };
        let json = sps30(&reading, TS).unwrap();
        assert_eq!(
            json,
            r#"{"pm1_0":3.1,"pm2_5":6.1,"pm4_0":8.0,"pm10":10.6,"ts":"2026-08-23T12:00:00.000Z"}"#
        );
    }

    #[test]
    fn dp_field_names() {
        let json = dp(&DpReading { dp_pa: -80.44 }, TS).unwrap();
        assert_eq!(json, r#"{"dp_pa":-80.4,"ts":"2026-08-23T12:00:00.000Z"}"#);
    }

    #[test]
    fn status_field_names() {
        let json = status(true, "emu-0.1.0", -58, TS).unwrap();
        assert_eq!(
            json,
            r#"{"online":true,"fw":"emu-0.1.0","rssi_dbm":-58,"ts":"2026-08-23T12:00:00.000Z"}"#
        );
    }

    #[test]
    fn encoding_is_idempotent() {
        let reading = bme688_reading();
        assert_eq!(bme688(&reading, TS).unwrap(), bme688(&reading, TS).unwrap());
    }
}
