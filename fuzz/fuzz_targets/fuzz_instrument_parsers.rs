#![no_main]

use libfuzzer_sys::fuzz_target;
use voltcycle::cycles::HalfCycle;
use voltcycle::formats::{biologic, parse_bytes, ParseOptions, ParsedContent};
use voltcycle::voltammetry::{CvFormat, CyclicVoltammetry};

fuzz_target!(|data: &[u8]| {
    // Every parser must return an error on garbage, never panic
    for name in ["fuzz.DTA", "fuzz.mpt", "fuzz.csv", "fuzz.bin"] {
        if let Ok(parsed) = parse_bytes(name, data, &ParseOptions::default()) {
            if let ParsedContent::HalfCycles(records) = parsed.content {
                for record in records {
                    let half = HalfCycle::new(record);
                    let _ = (half.capacity(), half.average_power(), half.mean_voltage());
                }
            }
        }
    }

    let text = String::from_utf8_lossy(data);
    let _ = biologic::parse_battery_module(std::path::Path::new("fuzz.mpt"), &text);

    for format in [CvFormat::Gamry, CvFormat::Biologic, CvFormat::ChInstruments] {
        let _ = CyclicVoltammetry::from_bytes("fuzz", data, format);
    }
});
