//! Synthetic instrument files for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

fn number(value: f64, comma: bool) -> String {
    let s = format!("{:?}", value);
    if comma {
        s.replace('.', ",")
    } else {
        s
    }
}

/// Gamry DTA half-cycle at constant `current` (A) lasting `seconds`, sampled every
/// second after a `t = 0` pre-step row, voltage ramping linearly from `v0` to `v1`
pub fn gamry_half_cycle(current: f64, v0: f64, v1: f64, seconds: usize, comma: bool) -> String {
    let date = if comma { "25/12/2022" } else { "12/25/2022" };
    let mut out = String::new();
    out.push_str("EXPLAIN\nTAG\tCHARGE\n");
    out.push_str(&format!("DATE\tLABEL\t{}\tDate\n", date));
    out.push_str("TIME\tLABEL\t13:00:00\tTime\n");
    out.push_str(&format!("ISTEP1\tQUANT\t{}\tStep 1 Current (A)\n", number(current, comma)));
    out.push_str(&format!("CURVE\tTABLE\t{}\n", seconds + 2));
    out.push_str("\tPt\tT\tVf\tIm\tVu\tSig\tAch\tIERange\tOver\tTemp\n");
    out.push_str("\t#\ts\tV vs. Ref.\tA\tV\tV\tV\t#\tbits\tdeg C\n");
    let row = |pt: usize, t: f64, v: f64| {
        format!(
            "\t{}\t{}\t{}\t{}\t0\t0\t0\t5\t...........\t-300\n",
            pt,
            number(t, comma),
            number(v, comma),
            number(current, comma)
        )
    };
    out.push_str(&row(0, 0.0, v0));
    for k in 0..=seconds {
        let v = v0 + (v1 - v0) * k as f64 / seconds.max(1) as f64;
        out.push_str(&row(k + 1, (k + 1) as f64, v));
    }
    out
}

/// Write `cycles` charge/discharge file pairs into `dir`
pub fn write_gamry_cycles(dir: &Path, current: f64, cycles: usize, comma: bool) -> Vec<PathBuf> {
    fs::create_dir_all(dir).unwrap();
    let mut paths = Vec::new();
    for k in 1..=cycles {
        let charge = dir.join(format!("Charge_{}.DTA", k));
        let discharge = dir.join(format!("Discharge_{}.DTA", k));
        // discharge shortens by one second per cycle
        fs::write(&charge, gamry_half_cycle(current, 1.0, 1.4, 40, comma)).unwrap();
        fs::write(&discharge, gamry_half_cycle(-current, 1.3, 0.9, 40 - k, comma)).unwrap();
        paths.push(charge);
        paths.push(discharge);
    }
    paths
}

/// Biologic GCPL export with `cycles` loops of charge then discharge
pub fn biologic_cycling(cycles: usize, current_ma: f64) -> String {
    let mut rows = Vec::new();
    let mut t = 0.0;
    for _ in 0..cycles {
        for (ox, sign) in [(1, 1.0), (0, -1.0)] {
            for k in 0..10 {
                let v = if ox == 1 { 1.0 + 0.04 * k as f64 } else { 1.3 - 0.04 * k as f64 };
                rows.push((ox, t, v, sign * current_ma));
                t += 10.0;
            }
        }
    }

    let mut out = String::new();
    out.push_str("EC-Lab ASCII FILE\nNb header lines : 12\n\n");
    out.push_str("Galvanostatic Cycling with Potential Limitation\n\n");
    out.push_str("Acquisition started on : 12/25/2022 13:00:00\n");
    out.push_str(&format!("Number of loops : {}\n", cycles));
    for l in 0..cycles {
        out.push_str(&format!("Loop {} from point number {} to {}\n", l, l * 20, l * 20 + 19));
    }
    out.push('\n');
    out.push_str("mode\tox/red\terror\tcontrol changes\tNs changes\tcounter inc.\ttime/s\tcontrol/V/mA\tEwe/V\tI/mA\tcycle number\n");
    for (ox, t, v, i) in rows {
        out.push_str(&format!("1\t{}\t0\t0\t0\t0\t{:?}\t{:?}\t{:?}\t{:?}\t0.0\n", ox, t, i, v, i));
    }
    out
}

/// Gamry base / step / CHARGE_DISCHARGE tree with `(folder name, current A, cycles)` steps
pub fn write_gamry_tree(base: &Path, steps: &[(&str, f64, usize)]) {
    for (name, current, cycles) in steps {
        write_gamry_cycles(&base.join(name).join("CHARGE_DISCHARGE"), *current, *cycles, false);
    }
}
