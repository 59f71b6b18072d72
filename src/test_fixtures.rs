//! Synthetic instrument files shared by the unit tests.

/// Gamry DTA with `rows` of `(t, v, i)` and the given step current
pub fn gamry_dta(step_current: f64, rows: &[(f64, f64, f64)], comma: bool) -> String {
    gamry_dta_at("12/25/2022", "13:00:00", step_current, rows, comma, 25.0)
}

pub fn gamry_dta_at(
    date: &str,
    time: &str,
    step_current: f64,
    rows: &[(f64, f64, f64)],
    comma: bool,
    temperature: f64,
) -> String {
    let num = |v: f64| {
        let s = format!("{:?}", v);
        if comma {
            s.replace('.', ",")
        } else {
            s
        }
    };
    let mut out = String::new();
    out.push_str("EXPLAIN\n");
    out.push_str("TAG\tCHARGE\n");
    out.push_str("TITLE\tLABEL\tGalvanostatic step\tTest &Identifier\n");
    out.push_str(&format!("DATE\tLABEL\t{}\tDate\n", date));
    out.push_str(&format!("TIME\tLABEL\t{}\tTime\n", time));
    out.push_str(&format!("ISTEP1\tQUANT\t{}\tStep 1 Current (A)\n", num(step_current)));
    out.push_str(&format!("CURVE\tTABLE\t{}\n", rows.len()));
    out.push_str("\tPt\tT\tVf\tIm\tVu\tSig\tAch\tIERange\tOver\tTemp\n");
    out.push_str("\t#\ts\tV vs. Ref.\tA\tV\tV\tV\t#\tbits\tdeg C\n");
    for (k, (t, v, i)) in rows.iter().enumerate() {
        out.push_str(&format!(
            "\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t5\t...........\t{}\n",
            k,
            num(*t),
            num(*v),
            num(*i),
            num(0.0),
            num(*v),
            num(0.0),
            num(temperature)
        ));
    }
    out
}

/// Constant-current Gamry half-cycle: `n` one-second samples after a `t = 0` pre-step row
pub fn constant_current_dta(current: f64, voltage: f64, n: usize) -> String {
    let rows: Vec<(f64, f64, f64)> = (0..=n).map(|k| (k as f64, voltage, current)).collect();
    gamry_dta(current, &rows, false)
}

/// Row of a Biologic cycling table: `(ox/red, t, Ewe, I_mA)`
pub type MptRow = (u8, f64, f64, f64);

pub fn biologic_mpt(loops: &[(usize, usize)], rows: &[MptRow], comma: bool) -> String {
    let num = |v: f64| {
        let s = format!("{:?}", v);
        if comma {
            s.replace('.', ",")
        } else {
            s
        }
    };
    let mut out = String::new();
    out.push_str("EC-Lab ASCII FILE\n");
    out.push_str("Nb header lines : 10\n\n");
    out.push_str("Galvanostatic Cycling with Potential Limitation\n\n");
    out.push_str("Acquisition started on : 12/25/2022 13:00:00\n");
    if !loops.is_empty() {
        out.push_str(&format!("Number of loops : {}\n", loops.len()));
        for (k, (a, b)) in loops.iter().enumerate() {
            out.push_str(&format!("Loop {} from point number {} to {}\n", k, a, b));
        }
    }
    out.push('\n');
    out.push_str("mode\tox/red\terror\tcontrol changes\tNs changes\tcounter inc.\ttime/s\tcontrol/V/mA\tEwe/V\tI/mA\tcycle number\n");
    for (ox, t, v, i) in rows {
        out.push_str(&format!(
            "1\t{}\t0\t0\t0\t0\t{}\t{}\t{}\t{}\t{}\n",
            ox,
            num(*t),
            num(*i),
            num(*v),
            num(*i),
            num(0.0)
        ));
    }
    out
}

/// Biologic battery module with sequences `(ctrl_type, current_mA, direction)`
/// and rows `(Ns, ox/red, t, Ewe, I_mA)`.
pub fn battery_module(sequences: &[(&str, f64, &str)], rows: &[(u32, u8, f64, f64, f64)]) -> String {
    let num = |v: f64| format!("{:?}", v).replace('.', ",");
    let mut out = String::new();
    out.push_str("EC-Lab ASCII FILE\n");
    out.push_str("Nb header lines : 20\n\n");
    out.push_str("Modulo Bat\n\n");
    out.push_str("Acquisition started on : 25/12/2022 13:00:00.125\n");
    let line = |key: &str, values: Vec<String>| format!("{:<20}{}\n", key, values.join("   "));
    out.push_str(&line("Ns", (0..sequences.len()).map(|k| k.to_string()).collect()));
    out.push_str(&line("ctrl_type", sequences.iter().map(|s| s.0.to_string()).collect()));
    out.push_str(&line("ctrl1_val", sequences.iter().map(|s| num(s.1)).collect()));
    out.push_str(&line("ctrl1_val_unit", sequences.iter().map(|_| "mA".to_string()).collect()));
    out.push_str(&line("charge/discharge", sequences.iter().map(|s| s.2.to_string()).collect()));
    out.push('\n');
    out.push_str("mode\tox/red\terror\tcontrol changes\tNs changes\tcounter inc.\tNs\tI Range\ttime/s\tcontrol/mA\tEwe/V\tI/mA\n");
    for (ns, ox, t, v, i) in rows {
        out.push_str(&format!(
            "1\t{}\t0\t0\t0\t0\t{}\t41\t{}\t{}\t{}\t{}\n",
            ox,
            ns,
            num(*t),
            num(*i),
            num(*v),
            num(*i)
        ));
    }
    out
}

/// Two loops, each three charge rows followed by three discharge rows, 10 s apart
pub fn two_loop_rows() -> Vec<MptRow> {
    let mut rows = Vec::new();
    for l in 0..2 {
        let base = l as f64 * 60.0;
        for k in 0..3 {
            rows.push((1, base + k as f64 * 10.0, 1.2 + 0.1 * k as f64, 100.0));
        }
        for k in 0..3 {
            rows.push((0, base + 30.0 + k as f64 * 10.0, 1.1 - 0.1 * k as f64, -100.0));
        }
    }
    rows
}
