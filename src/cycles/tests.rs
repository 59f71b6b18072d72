use super::*;
use crate::formats::{Branch, Instrument, RawHalfCycle, SourceInfo};

fn record(branch: Branch, time: Vec<f64>, current: f64, voltage: f64) -> RawHalfCycle {
    let n = time.len();
    RawHalfCycle::new(
        time,
        vec![current; n],
        vec![voltage; n],
        branch,
        SourceInfo::new(format!("{}.DTA", branch), Instrument::Gamry),
    )
    .unwrap()
}

fn seconds(n: usize) -> Vec<f64> {
    (0..=n).map(|k| k as f64).collect()
}

fn half(branch: Branch, current: f64, voltage: f64, n: usize) -> HalfCycle {
    HalfCycle::new(record(branch, seconds(n), current, voltage))
}

#[test]
fn test_constant_current_one_amp_hour() {
    let h = HalfCycle::with_units(record(Branch::Charge, seconds(3600), 1.0, 1.0), Units::si_hours());
    assert!((h.capacity() - 1.0).abs() < 1e-9);
    assert!((h.total_energy() - 1.0).abs() < 1e-9);
    assert_eq!(h.duration(), 3600.0);
    assert!((h.average_power().unwrap() - 1.0).abs() < 1e-9);
    assert!((h.mean_voltage().unwrap() - 1.0).abs() < 1e-12);
}

#[test]
fn test_default_units_are_milli() {
    let h = half(Branch::Discharge, -0.5, 2.0, 36);
    // 0.5 A for 36 s = 18 C = 5 mAh, 36 J = 10 mWh
    assert!((h.capacity() - 5.0).abs() < 1e-9);
    assert!((h.total_energy() - 10.0).abs() < 1e-9);
    assert_eq!(h.units().charge, ChargeUnit::MilliampereHour);
    assert!(h.power().iter().all(|&p| p == -1.0));
}

#[test]
fn test_single_sample_is_degenerate_not_error() {
    let h = HalfCycle::new(record(Branch::Charge, vec![5.0], 1.0, 1.0));
    assert_eq!(h.capacity(), 0.0);
    assert_eq!(h.total_energy(), 0.0);
    assert_eq!(h.average_power(), None);
    assert_eq!(h.mean_voltage(), None);
    assert_eq!(h.charge_trace(), &[0.0]);
}

#[test]
fn test_cumulative_trapezoid_linear_current() {
    let q = cumulative_trapezoid(&[0.0, 1.0, 2.0], &[0.0, 2.0, 4.0]);
    assert_eq!(q, vec![0.0, 1.0, 4.0]);
    assert!(cumulative_trapezoid(&[], &[]).is_empty());
}

#[test]
fn test_equal_capacities_give_unit_coulomb_efficiency() {
    let cycle = Cycle::new(
        0,
        Some(half(Branch::Charge, 0.1, 1.4, 100)),
        Some(half(Branch::Discharge, -0.1, 1.1, 100)),
    )
    .unwrap();
    assert!((cycle.coulomb_efficiency().unwrap() - 1.0).abs() < 1e-12);
    let ve = cycle.voltage_efficiency().unwrap();
    assert!((ve - 1.1 / 1.4).abs() < 1e-12);
    let ee = cycle.energy_efficiency().unwrap();
    assert!((ee - cycle.coulomb_efficiency().unwrap() * ve).abs() < 1e-12);
}

#[test]
fn test_zero_charge_capacity_gives_absent_efficiency() {
    let cycle = Cycle::new(
        3,
        Some(half(Branch::Charge, 0.0, 1.4, 10)),
        Some(half(Branch::Discharge, -0.1, 1.1, 10)),
    )
    .unwrap();
    assert_eq!(cycle.capacity_charge(), Some(0.0));
    assert_eq!(cycle.coulomb_efficiency(), None);
    assert_eq!(cycle.energy_efficiency(), None);
    assert_eq!(cycle.voltage_efficiency(), None);
}

#[test]
fn test_one_sided_cycle_keeps_totals() {
    let cycle = Cycle::new(0, None, Some(half(Branch::Discharge, -0.1, 1.0, 36))).unwrap();
    assert!(!cycle.is_complete());
    assert!((cycle.capacity_discharge().unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(cycle.capacity_charge(), None);
    assert_eq!(cycle.coulomb_efficiency(), None);
    assert_eq!(cycle.time().len(), 37);
    assert_eq!(cycle.aligned_time(false), None);
}

#[test]
fn test_cycle_validation() {
    assert!(matches!(Cycle::new(2, None, None), Err(CycleError::Empty { number: 2 })));
    let wrong = Cycle::new(0, Some(half(Branch::Discharge, -0.1, 1.0, 2)), None);
    assert!(matches!(
        wrong,
        Err(CycleError::BranchMismatch {
            expected: Branch::Charge,
            found: Branch::Discharge,
            ..
        })
    ));
}

#[test]
fn test_cycle_traces_concatenate_charge_then_discharge() {
    let cycle = Cycle::new(
        0,
        Some(half(Branch::Charge, 0.1, 1.4, 2)),
        Some(half(Branch::Discharge, -0.1, 1.1, 3)),
    )
    .unwrap();
    assert_eq!(cycle.time(), vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 3.0]);
    assert_eq!(cycle.voltage()[2], 1.4);
    assert_eq!(cycle.voltage()[3], 1.1);
    assert_eq!(cycle.charge_trace()[3], 0.0);
    assert_eq!(cycle.power().len(), 7);
}

#[test]
fn test_aligned_time() {
    let charge = HalfCycle::new(record(Branch::Charge, vec![10.0, 11.0, 12.0], 0.1, 1.4));
    let discharge = HalfCycle::new(record(Branch::Discharge, vec![20.0, 21.0, 22.0], -0.1, 1.1));
    let cycle = Cycle::new(0, Some(charge), Some(discharge)).unwrap();

    let (c, d) = cycle.aligned_time(false).unwrap();
    assert_eq!(c, vec![0.0, 1.0, 2.0]);
    assert_eq!(d, vec![-2.0, -1.0, 0.0]);

    let (_, d) = cycle.aligned_time(true).unwrap();
    assert_eq!(d, vec![4.0, 3.0, 2.0]);
}

#[test]
fn test_join_continues_time_axis() {
    let a = record(Branch::Charge, vec![0.0, 2.0, 4.0], 0.1, 1.0);
    let b = record(Branch::Charge, vec![0.0, 2.0], 0.1, 1.2);
    let joined = join_records(vec![a, b]).unwrap();
    assert_eq!(joined.len(), 5);
    assert_eq!(joined.time(), &[0.0, 2.0, 4.0, 6.0, 8.0]);
    assert_eq!(joined.source().name, "charge.DTA + charge.DTA");
}

#[test]
fn test_join_rejects_mixed_and_empty() {
    let a = record(Branch::Charge, vec![0.0, 1.0], 0.1, 1.0);
    let b = record(Branch::Discharge, vec![0.0, 1.0], -0.1, 1.0);
    assert!(matches!(join_records(vec![a, b]), Err(CycleError::MixedBranches { .. })));
    assert!(matches!(join_records(vec![]), Err(CycleError::EmptyJoin)));
    assert!(matches!(join_halfcycles(vec![]), Err(CycleError::EmptyJoin)));
}

#[test]
fn test_join_halfcycles_keeps_units() {
    let units = Units::new(ChargeUnit::Coulomb, EnergyUnit::Joule);
    let a = HalfCycle::with_units(record(Branch::Charge, seconds(10), 1.0, 1.0), units);
    let b = HalfCycle::with_units(record(Branch::Charge, seconds(10), 1.0, 1.0), units);
    let joined = join_halfcycles(vec![a, b]).unwrap();
    assert_eq!(joined.units(), units);
    // 10 s + 1 s bridge interval + 10 s at 1 A
    assert!((joined.capacity() - 21.0).abs() < 1e-9);
}

fn cycling(discharges: &[Option<f64>]) -> CellCycling {
    let cycles = discharges
        .iter()
        .enumerate()
        .map(|(k, d)| {
            let charge = Some(half(Branch::Charge, 0.1, 1.4, 36));
            let discharge = d.map(|current| half(Branch::Discharge, -current, 1.1, 36));
            Cycle::new(k, charge, discharge).unwrap()
        })
        .collect();
    CellCycling::new(cycles).unwrap()
}

#[test]
fn test_retention_default_reference_and_override() {
    let mut cc = cycling(&[Some(0.1), Some(0.09), None, Some(0.08)]);
    assert_eq!(cc.reference(), Some(0));

    let retention = cc.capacity_retention();
    assert_eq!(retention.len(), 4);
    assert!((retention[1].unwrap() - 0.9).abs() < 1e-12);
    assert_eq!(retention[2], None);

    let fade = cc.capacity_fade();
    assert_eq!(fade.len(), 3);
    assert!((fade[0].unwrap() + 0.1).abs() < 1e-12);
    assert_eq!(fade[1], None);

    cc.set_reference(3).unwrap();
    assert!((cc.capacity_retention()[3].unwrap() - 1.0).abs() < 1e-12);
    assert!(matches!(
        cc.set_reference(4),
        Err(CycleError::ReferenceOutOfRange { index: 4, len: 4 })
    ));
}

#[test]
fn test_default_reference_skips_one_sided_cycles() {
    let first = Cycle::new(0, None, Some(half(Branch::Discharge, -0.2, 1.1, 36))).unwrap();
    let second = Cycle::new(
        1,
        Some(half(Branch::Charge, 0.1, 1.4, 36)),
        Some(half(Branch::Discharge, -0.1, 1.1, 36)),
    )
    .unwrap();
    let cc = CellCycling::new(vec![first, second]).unwrap();
    assert_eq!(cc.reference(), Some(1));
    assert!((cc.capacity_retention()[0].unwrap() - 2.0).abs() < 1e-12);
}

#[test]
fn test_cellcycling_rejects_gaps() {
    let a = Cycle::new(0, Some(half(Branch::Charge, 0.1, 1.4, 2)), None).unwrap();
    let b = Cycle::new(2, Some(half(Branch::Charge, 0.1, 1.4, 2)), None).unwrap();
    assert!(matches!(
        CellCycling::new(vec![a, b]),
        Err(CycleError::NonContiguous {
            position: 1,
            expected: 1,
            found: 2
        })
    ));
}

#[test]
fn test_cellcycling_sequence_access() {
    let cc = cycling(&[Some(0.1), Some(0.1)]);
    assert_eq!(cc.len(), 2);
    assert_eq!(cc[1].number(), 1);
    assert_eq!(cc.get(5), None);
    assert_eq!((&cc).into_iter().count(), 2);
    assert_eq!(cc.numbers(), vec![0, 1]);
    assert!(cc.coulomb_efficiencies().iter().all(Option::is_some));
    assert!(cc.timestamp().is_none());
    assert!(cc.to_string().contains("Cycles:          2"));
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn cumulative_charge_never_decreases(
            steps in prop::collection::vec((0.0f64..10.0, -5.0f64..5.0), 1..64)
        ) {
            let mut t = 0.0;
            let mut time = Vec::new();
            let mut current = Vec::new();
            for (dt, i) in &steps {
                t += dt;
                time.push(t);
                current.push(*i);
            }
            let q = cumulative_trapezoid(&time, &current);
            prop_assert_eq!(q.len(), time.len());
            prop_assert!(q.windows(2).all(|w| w[1] >= w[0]));
        }

        #[test]
        fn constant_current_matches_closed_form(current in 0.001f64..10.0, n in 1usize..500) {
            let h = HalfCycle::with_units(
                record(Branch::Charge, seconds(n), current, 1.0),
                Units::new(ChargeUnit::Coulomb, EnergyUnit::Joule),
            );
            let expected = current * n as f64;
            prop_assert!((h.capacity() - expected).abs() <= 1e-9 * expected.max(1.0));
        }

        #[test]
        fn energy_efficiency_is_product(
            ic in 0.01f64..1.0, id in 0.01f64..1.0,
            vc in 0.5f64..2.0, vd in 0.5f64..2.0,
        ) {
            let cycle = Cycle::new(
                0,
                Some(half(Branch::Charge, ic, vc, 20)),
                Some(half(Branch::Discharge, -id, vd, 20)),
            ).unwrap();
            let product = cycle.coulomb_efficiency().unwrap() * cycle.voltage_efficiency().unwrap();
            prop_assert!((cycle.energy_efficiency().unwrap() - product).abs() < 1e-9);
        }
    }
}
