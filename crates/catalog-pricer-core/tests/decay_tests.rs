use catalog_pricer_core::decay::{ShiftedDecayCurve, WeeklyDecayCurve};
use catalog_pricer_core::tables::DecayAnchorTable;
use catalog_pricer_core::GenreFallback;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

fn reference_anchors() -> Vec<Decimal> {
    vec![
        dec!(1.0),
        dec!(0.85),
        dec!(0.72),
        dec!(0.61),
        dec!(0.52),
        dec!(0.44),
        dec!(0.37),
        dec!(0.32),
        dec!(0.27),
        dec!(0.23),
    ]
}

// ===========================================================================
// Weekly curve shape
// ===========================================================================

#[test]
fn test_curve_starts_at_peak_and_never_rises() {
    let curve = WeeklyDecayCurve::build(&reference_anchors(), 10, dec!(0.005)).unwrap();
    assert_eq!(curve.at(0), Some(Decimal::ONE));
    for pair in curve.multipliers().windows(2) {
        assert!(pair[1] <= pair[0], "curve rose from {} to {}", pair[0], pair[1]);
    }
    assert!(curve.multipliers().iter().all(|m| !m.is_sign_negative()));
}

#[test]
fn test_each_year_within_half_percent_of_anchor() {
    let anchors = reference_anchors();
    let curve = WeeklyDecayCurve::build(&anchors, 10, dec!(0.005)).unwrap();
    for (year, (sum, anchor)) in curve.annual_sums().iter().zip(&anchors).enumerate() {
        let target = anchor * dec!(52);
        let err = ((sum - target) / target).abs();
        assert!(err <= dec!(0.005), "year {} error {}", year + 1, err);
    }
}

#[test]
fn test_anchor_exact_at_year_end() {
    let anchors = reference_anchors();
    let curve = WeeklyDecayCurve::build(&anchors, 10, dec!(0.005)).unwrap();
    for (y, anchor) in anchors.iter().enumerate() {
        assert_eq!(curve.multipliers()[52 * (y + 1) - 1], *anchor);
    }
}

#[test]
fn test_tighter_tolerance_still_holds() {
    let curve = WeeklyDecayCurve::build(&reference_anchors(), 10, dec!(0.001)).unwrap();
    let report = curve.validate_against_anchors(dec!(0.001));
    assert!(report.valid, "worst year {:?}", report.worst_year);
}

#[test]
fn test_unnormalised_anchors_scale_to_one() {
    let raw: Vec<Decimal> = reference_anchors().iter().map(|a| a * dec!(40)).collect();
    let curve = WeeklyDecayCurve::build(&raw, 10, dec!(0.005)).unwrap();
    assert_eq!(curve.at(0), Some(Decimal::ONE));
    assert_eq!(curve.anchors()[1], dec!(0.85));
}

// ===========================================================================
// Shifted curve
// ===========================================================================

#[test]
fn test_shift_zero_round_trip() {
    let curve = WeeklyDecayCurve::build(&reference_anchors(), 10, dec!(0.005)).unwrap();
    let shifted = ShiftedDecayCurve::new(&curve, 0, curve.len()).unwrap();
    assert_eq!(shifted.multipliers(), curve.multipliers());
}

#[test]
fn test_shift_holds_tail_beyond_curve() {
    let curve = WeeklyDecayCurve::build(&reference_anchors(), 10, dec!(0.005)).unwrap();
    let shifted = ShiftedDecayCurve::new(&curve, 500, 520).unwrap();
    assert_eq!(shifted.multipliers()[19], dec!(0.23));
    assert_eq!(shifted.multipliers()[519], dec!(0.23));
    assert_eq!(shifted.held_weeks(), 500);
}

// ===========================================================================
// Anchor table lookups
// ===========================================================================

#[test]
fn test_table_aliases_and_fallback() {
    let mut curves = BTreeMap::new();
    curves.insert("Dance, Electronic, Electronica".to_string(), reference_anchors());
    curves.insert("Rock".to_string(), vec![dec!(1.0), dec!(0.9)]);
    let table = DecayAnchorTable::new(curves).unwrap();

    assert_eq!(table.anchors("EDM").unwrap()[1], dec!(0.85));
    assert!(table.resolve("Polka", GenreFallback::Reject).is_err());
    let avg = table.resolve("Polka", GenreFallback::Average).unwrap();
    assert_eq!(avg.anchors, vec![dec!(1.0), dec!(0.875)]);
}
