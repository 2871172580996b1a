use catalog_pricer_core::decay::WeeklyDecayCurve;
use catalog_pricer_core::recoupment::{CashFlowEngine, DealTerms, DealType, InvestmentSplit};
use catalog_pricer_core::solvers::{realized_irr, solve_irr, solve_payback, SolverConfig};
use catalog_pricer_core::types::{aggregate_blocks, WEEKS_PER_YEAR};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn full_split() -> InvestmentSplit {
    InvestmentSplit::new(dec!(1), true).unwrap()
}

/// Year-1 gross of 100,000 on the reference decay anchors, weekly.
fn reference_weekly_gross() -> Vec<Decimal> {
    let anchors = vec![
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
    ];
    let curve = WeeklyDecayCurve::build(&anchors, 10, dec!(0.005)).unwrap();
    let weekly_peak = dec!(100000) / dec!(52);
    curve.multipliers().iter().map(|m| weekly_peak * m).collect()
}

fn within(actual: Decimal, expected: Decimal, pct: Decimal) -> bool {
    ((actual - expected) / expected).abs() <= pct
}

// ===========================================================================
// Payback solver: flat weekly revenue known answers
// ===========================================================================

#[test]
fn test_payback_flat_distribution() {
    let gross = vec![dec!(1000); 520];
    let terms = DealTerms::new(DealType::Distribution, dec!(0.3)).unwrap();
    let out = solve_payback(&gross, terms, full_split(), 78, &SolverConfig::default()).unwrap();
    assert_eq!(out.investment, dec!(78000));
}

#[test]
fn test_payback_flat_royalty() {
    let gross = vec![dec!(1000); 520];
    let terms = DealTerms::new(DealType::Royalty, dec!(0.8)).unwrap();
    let out = solve_payback(&gross, terms, full_split(), 78, &SolverConfig::default()).unwrap();
    assert_eq!(out.investment, dec!(15600));
}

#[test]
fn test_payback_flat_profit_split() {
    // 78 × (1000 − I/520) = I  ⇒  I = 78000 / 1.15
    let gross = vec![dec!(1000); 520];
    let terms = DealTerms::new(DealType::ProfitSplit, dec!(0.5)).unwrap();
    let out = solve_payback(&gross, terms, full_split(), 78, &SolverConfig::default()).unwrap();
    assert!(out.converged);
    assert!(
        (out.investment - dec!(67826.09)).abs() < dec!(2),
        "got {}",
        out.investment
    );
    let engine = CashFlowEngine::new(&gross, terms).unwrap();
    let recoup = engine.recoup_period(&full_split().investment(out.investment));
    assert!(matches!(recoup, Some(w) if w <= 78));
}

#[test]
fn test_payback_result_recoups_inside_horizon() {
    let gross = reference_weekly_gross();
    for (dt, share) in [
        (DealType::Royalty, dec!(0.8)),
        (DealType::Distribution, dec!(0.3)),
        (DealType::ProfitSplit, dec!(0.5)),
    ] {
        let terms = DealTerms::new(dt, share).unwrap();
        let out = solve_payback(&gross, terms, full_split(), 78, &SolverConfig::default()).unwrap();
        let engine = CashFlowEngine::new(&gross, terms).unwrap();
        let at = engine.recoup_period(&full_split().investment(out.investment));
        assert!(matches!(at, Some(w) if w <= 78), "{dt}: {at:?}");
        let over = engine.recoup_period(&full_split().investment(out.investment + dec!(5)));
        assert!(!matches!(over, Some(w) if w <= 78), "{dt}: bound not tight");
    }
}

// ===========================================================================
// IRR solver: reference scenario
// ===========================================================================

#[test]
fn test_reference_scenario_irr_prices() {
    let annual = aggregate_blocks(&reference_weekly_gross(), WEEKS_PER_YEAR);
    let cfg = SolverConfig::default();
    let cases = [
        (DealType::Royalty, dec!(0.80), dec!(316000)),
        (DealType::Distribution, dec!(0.30), dec!(214000)),
        (DealType::ProfitSplit, dec!(0.50), dec!(174000)),
    ];
    for (dt, share, expected) in cases {
        let terms = DealTerms::new(dt, share).unwrap();
        let out = solve_irr(&annual, terms, full_split(), dec!(0.15), &cfg).unwrap();
        assert!(out.converged, "{dt} did not converge");
        assert!(
            within(out.investment, expected, dec!(0.05)),
            "{dt}: expected ~{expected}, got {}",
            out.investment
        );
    }
}

#[test]
fn test_realized_irr_matches_target() {
    let annual = aggregate_blocks(&reference_weekly_gross(), WEEKS_PER_YEAR);
    for (dt, share) in [
        (DealType::Royalty, dec!(0.8)),
        (DealType::Distribution, dec!(0.3)),
        (DealType::ProfitSplit, dec!(0.5)),
    ] {
        for target in [dec!(0.10), dec!(0.15)] {
            let terms = DealTerms::new(dt, share).unwrap();
            let out = solve_irr(&annual, terms, full_split(), target, &SolverConfig::default())
                .unwrap();
            let run = CashFlowEngine::new(&annual, terms)
                .unwrap()
                .run(&full_split().investment(out.investment))
                .unwrap();
            let irr = realized_irr(&run).unwrap();
            assert!(
                (irr - target).abs() < dec!(0.0001),
                "{dt} at {target}: realized {irr}"
            );
        }
    }
}

#[test]
fn test_deal_type_ranking_same_share() {
    let annual = aggregate_blocks(&reference_weekly_gross(), WEEKS_PER_YEAR);
    let cfg = SolverConfig::default();
    let price = |dt| {
        let terms = DealTerms::new(dt, dec!(0.5)).unwrap();
        solve_irr(&annual, terms, full_split(), dec!(0.15), &cfg)
            .unwrap()
            .investment
    };
    let royalty = price(DealType::Royalty);
    let distribution = price(DealType::Distribution);
    let profit_split = price(DealType::ProfitSplit);
    assert!(royalty >= distribution, "{royalty} < {distribution}");
    assert!(distribution >= profit_split, "{distribution} < {profit_split}");
}

#[test]
fn test_higher_target_prices_lower() {
    let annual = aggregate_blocks(&reference_weekly_gross(), WEEKS_PER_YEAR);
    let terms = DealTerms::new(DealType::Distribution, dec!(0.3)).unwrap();
    let cfg = SolverConfig::default();
    let at_10 = solve_irr(&annual, terms, full_split(), dec!(0.10), &cfg).unwrap();
    let at_15 = solve_irr(&annual, terms, full_split(), dec!(0.15), &cfg).unwrap();
    assert!(at_10.investment > at_15.investment);
}
