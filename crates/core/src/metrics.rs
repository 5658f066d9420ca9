use crate::domain::market::PriceUpdate;
use crate::domain::recommendation::Recommendation;

/// Derived per-row metrics. Every field degrades to a fallback or a `None`
/// placeholder when inputs are missing; nothing here returns an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    pub live_price: f64,
    pub change_pct: f64,
    pub mvso_pct: f64,
    /// `None` renders as an em-dash placeholder.
    pub drawdown_pct: Option<f64>,
    pub drawdown_exceeds_stop: bool,
}

/// Live overlay only applies to the current trading day. Past dates always
/// read the static row, even when a quote for the symbol is still in state.
fn overlay<'a>(update: Option<&'a PriceUpdate>, today: bool) -> Option<&'a PriceUpdate> {
    if today {
        update
    } else {
        None
    }
}

pub fn live_price(row: &Recommendation, update: Option<&PriceUpdate>, today: bool) -> f64 {
    overlay(update, today).map(|u| u.price).unwrap_or(row.price)
}

/// The 10:20 baseline for change/MVSO. The live snapshot carries its own
/// copy which wins while the day is in progress.
pub fn reference_price(
    row: &Recommendation,
    update: Option<&PriceUpdate>,
    today: bool,
) -> Option<f64> {
    overlay(update, today)
        .and_then(|u| u.ref_price)
        .or(row.ref_price_1020)
        .filter(|r| *r != 0.0)
}

pub fn effective_volume(
    row: &Recommendation,
    update: Option<&PriceUpdate>,
    today: bool,
) -> Option<f64> {
    overlay(update, today).and_then(|u| u.volume).or(row.volume)
}

pub fn effective_open(
    row: &Recommendation,
    update: Option<&PriceUpdate>,
    today: bool,
) -> Option<f64> {
    overlay(update, today).and_then(|u| u.open).or(row.open)
}

pub fn effective_sector<'a>(
    row: &'a Recommendation,
    update: Option<&'a PriceUpdate>,
    today: bool,
) -> Option<&'a str> {
    overlay(update, today)
        .and_then(|u| u.sector.as_deref())
        .or(row.sector.as_deref())
}

/// Live change percent, with the fallback chain applied field by field:
/// reference-price formula first, then the raw change from the quote, then
/// the stored change, then the open/high estimate when the resolved change
/// is exactly zero.
pub fn change_pct(row: &Recommendation, update: Option<&PriceUpdate>, today: bool) -> f64 {
    let live = live_price(row, update, today);

    if let Some(r) = reference_price(row, update, today) {
        return (live - r) / r * 100.0;
    }

    let raw = overlay(update, today)
        .and_then(|u| u.change)
        .or(row.change_percent);

    match raw {
        Some(c) if c != 0.0 => c,
        resolved => {
            // Quote feeds report change=0 before the first trade of the day;
            // estimate from the open/high range when both are known.
            let open = effective_open(row, update, today);
            let high = overlay(update, today).and_then(|u| u.high).or(row.high);
            match (open, high) {
                (Some(o), Some(h)) if o != 0.0 => (h - o) / o * 100.0,
                _ => resolved.unwrap_or(0.0),
            }
        }
    }
}

/// Max value since open: peak gain over the 10:20 reference. While the day
/// is live the stored high is extended by the current price when it exceeds
/// it. Missing or zero high/reference degrade to 0.
pub fn mvso_pct(row: &Recommendation, update: Option<&PriceUpdate>, today: bool) -> f64 {
    let live = live_price(row, update, today);

    let high_after_1020 = match row.high {
        Some(h) if today && live > h => Some(live.max(h)),
        Some(h) => Some(h),
        None => None,
    };

    match (high_after_1020, reference_price(row, update, today)) {
        (Some(h), Some(r)) if h != 0.0 => (h - r) / r * 100.0,
        _ => 0.0,
    }
}

/// Worst pullback before the peak, relative to the reference. `None` when
/// either side is missing.
pub fn drawdown_pct(row: &Recommendation, update: Option<&PriceUpdate>, today: bool) -> Option<f64> {
    let r = reference_price(row, update, today)?;
    let low = row.low_before_peak?;
    Some((low - r) / r * 100.0)
}

pub fn compute(
    row: &Recommendation,
    update: Option<&PriceUpdate>,
    today: bool,
    stop_loss_threshold: f64,
) -> Derived {
    let drawdown = drawdown_pct(row, update, today);
    Derived {
        live_price: live_price(row, update, today),
        change_pct: change_pct(row, update, today),
        mvso_pct: mvso_pct(row, update, today),
        drawdown_pct: drawdown,
        drawdown_exceeds_stop: drawdown
            .map(|d| d.abs() > stop_loss_threshold)
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(symbol: &str, price: f64) -> Recommendation {
        Recommendation {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            sector: None,
            price,
            change_percent: None,
            ref_price_1020: None,
            ref_price_1120: None,
            ref_price_1220: None,
            high: None,
            low_before_peak: None,
            volume: None,
            open: None,
            probability: None,
            position_qty: None,
            position_pnl: None,
            tag_color: None,
        }
    }

    fn update(price: f64) -> PriceUpdate {
        PriceUpdate {
            price,
            change: None,
            volume: None,
            open: None,
            high: None,
            sector: None,
            ref_price: None,
        }
    }

    #[test]
    fn change_uses_reference_formula_even_when_stored_change_present() {
        let mut r = row("ACME", 10.0);
        r.ref_price_1020 = Some(10.0);
        r.change_percent = Some(99.0);
        let mut u = update(11.0);
        u.change = Some(-3.0);

        let c = change_pct(&r, Some(&u), true);
        assert!((c - 10.0).abs() < 1e-9);
    }

    #[test]
    fn change_falls_back_to_quote_then_stored() {
        let mut r = row("ACME", 10.0);
        r.change_percent = Some(1.5);

        assert_eq!(change_pct(&r, None, true), 1.5);

        let mut u = update(10.0);
        u.change = Some(2.5);
        assert_eq!(change_pct(&r, Some(&u), true), 2.5);
    }

    #[test]
    fn zero_change_estimates_from_open_high() {
        let mut r = row("ACME", 10.0);
        r.open = Some(10.0);
        r.high = Some(10.4);
        let mut u = update(10.0);
        u.change = Some(0.0);

        let c = change_pct(&r, Some(&u), true);
        assert!((c - 4.0).abs() < 1e-9);
    }

    #[test]
    fn change_defaults_to_zero_when_nothing_present() {
        let r = row("ACME", 10.0);
        assert_eq!(change_pct(&r, None, true), 0.0);
    }

    #[test]
    fn past_date_ignores_overlay_entirely() {
        let mut r = row("ACME", 10.0);
        r.ref_price_1020 = Some(10.0);
        let mut u = update(20.0);
        u.ref_price = Some(5.0);

        let d = compute(&r, Some(&u), false, 5.0);
        assert_eq!(d.live_price, 10.0);
        assert!((d.change_pct - 0.0).abs() < 1e-9);
    }

    #[test]
    fn mvso_basic_and_zero_high() {
        let mut r = row("ACME", 10.0);
        r.ref_price_1020 = Some(10.0);
        r.high = Some(10.5);
        assert!((mvso_pct(&r, None, false) - 5.0).abs() < 1e-9);

        r.high = Some(0.0);
        assert_eq!(mvso_pct(&r, None, false), 0.0);
    }

    #[test]
    fn mvso_extends_high_with_live_price_today_only() {
        let mut r = row("ACME", 10.0);
        r.ref_price_1020 = Some(10.0);
        r.high = Some(10.5);
        let u = update(11.0);

        assert!((mvso_pct(&r, Some(&u), true) - 10.0).abs() < 1e-9);
        assert!((mvso_pct(&r, Some(&u), false) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn drawdown_placeholder_and_stop_flag() {
        let mut r = row("ACME", 10.0);
        assert_eq!(drawdown_pct(&r, None, false), None);

        r.ref_price_1020 = Some(10.0);
        r.low_before_peak = Some(9.2);
        let d = compute(&r, None, false, 5.0);
        assert!((d.drawdown_pct.unwrap() + 8.0).abs() < 1e-9);
        assert!(d.drawdown_exceeds_stop);

        let d = compute(&r, None, false, 10.0);
        assert!(!d.drawdown_exceeds_stop);
    }
}
