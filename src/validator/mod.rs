//! Validator: analytical-only comparison of a generated schedule against a
//! declared base schedule (spec.md §4.10). Never consulted on production
//! scheduling paths.
//!
//! **Resolved open question — deviation symmetry.** §4.10's prose gives
//! `|active.wait - base.wait| / base.wait`, which is not commutative in
//! the two list labels. §8 invariant 10 requires the deviation percentage
//! to be independent of which list is called "active". To satisfy both,
//! the denominator here is `max(active.wait, base.wait)` rather than
//! `base.wait` alone — a symmetric relative difference that preserves the
//! "exceeds threshold" semantics. See DESIGN.md.

use crate::common::constants::{DEFAULT_VALIDATOR_THRESHOLD, EVENT_COUNT_WARN_PERCENT};
use crate::model::{Cycle, PeriodBoundaries};
use crate::time_of_day::TimeOfDay;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchedEvent {
    pub active_on_time: TimeOfDay,
    pub base_on_time: TimeOfDay,
    pub active_wait: f64,
    pub base_wait: f64,
    pub deviation_pct: f64,
    pub period_mismatch: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub active_count: usize,
    pub base_count: usize,
    pub event_count_delta_pct: f64,
    pub event_count_warning: bool,
    pub deviations: Vec<MatchedEvent>,
    pub period_mismatches: Vec<MatchedEvent>,
    pub matches: Vec<MatchedEvent>,
    pub report_text: String,
}

/// Wrap-aware circular distance in minutes between two times of day.
fn circular_distance(a: TimeOfDay, b: TimeOfDay) -> u32 {
    let d = a.minutes_until(b);
    d.min(1440 - d)
}

/// Symmetric relative deviation — see module docs.
pub fn deviation_pct(active_wait: f64, base_wait: f64) -> f64 {
    let denom = active_wait.max(base_wait);
    if denom == 0.0 {
        0.0
    } else {
        (active_wait - base_wait).abs() / denom
    }
}

pub fn compare_with_base(
    active: &[Cycle],
    base: &[Cycle],
    sunrise: Option<TimeOfDay>,
    sunset: Option<TimeOfDay>,
    threshold: Option<f64>,
) -> ValidationReport {
    let threshold = threshold.unwrap_or(DEFAULT_VALIDATOR_THRESHOLD);
    let boundaries = PeriodBoundaries::with_daylight(sunrise, sunset);

    let event_count_delta_pct = if base.is_empty() {
        0.0
    } else {
        (active.len() as f64 - base.len() as f64) / base.len() as f64 * 100.0
    };
    let event_count_warning = event_count_delta_pct.abs() > EVENT_COUNT_WARN_PERCENT;

    let mut deviations = Vec::new();
    let mut period_mismatches = Vec::new();
    let mut matches = Vec::new();

    for a in active {
        let a_period = boundaries.period_of(a.on_time);
        let same_period: Vec<&Cycle> = base.iter().filter(|b| boundaries.period_of(b.on_time) == a_period).collect();

        let (chosen, period_mismatch) = if !same_period.is_empty() {
            let closest = same_period
                .into_iter()
                .min_by_key(|b| circular_distance(a.on_time, b.on_time))
                .unwrap();
            (closest, false)
        } else if !base.is_empty() {
            let closest = base.iter().min_by_key(|b| circular_distance(a.on_time, b.on_time)).unwrap();
            (closest, true)
        } else {
            continue;
        };

        let dev = deviation_pct(a.off_duration_minutes, chosen.off_duration_minutes);
        let entry = MatchedEvent {
            active_on_time: a.on_time,
            base_on_time: chosen.on_time,
            active_wait: a.off_duration_minutes,
            base_wait: chosen.off_duration_minutes,
            deviation_pct: dev,
            period_mismatch,
        };

        if period_mismatch {
            period_mismatches.push(entry);
        } else if dev > threshold {
            deviations.push(entry);
        } else {
            matches.push(entry);
        }
    }

    let report_text = render_report(active.len(), base.len(), event_count_delta_pct, event_count_warning, &deviations, &period_mismatches, &matches);

    ValidationReport {
        active_count: active.len(),
        base_count: base.len(),
        event_count_delta_pct,
        event_count_warning,
        deviations,
        period_mismatches,
        matches,
        report_text,
    }
}

fn render_report(
    active_count: usize,
    base_count: usize,
    delta_pct: f64,
    warn: bool,
    deviations: &[MatchedEvent],
    period_mismatches: &[MatchedEvent],
    matches: &[MatchedEvent],
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Active events: {active_count}, base events: {base_count} ({delta_pct:+.1}%)\n"));
    if warn {
        out.push_str(&format!("WARNING: event count delta exceeds {EVENT_COUNT_WARN_PERCENT:.0}%\n"));
    }
    out.push_str(&format!("Matches: {}\n", matches.len()));
    out.push_str(&format!("Flagged deviations: {}\n", deviations.len()));
    for d in deviations {
        out.push_str(&format!(
            "  {} (wait {:.1}m) vs base {} (wait {:.1}m): {:.1}% deviation\n",
            d.active_on_time,
            d.active_wait,
            d.base_on_time,
            d.base_wait,
            d.deviation_pct * 100.0
        ));
    }
    out.push_str(&format!("Period mismatches: {}\n", period_mismatches.len()));
    for m in period_mismatches {
        out.push_str(&format!("  {} has no same-period base match; nearest is {}\n", m.active_on_time, m.base_on_time));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(h: u32, m: u32, wait: f64) -> Cycle {
        Cycle::new(TimeOfDay::from_hm(h, m).unwrap(), wait)
    }

    #[test]
    fn deviation_is_symmetric_in_labelling() {
        // spec.md §8 invariant 10
        assert_eq!(deviation_pct(20.0, 30.0), deviation_pct(30.0, 20.0));
    }

    #[test]
    fn flags_large_deviation_past_threshold() {
        let active = vec![cycle(6, 0, 40.0)];
        let base = vec![cycle(6, 0, 18.0)];
        let report = compare_with_base(&active, &base, None, None, None);
        assert_eq!(report.deviations.len(), 1);
        assert!(report.matches.is_empty());
    }

    #[test]
    fn within_threshold_is_a_match() {
        let active = vec![cycle(6, 0, 20.0)];
        let base = vec![cycle(6, 0, 18.0)];
        let report = compare_with_base(&active, &base, None, None, None);
        assert_eq!(report.matches.len(), 1);
        assert!(report.deviations.is_empty());
    }

    #[test]
    fn s6_period_mismatch_when_no_same_period_base_event() {
        // active event lands at night (21:00); base only has a morning event.
        let active = vec![cycle(21, 0, 60.0)];
        let base = vec![cycle(6, 0, 18.0)];
        let report = compare_with_base(&active, &base, None, None, None);
        assert_eq!(report.period_mismatches.len(), 1);
        assert!(report.period_mismatches[0].period_mismatch);
    }

    #[test]
    fn event_count_delta_warns_past_30_percent() {
        let active = vec![cycle(6, 0, 18.0); 10];
        let base = vec![cycle(6, 0, 18.0); 5];
        let report = compare_with_base(&active, &base, None, None, None);
        assert!(report.event_count_warning);
        assert!((report.event_count_delta_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn report_text_is_deterministic() {
        let active = vec![cycle(6, 0, 18.0)];
        let base = vec![cycle(6, 0, 18.0)];
        let r1 = compare_with_base(&active, &base, None, None, None);
        let r2 = compare_with_base(&active, &base, None, None, None);
        assert_eq!(r1.report_text, r2.report_text);
    }
}
