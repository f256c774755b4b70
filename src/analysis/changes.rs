//! Release-over-release percent change.

use crate::models::{ThemeSummary, TypeSummary};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// `(current - previous) / previous * 100`, undefined when there is no
/// previous value or it is zero.
pub fn percent_change(previous: Option<i64>, current: i64) -> Option<f64> {
    match previous {
        Some(prev) if prev != 0 => Some((current - prev) as f64 / prev as f64 * 100.0),
        _ => None,
    }
}

/// Sort by (theme, type, release) and fill each row's change relative to
/// the previous release of the same (theme, type).
pub fn with_type_changes(mut rows: Vec<TypeSummary>) -> Vec<TypeSummary> {
    rows.sort_by(|a, b| {
        a.theme
            .cmp(&b.theme)
            .then_with(|| a.data_type.cmp(&b.data_type))
            .then_with(|| a.release.cmp(&b.release))
    });

    let mut previous: Option<(String, String, i64)> = None;
    for row in &mut rows {
        let prev = previous
            .as_ref()
            .filter(|(theme, data_type, _)| *theme == row.theme && *data_type == row.data_type)
            .map(|(_, _, total)| *total);
        row.pct_change = percent_change(prev, row.total_rows);
        previous = Some((row.theme.clone(), row.data_type.clone(), row.total_rows));
    }

    rows
}

/// Sum type summaries per (release, theme), sorted by (theme, release),
/// with changes relative to the previous release of the same theme.
pub fn theme_totals(rows: &[TypeSummary]) -> Vec<ThemeSummary> {
    let mut sums: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in rows {
        *sums
            .entry((row.theme.clone(), row.release.clone()))
            .or_default() += row.total_rows;
    }

    let mut out = Vec::with_capacity(sums.len());
    let mut previous: Option<(String, i64)> = None;
    for ((theme, release), total_rows) in sums {
        let prev = previous
            .as_ref()
            .filter(|(t, _)| *t == theme)
            .map(|(_, total)| *total);
        previous = Some((theme.clone(), total_rows));
        out.push(ThemeSummary {
            pct_change: percent_change(prev, total_rows),
            release,
            theme,
            total_rows,
        });
    }

    out
}

/// The last release of each theme, largest change first. Undefined
/// changes sort last.
pub fn latest_per_theme(rows: &[ThemeSummary]) -> Vec<ThemeSummary> {
    let mut latest: BTreeMap<&str, &ThemeSummary> = BTreeMap::new();
    for row in rows {
        match latest.get(row.theme.as_str()) {
            Some(existing) if existing.release >= row.release => {}
            _ => {
                latest.insert(row.theme.as_str(), row);
            }
        }
    }

    let mut out: Vec<ThemeSummary> = latest.into_values().cloned().collect();
    out.sort_by(|a, b| compare_changes_desc(a.pct_change, b.pct_change));
    out
}

fn compare_changes_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Keep the newest `max` releases of an ascending list.
pub fn limit_releases(releases: Vec<String>, max: usize) -> Vec<String> {
    let skip = releases.len().saturating_sub(max);
    releases.into_iter().skip(skip).collect()
}
