//! Decade-bucketed theme trends.
//!
//! Dated works are grouped by decade. Each decade reports its work count
//! and top themes; consecutive decades present in the input are compared
//! for emerging, declining and persistent themes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::CoreError;

/// Themes kept per decade.
const TOP_THEMES: usize = 5;

/// Upper bound on works per request.
pub const MAX_TEMPORAL_WORKS: usize = 1000;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemporalRequest {
    #[serde(default)]
    pub works: Vec<DatedWork>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatedWork {
    pub title: Option<String>,
    pub year: Option<i32>,
    #[serde(default)]
    pub themes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeCount {
    pub theme: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecadeSummary {
    /// First year of the decade; 1965 falls in 1960.
    pub decade: i64,
    pub label: String,
    pub work_count: usize,
    pub titles: Vec<String>,
    pub common_themes: Vec<ThemeCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThemeShift {
    pub emerging: Vec<String>,
    pub declining: Vec<String>,
    pub persistent: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecadeTrend {
    pub period: String,
    pub themes: ThemeShift,
    pub work_count_change: i64,
    pub observations: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemporalReport {
    pub decades: Vec<DecadeSummary>,
    pub trends: Vec<DecadeTrend>,
    pub dated_works: usize,
    pub undated_works: usize,
    pub distinct_themes: usize,
    pub chart: Value,
}

pub fn decade_of(year: i32) -> i64 {
    i64::from(year).div_euclid(10) * 10
}

fn summarize(decade: i64, works: &[&DatedWork]) -> DecadeSummary {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for work in works {
        // A theme listed twice on one work counts once.
        let themes: BTreeSet<String> = work
            .themes
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        for theme in themes {
            *counts.entry(theme).or_insert(0) += 1;
        }
    }
    let mut common: Vec<ThemeCount> = counts
        .into_iter()
        .map(|(theme, count)| ThemeCount { theme, count })
        .collect();
    common.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.theme.cmp(&b.theme)));
    common.truncate(TOP_THEMES);

    DecadeSummary {
        decade,
        label: format!("{decade}s"),
        work_count: works.len(),
        titles: works.iter().filter_map(|w| w.title.clone()).collect(),
        common_themes: common,
    }
}

fn compare(prev: &DecadeSummary, current: &DecadeSummary) -> DecadeTrend {
    let before: BTreeSet<&str> = prev.common_themes.iter().map(|t| t.theme.as_str()).collect();
    let after: BTreeSet<&str> = current.common_themes.iter().map(|t| t.theme.as_str()).collect();
    let owned = |set: BTreeSet<&&str>| set.into_iter().map(|s| s.to_string()).collect::<Vec<_>>();

    let themes = ThemeShift {
        emerging: owned(after.difference(&before).collect()),
        declining: owned(before.difference(&after).collect()),
        persistent: owned(before.intersection(&after).collect()),
    };

    let mut observations = Vec::new();
    if current.work_count as f64 > prev.work_count as f64 * 1.5 {
        observations.push("Significant increase in work production");
    }
    if themes.emerging.len() > 2 {
        observations.push("Emergence of new thematic directions");
    }

    DecadeTrend {
        period: format!("{}-{}", prev.label, current.label),
        work_count_change: current.work_count as i64 - prev.work_count as i64,
        themes,
        observations,
    }
}

/// Validate a request and build its report.
pub fn analyze_temporal(request: &TemporalRequest) -> Result<TemporalReport, CoreError> {
    if request.works.is_empty() {
        return Err(CoreError::Validation(
            "At least one work is required for temporal analysis".into(),
        ));
    }
    if request.works.len() > MAX_TEMPORAL_WORKS {
        return Err(CoreError::Validation(format!(
            "Temporal analysis is limited to {MAX_TEMPORAL_WORKS} works"
        )));
    }

    let mut by_decade: BTreeMap<i64, Vec<&DatedWork>> = BTreeMap::new();
    for work in &request.works {
        if let Some(year) = work.year {
            by_decade.entry(decade_of(year)).or_default().push(work);
        }
    }
    if by_decade.is_empty() {
        return Err(CoreError::Validation(
            "No works with valid years found for temporal analysis".into(),
        ));
    }

    let decades: Vec<DecadeSummary> = by_decade
        .iter()
        .map(|(decade, works)| summarize(*decade, works))
        .collect();
    let trends = decades.windows(2).map(|w| compare(&w[0], &w[1])).collect();

    let dated_works: usize = decades.iter().map(|d| d.work_count).sum();
    let distinct_themes = decades
        .iter()
        .flat_map(|d| d.common_themes.iter().map(|t| t.theme.as_str()))
        .collect::<BTreeSet<_>>()
        .len();

    // Timeline chart data; decades outside the i32 range cannot be plotted.
    let events: Vec<Value> = decades
        .iter()
        .filter_map(|d| {
            let year = i32::try_from(d.decade).ok()?;
            Some(json!({ "year": year, "label": d.label, "value": d.work_count }))
        })
        .collect();

    Ok(TemporalReport {
        undated_works: request.works.len() - dated_works,
        dated_works,
        distinct_themes,
        chart: json!({ "events": events }),
        trends,
        decades,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(title: &str, year: Option<i32>, themes: &[&str]) -> DatedWork {
        DatedWork {
            title: Some(title.into()),
            year,
            themes: themes.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn decades_floor_toward_negative_infinity() {
        assert_eq!(decade_of(1965), 1960);
        assert_eq!(decade_of(1960), 1960);
        assert_eq!(decade_of(-5), -10);
        assert_eq!(decade_of(i32::MIN), -2_147_483_650);
    }

    #[test]
    fn works_are_grouped_and_compared() {
        let request = TemporalRequest {
            works: vec![
                work("Dune", Some(1965), &["Ecology", "religion"]),
                work("Stand on Zanzibar", Some(1968), &["overpopulation", "ecology"]),
                work("Neuromancer", Some(1984), &["cyberspace", "corporations", "AI", "ecology"]),
                work("Untitled", None, &["mystery"]),
            ],
        };
        let report = analyze_temporal(&request).unwrap();

        assert_eq!(report.dated_works, 3);
        assert_eq!(report.undated_works, 1);
        assert_eq!(report.decades.len(), 2);
        assert_eq!(report.decades[0].label, "1960s");
        assert_eq!(report.decades[0].work_count, 2);
        assert_eq!(
            report.decades[0].common_themes[0],
            ThemeCount { theme: "ecology".into(), count: 2 }
        );

        let trend = &report.trends[0];
        assert_eq!(trend.period, "1960s-1980s");
        assert_eq!(trend.themes.persistent, vec!["ecology"]);
        assert_eq!(trend.themes.emerging, vec!["ai", "corporations", "cyberspace"]);
        assert_eq!(trend.themes.declining, vec!["overpopulation", "religion"]);
        assert_eq!(trend.work_count_change, -1);
        assert_eq!(trend.observations, vec!["Emergence of new thematic directions"]);

        assert_eq!(report.chart["events"][1]["year"], 1980);
        assert_eq!(report.chart["events"][1]["value"], 1);
    }

    #[test]
    fn undated_input_is_rejected() {
        let request = TemporalRequest {
            works: vec![work("Untitled", None, &[])],
        };
        assert!(analyze_temporal(&request).is_err());
        assert!(analyze_temporal(&TemporalRequest::default()).is_err());
    }

    #[test]
    fn extreme_years_are_bucketed_but_not_charted() {
        let request = TemporalRequest {
            works: vec![work("First", Some(i32::MIN), &[]), work("Last", Some(i32::MAX), &[])],
        };
        let report = analyze_temporal(&request).unwrap();
        assert_eq!(report.decades.len(), 2);
        assert_eq!(report.chart["events"].as_array().unwrap().len(), 1);
    }
}
