//! Work communities.
//!
//! Every work belongs to one community per genre and per theme, one for its
//! author (`author:<name>`) and one for its decade (`decade:1960s`).
//! Communities are summarized individually and compared pairwise by the
//! Jaccard overlap of their member works.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::temporal::decade_of;

/// Upper bound on works per request.
pub const MAX_COMMUNITY_WORKS: usize = 200;

/// Overlaps at or below this Jaccard score are not reported.
const OVERLAP_THRESHOLD: f64 = 0.3;

/// Overlaps above this score produce a recommendation.
const SYNERGY_THRESHOLD: f64 = 0.5;

/// Innovation scores above this produce a recommendation.
const INNOVATION_THRESHOLD: f64 = 0.7;

const TOP_THEMES: usize = 5;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommunityRequest {
    #[serde(default)]
    pub works: Vec<CommunityWork>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommunityWork {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    pub rating: Option<f64>,
}

impl CommunityWork {
    fn themes(&self) -> BTreeSet<String> {
        self.themes
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }

    fn communities(&self) -> BTreeSet<String> {
        let mut out: BTreeSet<String> = self
            .genres
            .iter()
            .map(|g| g.trim().to_lowercase())
            .filter(|g| !g.is_empty())
            .collect();
        out.extend(self.themes());
        if let Some(author) = self.author.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            out.insert(format!("author:{author}"));
        }
        if let Some(year) = self.year {
            out.insert(format!("decade:{}s", decade_of(year)));
        }
        out
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommunitySummary {
    pub name: String,
    pub work_count: usize,
    pub titles: Vec<String>,
    pub average_rating: Option<f64>,
    pub common_themes: Vec<String>,
    pub innovation_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommunityOverlap {
    pub communities: [String; 2],
    pub overlap_score: f64,
    pub shared_works: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommunityRecommendation {
    pub kind: &'static str,
    pub communities: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommunityReport {
    pub communities: Vec<CommunitySummary>,
    pub overlaps: Vec<CommunityOverlap>,
    pub recommendations: Vec<CommunityRecommendation>,
}

/// Mean of thematic variety per work and year spread per century, over
/// whichever of the two applies.
fn innovation_score(works: &[&CommunityWork]) -> f64 {
    let mut parts = Vec::new();
    if works.len() > 1 {
        let unique: BTreeSet<String> = works.iter().flat_map(|w| w.themes()).collect();
        parts.push(unique.len() as f64 / works.len() as f64);
    }
    let years: Vec<i64> = works.iter().filter_map(|w| w.year).map(i64::from).collect();
    if let (Some(min), Some(max)) = (years.iter().min(), years.iter().max()) {
        parts.push((max - min) as f64 / 100.0);
    }
    if parts.is_empty() {
        0.0
    } else {
        parts.iter().sum::<f64>() / parts.len() as f64
    }
}

fn summarize(name: &str, works: &[&CommunityWork]) -> CommunitySummary {
    let ratings: Vec<f64> = works
        .iter()
        .filter_map(|w| w.rating)
        .filter(|r| r.is_finite())
        .collect();

    let mut theme_counts: BTreeMap<String, usize> = BTreeMap::new();
    for work in works {
        for theme in work.themes() {
            *theme_counts.entry(theme).or_insert(0) += 1;
        }
    }
    let mut themes: Vec<(String, usize)> = theme_counts.into_iter().collect();
    themes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    CommunitySummary {
        name: name.to_string(),
        work_count: works.len(),
        titles: works.iter().filter_map(|w| w.title.clone()).collect(),
        average_rating: (!ratings.is_empty())
            .then(|| ratings.iter().sum::<f64>() / ratings.len() as f64),
        common_themes: themes.into_iter().take(TOP_THEMES).map(|(t, _)| t).collect(),
        innovation_score: innovation_score(works),
    }
}

/// Validate a request and build its report.
pub fn analyze_communities(request: &CommunityRequest) -> Result<CommunityReport, CoreError> {
    if request.works.is_empty() {
        return Err(CoreError::Validation(
            "At least one work is required for community analysis".into(),
        ));
    }
    if request.works.len() > MAX_COMMUNITY_WORKS {
        return Err(CoreError::Validation(format!(
            "Community analysis is limited to {MAX_COMMUNITY_WORKS} works"
        )));
    }

    // Community name -> indices of member works.
    let mut members: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
    for (i, work) in request.works.iter().enumerate() {
        for community in work.communities() {
            members.entry(community).or_default().insert(i);
        }
    }

    let mut communities: Vec<CommunitySummary> = members
        .iter()
        .map(|(name, idx)| {
            let works: Vec<&CommunityWork> = idx.iter().map(|i| &request.works[*i]).collect();
            summarize(name, &works)
        })
        .collect();
    communities.sort_by(|a, b| b.work_count.cmp(&a.work_count).then_with(|| a.name.cmp(&b.name)));

    let entries: Vec<(&String, &BTreeSet<usize>)> = members.iter().collect();
    let mut overlaps = Vec::new();
    for (i, (a, a_works)) in entries.iter().enumerate() {
        for (b, b_works) in &entries[i + 1..] {
            let shared = a_works.intersection(b_works).count();
            let union = a_works.union(b_works).count();
            let score = if union > 0 { shared as f64 / union as f64 } else { 0.0 };
            if score > OVERLAP_THRESHOLD {
                overlaps.push(CommunityOverlap {
                    communities: [a.to_string(), b.to_string()],
                    overlap_score: score,
                    shared_works: shared,
                });
            }
        }
    }
    overlaps.sort_by(|a, b| {
        b.overlap_score
            .total_cmp(&a.overlap_score)
            .then_with(|| a.communities.cmp(&b.communities))
    });

    let mut recommendations: Vec<CommunityRecommendation> = communities
        .iter()
        .filter(|c| c.innovation_score > INNOVATION_THRESHOLD)
        .map(|c| CommunityRecommendation {
            kind: "innovative_community",
            communities: vec![c.name.clone()],
            reason: format!("Innovation score {:.2}", c.innovation_score),
        })
        .collect();
    recommendations.extend(
        overlaps
            .iter()
            .take(3)
            .filter(|o| o.overlap_score > SYNERGY_THRESHOLD)
            .map(|o| CommunityRecommendation {
                kind: "community_synergy",
                communities: o.communities.to_vec(),
                reason: format!("Overlap score {:.2}", o.overlap_score),
            }),
    );

    Ok(CommunityReport {
        communities,
        overlaps,
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(title: &str, author: &str, year: i32, genres: &[&str], themes: &[&str], rating: Option<f64>) -> CommunityWork {
        CommunityWork {
            title: Some(title.into()),
            author: Some(author.into()),
            year: Some(year),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            themes: themes.iter().map(|t| t.to_string()).collect(),
            rating,
        }
    }

    fn request() -> CommunityRequest {
        CommunityRequest {
            works: vec![
                work("Dune", "Frank Herbert", 1965, &["sf"], &["ecology", "religion"], Some(4.5)),
                work("Dune Messiah", "Frank Herbert", 1969, &["sf"], &["religion"], Some(3.5)),
                work("Neuromancer", "William Gibson", 1984, &["sf", "cyberpunk"], &["ai"], None),
            ],
        }
    }

    #[test]
    fn works_are_placed_in_every_matching_community() {
        let work = &request().works[0];
        let names = work.communities();
        assert!(names.contains("sf"));
        assert!(names.contains("ecology"));
        assert!(names.contains("author:Frank Herbert"));
        assert!(names.contains("decade:1960s"));
    }

    #[test]
    fn summaries_average_ratings_and_score_innovation() {
        let report = analyze_communities(&request()).unwrap();
        let sf = &report.communities[0];
        assert_eq!(sf.name, "sf");
        assert_eq!(sf.work_count, 3);
        assert_eq!(sf.average_rating, Some(4.0));
        // 3 themes / 3 works and a 19 year spread.
        assert!((sf.innovation_score - (1.0 + 0.19) / 2.0).abs() < 1e-9);

        let herbert = report
            .communities
            .iter()
            .find(|c| c.name == "author:Frank Herbert")
            .unwrap();
        assert_eq!(herbert.common_themes, vec!["religion", "ecology"]);
    }

    #[test]
    fn identical_memberships_overlap_fully() {
        let report = analyze_communities(&request()).unwrap();
        let full = report
            .overlaps
            .iter()
            .find(|o| o.communities == ["author:Frank Herbert".to_string(), "decade:1960s".to_string()])
            .unwrap();
        assert_eq!(full.overlap_score, 1.0);
        assert_eq!(full.shared_works, 2);
        assert!(report.overlaps.iter().all(|o| o.overlap_score > OVERLAP_THRESHOLD));
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.kind == "community_synergy"));
    }

    #[test]
    fn empty_request_is_rejected() {
        assert!(analyze_communities(&CommunityRequest::default()).is_err());
    }
}
