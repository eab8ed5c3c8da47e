//! Human-readable and JSON rendering of recommendation results

use crate::engine::Recommendation;
use serde::Serialize;
use std::fmt::Write;

#[derive(Serialize)]
struct RankedRecommendation<'a> {
    rank: usize,
    artist_id: u32,
    artist_name: &'a str,
    score: f32,
}

#[derive(Serialize)]
struct RecommendationReport<'a> {
    user_id: i64,
    requested: i64,
    recommendations: Vec<RankedRecommendation<'a>>,
}

/// Numbered list with three-decimal scores
pub fn format_text(user_id: i64, n: i64, recommendations: &[Recommendation]) -> String {
    let mut out = format!("\nTop {} recommendations for user {}:\n\n", n, user_id);
    for (rank, rec) in recommendations.iter().enumerate() {
        // Writing to a String cannot fail
        let _ = writeln!(out, "{}. {} - Score: {:.3}", rank + 1, rec.artist_name, rec.score);
    }
    out
}

/// Pretty-printed JSON report
pub fn format_json(
    user_id: i64,
    n: i64,
    recommendations: &[Recommendation],
) -> serde_json::Result<String> {
    let report = RecommendationReport {
        user_id,
        requested: n,
        recommendations: recommendations
            .iter()
            .enumerate()
            .map(|(rank, rec)| RankedRecommendation {
                rank: rank + 1,
                artist_id: rec.artist_id,
                artist_name: &rec.artist_name,
                score: rec.score,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&report)
}
