use std::cmp::Ordering;

use crate::models::Candidate;

/// Weights and thresholds of the representative-image score.
///
/// The defaults are empirically tuned values; they are kept as-is and only
/// exposed so hosts can experiment without patching the scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    /// Pixels per point of resolution bonus
    pub area_divisor: f64,
    pub area_bonus_cap: f64,
    pub landscape_min_ratio: f64,
    pub landscape_max_ratio: f64,
    pub landscape_bonus: f64,
    pub ratio_target: f64,
    pub close_ratio_diff: f64,
    pub close_ratio_bonus: f64,
    pub near_ratio_diff: f64,
    pub near_ratio_bonus: f64,
    /// Ratio difference assumed when the ratio is unknown
    pub unknown_ratio_diff: f64,
    pub small_min_width: u32,
    pub small_min_height: u32,
    pub small_penalty: f64,
    pub tiny_min_width: u32,
    pub tiny_min_height: u32,
    pub tiny_penalty: f64,
    pub https_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            area_divisor: 500_000.0,
            area_bonus_cap: 6.0,
            landscape_min_ratio: 1.4,
            landscape_max_ratio: 2.2,
            landscape_bonus: 3.0,
            ratio_target: 16.0 / 9.0,
            close_ratio_diff: 0.25,
            close_ratio_bonus: 3.0,
            near_ratio_diff: 0.5,
            near_ratio_bonus: 1.0,
            unknown_ratio_diff: 999.0,
            small_min_width: 700,
            small_min_height: 450,
            small_penalty: 4.0,
            tiny_min_width: 500,
            tiny_min_height: 320,
            tiny_penalty: 8.0,
            https_bonus: 0.5,
        }
    }
}

/// A candidate together with its image score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub candidate: &'a Candidate,
    pub score: f64,
}

/// Scores one candidate's image. Dimensions of 0 count as unknown.
pub fn score_image(candidate: &Candidate, weights: &ScoringWeights) -> f64 {
    let (width, height) = (candidate.width, candidate.height);
    let dimensions_known = width > 0 && height > 0;

    let mut score = 0.0;

    let area = if dimensions_known {
        f64::from(width) * f64::from(height)
    } else {
        0.0
    };
    score += (area / weights.area_divisor).min(weights.area_bonus_cap);

    let ratio = if dimensions_known {
        f64::from(width) / f64::from(height)
    } else {
        0.0
    };
    let ratio_diff = if ratio > 0.0 {
        (ratio - weights.ratio_target).abs()
    } else {
        weights.unknown_ratio_diff
    };

    if ratio > weights.landscape_min_ratio && ratio < weights.landscape_max_ratio {
        score += weights.landscape_bonus;
    }

    if ratio_diff < weights.close_ratio_diff {
        score += weights.close_ratio_bonus;
    } else if ratio_diff < weights.near_ratio_diff {
        score += weights.near_ratio_bonus;
    }

    // Both penalties may apply to the same image
    if dimensions_known {
        if width < weights.small_min_width || height < weights.small_min_height {
            score -= weights.small_penalty;
        }
        if width < weights.tiny_min_width || height < weights.tiny_min_height {
            score -= weights.tiny_penalty;
        }
    }

    if is_https(candidate.image_url.as_deref().unwrap_or_default()) {
        score += weights.https_bonus;
    }

    score
}

fn is_https(url: &str) -> bool {
    url.get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"))
}

fn is_denylisted(candidate: &Candidate, denylist: &[String]) -> bool {
    let image_url = candidate.image_url.as_deref().unwrap_or_default();
    denylist
        .iter()
        .any(|entry| !entry.is_empty() && image_url.contains(entry.as_str()))
}

/// The pool ranking operates on: image-bearing candidates outside the
/// denylist, or every image-bearing candidate when the denylist rejects them all.
fn ranking_pool<'a>(candidates: &'a [Candidate], denylist: &[String]) -> Vec<&'a Candidate> {
    let with_image: Vec<&Candidate> = candidates.iter().filter(|c| c.has_image()).collect();

    let safe: Vec<&Candidate> = with_image
        .iter()
        .copied()
        .filter(|c| !is_denylisted(c, denylist))
        .collect();

    if safe.is_empty() {
        if !with_image.is_empty() {
            tracing::debug!(
                candidates = with_image.len(),
                "Every image matched the domain denylist, ranking unfiltered"
            );
        }
        with_image
    } else {
        safe
    }
}

/// Ranks image candidates best-first. Equal scores keep their input order.
pub fn rank_image_candidates<'a>(
    candidates: &'a [Candidate],
    denylist: &[String],
    weights: &ScoringWeights,
) -> Vec<ScoredCandidate<'a>> {
    let mut scored: Vec<ScoredCandidate<'a>> = ranking_pool(candidates, denylist)
        .into_iter()
        .map(|candidate| ScoredCandidate {
            candidate,
            score: score_image(candidate, weights),
        })
        .collect();

    // `sort_by` is stable
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored
}

/// Picks the single best representative image, using the default weights.
///
/// Returns `None` only when no candidate carries an image.
pub fn pick_best_image_candidate<'a>(
    candidates: &'a [Candidate],
    denylist: &[String],
) -> Option<&'a Candidate> {
    pick_best_image_candidate_with(candidates, denylist, &ScoringWeights::default())
}

/// [`pick_best_image_candidate`] with custom weights
pub fn pick_best_image_candidate_with<'a>(
    candidates: &'a [Candidate],
    denylist: &[String],
    weights: &ScoringWeights,
) -> Option<&'a Candidate> {
    let ranked = rank_image_candidates(candidates, denylist, weights);
    match ranked.first() {
        Some(best) => {
            tracing::debug!(
                id = %best.candidate.id,
                score = best.score,
                domain = ?best.candidate.source_domain(),
                considered = ranked.len(),
                "Picked representative image"
            );
            Some(best.candidate)
        }
        None => ranking_pool(candidates, denylist).first().copied(),
    }
}
