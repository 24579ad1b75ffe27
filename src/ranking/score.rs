// Usage score calculator.
// Blends star count with exponentially decaying update and push recency.

use chrono::{DateTime, Utc};

use crate::model::Repository;

/// Characteristic decay scale for recency, in days.
pub const DEFAULT_DECAY_DAYS: f64 = 30.0;

/// Points contributed per star.
pub const DEFAULT_STAR_WEIGHT: f64 = 2.0;

/// Points contributed by each recency term at zero elapsed time.
const RECENCY_POINTS: f64 = 100.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Tunable weights for the usage score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub star_weight: f64,
    pub decay_days: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            star_weight: DEFAULT_STAR_WEIGHT,
            decay_days: DEFAULT_DECAY_DAYS,
        }
    }
}

impl ScoreWeights {
    /// Compute the usage score for one repository's metadata as of `now`.
    ///
    /// `stars * star_weight + 100 * e^(-updated_days / decay) + 100 * e^(-pushed_days / decay)`.
    /// Only relative values matter; there is no upper bound.
    pub fn score(
        &self,
        stars: u64,
        updated_at: DateTime<Utc>,
        pushed_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> f64 {
        let recency = self.recency(updated_at, now) + self.recency(pushed_at, now);
        stars as f64 * self.star_weight + recency
    }

    /// Fill in `usage_score` for a freshly fetched set.
    pub fn apply(&self, repositories: &mut [Repository], now: DateTime<Utc>) {
        for repo in repositories.iter_mut() {
            repo.usage_score = self.score(repo.stars, repo.updated_at, repo.pushed_at, now);
        }
    }

    fn recency(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        if self.decay_days.is_nan() || self.decay_days <= 0.0 {
            return 0.0;
        }
        (-days_since(at, now) / self.decay_days).exp() * RECENCY_POINTS
    }
}

/// Fractional days from `at` to `now`; instants after `now` count as zero.
fn days_since(at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = now.signed_duration_since(at).num_milliseconds().max(0);
    millis as f64 / MILLIS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_untouched_today_scores_200() {
        let now = Utc::now();
        let weights = ScoreWeights::default();
        assert_eq!(weights.score(0, now, now, now), 200.0);
    }

    #[test]
    fn test_monotonic_in_stars() {
        let now = Utc::now();
        let updated = now - Duration::days(3);
        let pushed = now - Duration::days(10);
        let weights = ScoreWeights::default();

        let mut previous = f64::MIN;
        for stars in [0, 1, 2, 10, 100, 10_000] {
            let score = weights.score(stars, updated, pushed, now);
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn test_recency_decays_with_age() {
        let now = Utc::now();
        let weights = ScoreWeights::default();

        let fresh = weights.score(0, now, now, now);
        let month_old = weights.score(0, now - Duration::days(30), now - Duration::days(30), now);
        let year_old = weights.score(0, now - Duration::days(365), now - Duration::days(365), now);

        assert!(fresh > month_old);
        assert!(month_old > year_old);
        // One decay scale leaves e^-1 of each term.
        assert!((month_old - 200.0 * (-1.0f64).exp()).abs() < 1e-9);
        assert!(year_old < 1.0);
    }

    #[test]
    fn test_stars_weighted_linearly() {
        let now = Utc::now();
        let weights = ScoreWeights::default();
        let base = weights.score(0, now, now, now);
        assert_eq!(weights.score(5, now, now, now) - base, 10.0);

        let custom = ScoreWeights {
            star_weight: 3.0,
            ..ScoreWeights::default()
        };
        assert_eq!(custom.score(5, now, now, now) - base, 15.0);
    }

    #[test]
    fn test_future_timestamps_clamped() {
        let now = Utc::now();
        let weights = ScoreWeights::default();
        let later = now + Duration::days(2);
        assert_eq!(weights.score(0, later, later, now), 200.0);
    }

    #[test]
    fn test_non_positive_decay_stays_finite() {
        let now = Utc::now();
        let weights = ScoreWeights {
            star_weight: 2.0,
            decay_days: 0.0,
        };
        let score = weights.score(4, now, now, now);
        assert!(score.is_finite());
        assert_eq!(score, 8.0);
    }

    #[test]
    fn test_apply_fills_scores() {
        let now = Utc::now();
        let mut repos = vec![
            crate::model::fixtures::repo("a", 0, 0.0, now),
            crate::model::fixtures::repo("b", 10, 0.0, now),
        ];
        ScoreWeights::default().apply(&mut repos, now);
        assert_eq!(repos[0].usage_score, 200.0);
        assert_eq!(repos[1].usage_score, 220.0);
    }
}
