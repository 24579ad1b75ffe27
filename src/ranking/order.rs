// Repository ordering.
// Most recently accessed first; usage score breaks ties between equal access times.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::Repository;

/// Last-access timestamps keyed by repository id.
pub type AccessTimes = HashMap<String, DateTime<Utc>>;

/// Order repositories for display.
///
/// This is a strict two-tier sort, not a weighted blend: any repository accessed
/// more recently outranks one accessed earlier (or never), whatever their scores.
/// Never-accessed repositories sort as if accessed at the Unix epoch. Equal access
/// times fall back to `usage_score`, descending. The sort is stable.
pub fn rank(repositories: &[Repository], access_times: &AccessTimes) -> Vec<Repository> {
    let mut ranked = repositories.to_vec();
    ranked.sort_by(|a, b| compare(a, b, access_times));
    ranked
}

fn compare(a: &Repository, b: &Repository, access_times: &AccessTimes) -> Ordering {
    let accessed = |repo: &Repository| {
        access_times
            .get(&repo.id)
            .copied()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    };

    accessed(b)
        .cmp(&accessed(a))
        .then_with(|| b.usage_score.total_cmp(&a.usage_score))
}
