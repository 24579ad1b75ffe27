// Plain-text rendering of ranked repositories.
// Formats list lines with relative times and a marker for repositories the viewer doesn't own.

use chrono::{DateTime, Utc};

use crate::model::Repository;
use crate::state::SyncState;

/// Format a timestamp as relative time (e.g., "2h ago").
pub fn format_relative_time(dt: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(*dt);

    if duration.num_days() > 0 {
        format!("{}d ago", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m ago", duration.num_minutes())
    } else {
        "just now".to_string()
    }
}

/// One list line: name, stars, last push, and flags.
pub fn format_repository(repo: &Repository, viewer: Option<&str>, now: DateTime<Utc>) -> String {
    let mut line = format!(
        "{:<40} ★{:<6} {:>9}",
        repo.full_name,
        repo.stars,
        format_relative_time(&repo.pushed_at, now)
    );
    if repo.is_private {
        line.push_str("  private");
    }
    if viewer.is_some_and(|login| !repo.is_owned_by(login)) {
        line.push_str("  (not mine)");
    }
    line
}

/// Short status label for a sync state.
pub fn status_label(state: &SyncState) -> &'static str {
    match state {
        SyncState::Loading => "loading",
        SyncState::ShowingCacheFresh { .. } => "cached",
        SyncState::ShowingCacheStaleRefreshing { .. } => "cached, refreshing",
        SyncState::ShowingFresh { .. } => "up to date",
        SyncState::Errored { .. } => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::repo;
    use chrono::Duration;

    #[test]
    fn test_relative_time() {
        let now = Utc::now();
        assert_eq!(format_relative_time(&now, now), "just now");
        assert_eq!(format_relative_time(&(now - Duration::minutes(5)), now), "5m ago");
        assert_eq!(format_relative_time(&(now - Duration::hours(3)), now), "3h ago");
        assert_eq!(format_relative_time(&(now - Duration::days(12)), now), "12d ago");
    }

    #[test]
    fn test_not_mine_marker() {
        let now = Utc::now();
        let r = repo("spoon-knife", 3, 0.0, now);

        assert!(!format_repository(&r, Some("octocat"), now).contains("not mine"));
        assert!(format_repository(&r, Some("hubot"), now).contains("(not mine)"));
        assert!(!format_repository(&r, None, now).contains("not mine"));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(&SyncState::Loading), "loading");
        assert_eq!(
            status_label(&SyncState::ShowingFresh {
                repositories: Vec::new()
            }),
            "up to date"
        );
    }
}
