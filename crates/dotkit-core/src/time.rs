//! Time and duration utilities.

use chrono::{DateTime, Duration, Utc};

/// Format a duration in human-readable form.
pub fn pretty_duration(duration: Duration) -> String {
    let millis = duration.num_milliseconds();
    let secs = duration.num_seconds();

    if secs < 1 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    }
}

/// Format timestamp in fuzzy relative time.
pub fn fuzzy_time(timestamp: DateTime<Utc>) -> String {
    let now = Utc::now();
    let diff = now.signed_duration_since(timestamp);

    if diff.num_seconds() < 60 {
        "just now".to_string()
    } else if diff.num_minutes() < 60 {
        format!("{} minutes ago", diff.num_minutes())
    } else if diff.num_hours() < 24 {
        format!("{} hours ago", diff.num_hours())
    } else {
        format!("{} days ago", diff.num_days())
    }
}

/// Measure execution time of a future.
pub async fn measure<F, R>(f: F) -> (R, Duration)
where
    F: std::future::Future<Output = R>,
{
    let start = Utc::now();
    let result = f.await;
    let duration = Utc::now().signed_duration_since(start);
    (result, duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_duration() {
        assert_eq!(pretty_duration(Duration::milliseconds(250)), "250ms");
        assert_eq!(pretty_duration(Duration::seconds(42)), "42s");
        assert_eq!(pretty_duration(Duration::seconds(125)), "2m 5s");
        assert_eq!(pretty_duration(Duration::seconds(7260)), "2h 1m");
    }

    #[test]
    fn test_fuzzy_time() {
        assert_eq!(fuzzy_time(Utc::now()), "just now");
        assert_eq!(fuzzy_time(Utc::now() - Duration::hours(3)), "3 hours ago");
        assert_eq!(fuzzy_time(Utc::now() - Duration::days(2)), "2 days ago");
    }
}
