pub mod comment;
pub mod dashboard;
pub mod group;
pub mod layout;
pub mod post;
pub mod profile;
pub mod toast;
pub mod trending;

use chrono::{DateTime, Utc};
use maud::{html, Markup};

use crate::models::author::Author;

/// "3 hours ago" style age relative to `now`.
pub fn time_ago(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - at).num_seconds().max(0);
    let (n, unit) = match secs {
        s if s < 60 => return "just now".to_string(),
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 2_592_000 => (s / 86_400, "day"),
        s if s < 31_536_000 => (s / 2_592_000, "month"),
        s => (s / 31_536_000, "year"),
    };
    format!("{n} {unit}{} ago", if n == 1 { "" } else { "s" })
}

/// Net score with an explicit `+` when positive.
pub fn signed(score: i64) -> String {
    if score > 0 {
        format!("+{score}")
    } else {
        score.to_string()
    }
}

pub fn avatar(author: &Author) -> Markup {
    html! {
        span.avatar {
            @if let Some(url) = author.avatar_url() {
                img src=(url) alt=(author.username());
            } @else {
                span.avatar-fallback { (author.initial()) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn ages_read_naturally() {
        let now = Utc::now();
        assert_eq!(time_ago(now, now), "just now");
        assert_eq!(time_ago(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(time_ago(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(time_ago(now - Duration::days(40), now), "1 month ago");
    }

    #[test]
    fn positive_scores_get_a_plus() {
        assert_eq!(signed(3), "+3");
        assert_eq!(signed(0), "0");
        assert_eq!(signed(-2), "-2");
    }
}
