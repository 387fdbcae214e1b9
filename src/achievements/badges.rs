//! Badges are computed from completion history on every read; nothing is stored.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub struct BadgeRule {
    pub code: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub threshold: usize,
}

pub const BADGE_RULES: [BadgeRule; 4] = [
    BadgeRule {
        code: "first_course",
        title: "First Steps",
        description: "Completed your first course",
        threshold: 1,
    },
    BadgeRule {
        code: "dedicated_learner",
        title: "Dedicated Learner",
        description: "Completed 5 courses",
        threshold: 5,
    },
    BadgeRule {
        code: "scholar",
        title: "Scholar",
        description: "Completed 10 courses",
        threshold: 10,
    },
    BadgeRule {
        code: "master",
        title: "Master of Learning",
        description: "Completed 25 courses",
        threshold: 25,
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub code: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub threshold: usize,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AchievementSummary {
    pub completed_courses: usize,
    pub badges: Vec<Badge>,
}

/// `completions` may arrive in any order; the n-th earliest completion earns the badge with threshold n.
pub fn derive_badges(completions: &[DateTime<Utc>]) -> Vec<Badge> {
    let mut ordered = completions.to_vec();
    ordered.sort();

    BADGE_RULES
        .iter()
        .filter_map(|rule| {
            ordered.get(rule.threshold - 1).map(|earned_at| Badge {
                code: rule.code,
                title: rule.title,
                description: rule.description,
                threshold: rule.threshold,
                earned_at: *earned_at,
            })
        })
        .collect()
}

pub fn summarize(completions: &[DateTime<Utc>]) -> AchievementSummary {
    AchievementSummary {
        completed_courses: completions.len(),
        badges: derive_badges(completions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn days(n: usize) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::days(i as i64)).collect()
    }

    #[test]
    fn test_no_completions_no_badges() {
        assert!(derive_badges(&[]).is_empty());
    }

    #[test]
    fn test_first_completion_earns_first_steps() {
        let times = days(1);
        let badges = derive_badges(&times);
        assert_eq!(badges.len(), 1);
        assert_eq!(badges[0].code, "first_course");
        assert_eq!(badges[0].earned_at, times[0]);
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(derive_badges(&days(4)).len(), 1);
        assert_eq!(derive_badges(&days(5)).len(), 2);
        assert_eq!(derive_badges(&days(10)).len(), 3);
        let all = derive_badges(&days(25));
        assert_eq!(all.len(), 4);
        assert_eq!(all[3].title, "Master of Learning");
    }

    #[test]
    fn test_earned_at_is_the_completion_that_reached_threshold() {
        let mut times = days(6);
        times.reverse();
        let badges = derive_badges(&times);
        let sorted = days(6);
        assert_eq!(badges[1].code, "dedicated_learner");
        assert_eq!(badges[1].earned_at, sorted[4]);
    }

    #[test]
    fn test_summary_counts_completions() {
        let summary = summarize(&days(3));
        assert_eq!(summary.completed_courses, 3);
        assert_eq!(summary.badges.len(), 1);
    }
}
