use super::progress::BadgeProgress;
use super::requirements::{BadgeRequirement, BadgeType};
use serde::Serialize;

/// State of one requirement row for one user. `is_earned` is terminal since
/// counters never decrease.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeStatus {
    pub badge_type: BadgeType,
    pub level: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub requirement: u64,
    pub current: u64,
    pub is_earned: bool,
    pub percent: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeSummary {
    pub statuses: Vec<BadgeStatus>,
    pub earned_count: usize,
    pub total: usize,
}

fn percent_of(current: u64, requirement: u64) -> u8 {
    let percent = (current as f64 * 100.0 / requirement as f64).round();
    percent.min(100.0) as u8
}

pub fn evaluate_requirement(progress: &BadgeProgress, requirement: &BadgeRequirement) -> BadgeStatus {
    let current = progress.get(requirement.badge_type);
    BadgeStatus {
        badge_type: requirement.badge_type,
        level: requirement.level,
        name: requirement.name,
        description: requirement.description,
        requirement: requirement.requirement,
        current,
        is_earned: current >= requirement.requirement,
        percent: percent_of(current, requirement.requirement),
    }
}

/// One status per requirement row, in table order.
pub fn evaluate(progress: &BadgeProgress, requirements: &[BadgeRequirement]) -> BadgeSummary {
    let statuses: Vec<BadgeStatus> = requirements
        .iter()
        .map(|requirement| evaluate_requirement(progress, requirement))
        .collect();
    let earned_count = statuses.iter().filter(|s| s.is_earned).count();
    BadgeSummary {
        total: statuses.len(),
        earned_count,
        statuses,
    }
}
