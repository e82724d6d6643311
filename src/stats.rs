use crate::models::EmailStats;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct ToneShare {
    pub name: String,
    pub count: u64,
    pub percent: f64,
}

/// Tone histogram for display, highest count first, ties broken by name
/// so the order does not depend on how the backend serialized the map.
pub fn tone_breakdown(stats: &EmailStats) -> Vec<ToneShare> {
    let total: u64 = stats.popular_tones.values().sum();
    let mut shares: Vec<ToneShare> = stats
        .popular_tones
        .iter()
        .map(|(tone, &count)| ToneShare {
            name: inflections::case::to_title_case(tone),
            count,
            percent: if total == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total as f64
            },
        })
        .collect();
    shares.sort_by(|a, b| match b.count.cmp(&a.count) {
        Ordering::Equal => a.name.cmp(&b.name),
        other => other,
    });
    shares
}

pub fn top_tone_summary(stats: &EmailStats) -> String {
    match tone_breakdown(stats).first() {
        Some(top) => format!("{} ({} emails)", top.name, top.count),
        None => "No data available".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLevel {
    High,
    Medium,
    Low,
}

impl ActivityLevel {
    pub fn from_recent(recent_activity: u64) -> Self {
        if recent_activity > 10 {
            ActivityLevel::High
        } else if recent_activity > 5 {
            ActivityLevel::Medium
        } else {
            ActivityLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityLevel::High => "High",
            ActivityLevel::Medium => "Medium",
            ActivityLevel::Low => "Low",
        }
    }
}

pub fn success_label(stats: &EmailStats) -> String {
    if stats.success_rate.fract() == 0.0 {
        format!("{:.0}%", stats.success_rate)
    } else {
        format!("{:.1}%", stats.success_rate)
    }
}

/// Highest monthly value across both series, for chart bounds
pub fn monthly_peak(stats: &EmailStats) -> u64 {
    stats
        .monthly_stats
        .iter()
        .map(|m| m.sent.max(m.drafts))
        .max()
        .unwrap_or(0)
}
