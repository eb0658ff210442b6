use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueBadge {
    Overdue,
    Today,
    Urgent,
    Normal,
}

/// Whole calendar days from `today` until `due`; negative once it has passed.
pub fn days_remaining(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}

pub fn badge(due: NaiveDate, today: NaiveDate) -> DueBadge {
    match days_remaining(due, today) {
        days if days < 0 => DueBadge::Overdue,
        0 => DueBadge::Today,
        1..=3 => DueBadge::Urgent,
        _ => DueBadge::Normal,
    }
}

pub fn describe(due: NaiveDate, today: NaiveDate) -> String {
    let days = days_remaining(due, today);
    match badge(due, today) {
        DueBadge::Overdue => format!("{} overdue by {}d", due.format("%m/%d"), -days),
        DueBadge::Today => format!("{} due today", due.format("%m/%d")),
        DueBadge::Urgent | DueBadge::Normal => format!("{} in {days}d", due.format("%m/%d")),
    }
}
