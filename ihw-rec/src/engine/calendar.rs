//! Calendar resolver
//!
//! Maps a curriculum week number to its topic and enclosing semester. Used
//! only by the calendar-driven flow.

use ihw_common::models::{Calendar, CalendarWeek};

/// Topic given to unmapped weeks when the caller supplies no override
pub const UNSPECIFIED_TOPIC: &str = "Unspecified";

/// Semester name given to unmapped weeks
pub const UNMAPPED_SEMESTER: &str = "Unmapped";

/// Outcome of resolving a week number
#[derive(Debug, Clone, PartialEq)]
pub struct WeekResolution {
    pub week: CalendarWeek,
    /// False when the week is synthetic (not found in the calendar)
    pub mapped: bool,
}

/// Find `week_number` in the calendar
///
/// Semesters and weeks are scanned in stored order; the first exact match
/// wins if the calendar contains duplicates.
pub fn find_week(calendar: &Calendar, week_number: u32) -> Option<CalendarWeek> {
    calendar.semesters.iter().find_map(|semester| {
        semester
            .weeks
            .iter()
            .find(|w| w.week_number == week_number)
            .map(|w| CalendarWeek {
                week_number: w.week_number,
                topic: w.topic.clone(),
                semester_name: semester.name.clone(),
                semester_focus: Some(semester.focus.clone()),
            })
    })
}

/// Resolve `week_number`, synthesizing a week when it is not in the calendar
///
/// `topic_override` is used only for unmapped weeks; a mapped week always
/// takes its topic from the calendar.
pub fn resolve_week(
    calendar: &Calendar,
    week_number: u32,
    topic_override: Option<&str>,
) -> WeekResolution {
    match find_week(calendar, week_number) {
        Some(week) => WeekResolution { week, mapped: true },
        None => {
            let topic = topic_override
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(UNSPECIFIED_TOPIC);
            tracing::debug!(week_number, topic, "Week not in calendar; using synthetic week");
            WeekResolution {
                week: CalendarWeek {
                    week_number,
                    topic: topic.to_string(),
                    semester_name: UNMAPPED_SEMESTER.to_string(),
                    semester_focus: None,
                },
                mapped: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ihw_common::models::{Semester, WeekEntry};
    use ihw_common::Dataset;

    #[test]
    fn test_resolves_week_with_semester_context() {
        let calendar = Dataset::demo().calendar;
        let resolved = resolve_week(&calendar, 4, None);

        assert!(resolved.mapped);
        assert_eq!(resolved.week.topic, "Linear equations and inequalities");
        assert_eq!(resolved.week.semester_name, "Semester 2");
        assert_eq!(
            resolved.week.semester_focus.as_deref(),
            Some("Algebra and geometry foundations")
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let calendar = Dataset::demo().calendar;
        assert_eq!(resolve_week(&calendar, 3, None), resolve_week(&calendar, 3, None));
        assert_eq!(
            resolve_week(&calendar, 99, None),
            resolve_week(&calendar, 99, None)
        );
    }

    #[test]
    fn test_unmapped_week_is_unspecified() {
        let calendar = Dataset::demo().calendar;
        let resolved = resolve_week(&calendar, 99, None);

        assert!(!resolved.mapped);
        assert_eq!(resolved.week.week_number, 99);
        assert_eq!(resolved.week.topic, UNSPECIFIED_TOPIC);
        assert_eq!(resolved.week.semester_name, UNMAPPED_SEMESTER);
        assert!(resolved.week.semester_focus.is_none());
    }

    #[test]
    fn test_override_applies_only_to_unmapped_weeks() {
        let calendar = Dataset::demo().calendar;

        let unmapped = resolve_week(&calendar, 42, Some("Fractions"));
        assert_eq!(unmapped.week.topic, "Fractions");

        let mapped = resolve_week(&calendar, 1, Some("Geometry"));
        assert_eq!(mapped.week.topic, "Fractions and mixed numbers");
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let calendar = Dataset::demo().calendar;
        let resolved = resolve_week(&calendar, 42, Some("  "));
        assert_eq!(resolved.week.topic, UNSPECIFIED_TOPIC);
    }

    #[test]
    fn test_duplicate_weeks_first_wins() {
        let calendar = Calendar {
            semesters: vec![
                Semester {
                    name: "Autumn".to_string(),
                    focus: "Number".to_string(),
                    weeks: vec![WeekEntry {
                        week_number: 7,
                        topic: "Decimals".to_string(),
                    }],
                },
                Semester {
                    name: "Spring".to_string(),
                    focus: "Shape".to_string(),
                    weeks: vec![WeekEntry {
                        week_number: 7,
                        topic: "Angles".to_string(),
                    }],
                },
            ],
        };

        let resolved = resolve_week(&calendar, 7, None);
        assert_eq!(resolved.week.topic, "Decimals");
        assert_eq!(resolved.week.semester_name, "Autumn");
    }
}
