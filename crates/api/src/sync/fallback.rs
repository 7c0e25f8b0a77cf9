use tempo_domain::CalendarEvent;

/// Best-effort duplicate resolution for provider pulls when no external id
/// link exists yet: an exact case-insensitive title match on the exact same
/// day with the exact same start time. A heuristic, never authoritative; a
/// miss simply means a new canonical record is created.
pub fn fallback_match<'a>(
    candidates: &'a [CalendarEvent],
    title: &str,
    date: &str,
    start_time: Option<&str>,
) -> Option<&'a CalendarEvent> {
    candidates.iter().find(|e| {
        e.external_id.is_none()
            && !e.is_tombstone()
            && e.date == date
            && e.start_time.as_deref() == start_time
            && e.title.eq_ignore_ascii_case(title)
    })
}

/// Like `fallback_match`, but removes the matched record from the candidate
/// snapshot so one batch cannot hand the same local record to two different
/// provider events.
pub fn claim_fallback(
    candidates: &mut Vec<CalendarEvent>,
    title: &str,
    date: &str,
    start_time: Option<&str>,
) -> Option<CalendarEvent> {
    let claimed = fallback_match(candidates, title, date, start_time)?.clone();
    candidates.retain(|e| e.id != claimed.id);
    Some(claimed)
}

#[cfg(test)]
mod test {
    use super::*;

    fn event(title: &str, date: &str, start_time: Option<&str>) -> CalendarEvent {
        CalendarEvent {
            title: title.into(),
            date: date.into(),
            start_time: start_time.map(|t| t.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn matches_on_title_day_and_start_time() {
        let candidates = vec![
            event("Standup", "2025-01-10", Some("09:00")),
            event("Standup", "2025-01-11", Some("09:00")),
        ];
        let matched = fallback_match(&candidates, "STANDUP", "2025-01-10", Some("09:00"));
        assert_eq!(matched.map(|e| &e.id), Some(&candidates[0].id));
    }

    #[test]
    fn requires_exact_start_time() {
        let candidates = vec![event("Standup", "2025-01-10", Some("09:00"))];
        assert!(fallback_match(&candidates, "Standup", "2025-01-10", Some("09:30")).is_none());
        assert!(fallback_match(&candidates, "Standup", "2025-01-10", None).is_none());
    }

    #[test]
    fn a_claimed_record_cannot_be_matched_twice() {
        let mut candidates = vec![event("Standup", "2025-01-10", Some("09:00"))];
        let first = claim_fallback(&mut candidates, "Standup", "2025-01-10", Some("09:00"));
        assert!(first.is_some());
        // The second identical provider event gets a fresh record instead
        let second = claim_fallback(&mut candidates, "Standup", "2025-01-10", Some("09:00"));
        assert!(second.is_none());
    }

    #[test]
    fn already_linked_events_are_never_matched() {
        let mut linked = event("Standup", "2025-01-10", Some("09:00"));
        linked.external_id = Some("ext_1".into());
        let candidates = vec![linked];
        assert!(fallback_match(&candidates, "Standup", "2025-01-10", Some("09:00")).is_none());
    }
}
