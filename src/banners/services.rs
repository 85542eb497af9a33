use time::OffsetDateTime;

/// A banner shows only while its schedule window contains `now`.
pub fn currently_active(
    is_active: bool,
    start_date: OffsetDateTime,
    end_date: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> bool {
    is_active && start_date <= now && end_date.map_or(true, |end| end >= now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn active_within_window() {
        let now = datetime!(2026-08-26 12:00:00 UTC);
        assert!(currently_active(
            true,
            datetime!(2026-08-01 00:00:00 UTC),
            Some(datetime!(2026-09-01 00:00:00 UTC)),
            now
        ));
    }

    #[test]
    fn inactive_flag_wins() {
        let now = datetime!(2026-08-26 12:00:00 UTC);
        assert!(!currently_active(false, datetime!(2026-08-01 00:00:00 UTC), None, now));
    }

    #[test]
    fn outside_window() {
        let now = datetime!(2026-08-26 12:00:00 UTC);
        assert!(!currently_active(
            true,
            datetime!(2026-09-01 00:00:00 UTC),
            None,
            now
        ));
        assert!(!currently_active(
            true,
            datetime!(2026-08-01 00:00:00 UTC),
            Some(datetime!(2026-08-25 00:00:00 UTC)),
            now
        ));
    }

    #[test]
    fn open_ended_window() {
        let now = datetime!(2026-08-26 12:00:00 UTC);
        assert!(currently_active(true, datetime!(2026-08-01 00:00:00 UTC), None, now));
    }
}
