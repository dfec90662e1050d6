use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time, never earlier than `floor`; keeps per-entity audit timestamps non-decreasing.
pub fn now_not_before(floor: DateTime<Utc>) -> DateTime<Utc> {
    now().max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn clamps_to_future_floor() {
        let floor = now() + Duration::hours(1);
        assert_eq!(now_not_before(floor), floor);
    }

    #[test]
    fn past_floor_yields_current_time() {
        let floor = now() - Duration::hours(1);
        assert!(now_not_before(floor) > floor);
    }
}
