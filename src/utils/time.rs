use chrono::{DateTime, Utc};

/// Wall-clock time used for stream descriptors
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Signed distance in milliseconds between two FLV timestamps
pub fn time_delta_ms(start: u32, end: u32) -> i64 {
    (end as i64) - (start as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_utc_is_recent() {
        let now = now_utc();
        assert!(now.timestamp() > 1_600_000_000);
    }

    #[test]
    fn test_time_delta() {
        assert_eq!(time_delta_ms(1000, 1500), 500);
        assert_eq!(time_delta_ms(1500, 1000), -500);
        assert_eq!(time_delta_ms(0, u32::MAX), u32::MAX as i64);
    }
}
