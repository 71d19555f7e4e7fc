use chrono::Local;

/// Source of message timestamps.
pub trait Clock: Send + Sync {
    fn timestamp(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn timestamp(&self) -> String {
        Local::now().format("%H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_formats_hour_and_minute() {
        let ts = SystemClock.timestamp();
        assert_eq!(ts.len(), 5);
        assert_eq!(&ts[2..3], ":");
        assert!(ts[..2].parse::<u32>().unwrap() < 24);
        assert!(ts[3..].parse::<u32>().unwrap() < 60);
    }
}
