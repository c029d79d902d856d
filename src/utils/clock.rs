use chrono::{DateTime, Utc};

/// Source of the current time. Everything that needs "now" goes through this trait so
/// report window computation stays testable without wall-clock coupling.
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
