//! Aggregate dashboard counters derived from registry state.

use chrono::{NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccessLogEntry, Device, User};

/// The four counters shown on the dashboard.
///
/// Always recomputed from the current collections, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_users: usize,
    pub active_devices: usize,
    /// Entries whose timestamp falls on the current calendar day.
    pub today_access: usize,
    /// Denied entries over the whole log, not only today.
    pub failed_attempts: usize,
}

impl DashboardStats {
    /// Projects stats for "today" as seen in the `tz` timezone.
    pub fn project<Tz: TimeZone>(
        users: &[User],
        devices: &[Device],
        access_log: &[AccessLogEntry],
        tz: &Tz,
    ) -> Self {
        let today = Utc::now().with_timezone(tz).date_naive();
        Self::project_on(users, devices, access_log, tz, today)
    }

    /// Projects stats with an explicit calendar day.
    ///
    /// Entry timestamps are converted into `tz` before the date comparison,
    /// so this is a calendar-day match, not a rolling 24 hour window.
    pub fn project_on<Tz: TimeZone>(
        users: &[User],
        devices: &[Device],
        access_log: &[AccessLogEntry],
        tz: &Tz,
        today: NaiveDate,
    ) -> Self {
        Self {
            total_users: users.len(),
            active_devices: devices.iter().filter(|d| d.status().is_online()).count(),
            today_access: access_log
                .iter()
                .filter(|entry| entry.timestamp.with_timezone(tz).date_naive() == today)
                .count(),
            failed_attempts: access_log.iter().filter(|entry| !entry.granted).count(),
        }
    }
}
