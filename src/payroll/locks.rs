use std::sync::Arc;
use std::time::Duration;

use futures::lock::Mutex;
use moka::future::Cache;

use crate::model::payroll::PeriodKey;

/// One async mutex per payroll period, so generation for a period runs one at a time
/// inside this process. Idle entries are evicted.
///
/// Eviction does not look at whether a mutex is held. An entry that idles out (or is
/// pushed out at capacity) while a generation still holds its guard is replaced by a
/// fresh mutex on the next `lock_for`, so two generations for that period can overlap.
/// The unique `(employee_id, month, year)` key in the store still rejects the second
/// insert, and `PayrollService::generate` turns that into an update, so the period
/// keeps a single record. Keep `period_lock_idle_secs` well above the longest expected
/// generation.
#[derive(Clone)]
pub struct PeriodLocks {
    locks: Cache<PeriodKey, Arc<Mutex<()>>>,
}

impl PeriodLocks {
    pub fn new(idle: Duration) -> Self {
        Self {
            locks: Cache::builder()
                .max_capacity(100_000)
                .time_to_idle(idle)
                .build(),
        }
    }

    pub async fn lock_for(&self, key: PeriodKey) -> Arc<Mutex<()>> {
        self.locks
            .get_with(key, async { Arc::new(Mutex::new(())) })
            .await
    }
}
