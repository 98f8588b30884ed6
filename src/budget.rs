//! Per-request work-tracker call budget.
//!
//! Every tracker call charges the budget before going out; exhausting it
//! fails the request instead of letting a pathological hierarchy fan out
//! into unbounded upstream traffic.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{AppError, AppResult};

/// Hard cap on upstream tracker calls for one request.
#[derive(Debug)]
pub struct CallBudget {
    max_calls: u32,
    used: AtomicU32,
}

impl CallBudget {
    pub fn new(max_calls: u32) -> Self {
        Self {
            max_calls,
            used: AtomicU32::new(0),
        }
    }

    /// Charge one call, or fail when the budget is spent.
    pub fn charge(&self, op_name: &str) -> AppResult<()> {
        let used = self.used.fetch_add(1, Ordering::SeqCst) + 1;
        if used > self.max_calls {
            return Err(AppError::Internal {
                message: format!(
                    "work tracker call budget of {} exhausted at {}",
                    self.max_calls, op_name
                ),
            });
        }
        Ok(())
    }

    /// Calls charged so far.
    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst).min(self.max_calls)
    }
}
