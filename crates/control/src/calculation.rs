use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared view of whether a route computation is running.
#[derive(Debug, Clone, Default)]
pub struct CalculationFlag(Arc<AtomicBool>);

impl CalculationFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Claims the flag. `None` while another computation holds it.
    pub fn try_begin(&self) -> Option<CalculationGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CalculationGuard {
                flag: Arc::clone(&self.0),
            })
    }
}

/// Holds `calculating` up; dropping it (on any path, unwinding included) lowers it.
#[derive(Debug)]
pub struct CalculationGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for CalculationGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
