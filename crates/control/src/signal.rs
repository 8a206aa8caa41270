use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use shared::domain::SignalFlag;

/// Edge flags for the execution layer.
///
/// Flags are independent: raising one never hides another. The orchestrator
/// only raises; clearing is done by the consumer through [`CommandSignal::take`].
#[derive(Debug, Default)]
pub struct CommandSignal {
    mow: AtomicBool,
    stop: AtomicBool,
    dock: AtomicBool,
    resume: AtomicBool,
    map_changed: AtomicBool,
}

impl CommandSignal {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn slot(&self, flag: SignalFlag) -> &AtomicBool {
        match flag {
            SignalFlag::Mow => &self.mow,
            SignalFlag::Stop => &self.stop,
            SignalFlag::Dock => &self.dock,
            SignalFlag::Resume => &self.resume,
            SignalFlag::MapChanged => &self.map_changed,
        }
    }

    /// Returns `false` when the flag was already up.
    pub fn raise(&self, flag: SignalFlag) -> bool {
        !self.slot(flag).swap(true, Ordering::AcqRel)
    }

    pub fn is_raised(&self, flag: SignalFlag) -> bool {
        self.slot(flag).load(Ordering::Acquire)
    }

    /// Consume one flag: reports whether it was up and clears it.
    pub fn take(&self, flag: SignalFlag) -> bool {
        self.slot(flag).swap(false, Ordering::AcqRel)
    }

    pub fn take_all(&self) -> Vec<SignalFlag> {
        SignalFlag::ALL
            .into_iter()
            .filter(|flag| self.take(*flag))
            .collect()
    }

    pub fn raised(&self) -> Vec<SignalFlag> {
        SignalFlag::ALL
            .into_iter()
            .filter(|flag| self.is_raised(*flag))
            .collect()
    }
}
