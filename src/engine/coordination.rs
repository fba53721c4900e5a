//! Bank lock shared by all characters.
//!
//! Only one character at a time may read bank contents with the intent to
//! withdraw, then withdraw. Without it two characters can both see enough
//! stock and both try to take it.

use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::logutil::ScopedLogger;

#[derive(Debug, Clone, Default)]
pub struct Coordination {
    bank: Arc<Mutex<()>>,
}

impl Coordination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the bank lock. It is released when the guard drops, on every
    /// exit path including `?` returns.
    pub async fn lock_bank(&self, log: &ScopedLogger) -> BankGuard {
        log.debug(format_args!("waiting for bank lock"));
        let guard = self.bank.clone().lock_owned().await;
        log.debug(format_args!("acquired bank lock"));
        BankGuard {
            _guard: guard,
            log: log.clone(),
        }
    }

    /// Whether some character currently holds the bank lock
    pub fn bank_locked(&self) -> bool {
        self.bank.try_lock().is_err()
    }
}

pub struct BankGuard {
    _guard: OwnedMutexGuard<()>,
    log: ScopedLogger,
}

impl Drop for BankGuard {
    fn drop(&mut self) {
        self.log.debug(format_args!("released bank lock"));
    }
}
