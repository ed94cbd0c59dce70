//! Platform backend selection

use std::sync::Arc;

use scrambler_core::{Dispatcher, Platform};

#[cfg(windows)]
pub fn create_platform(dispatcher: Arc<dyn Dispatcher>) -> Platform {
    scrambler_windows::platform(dispatcher)
}

#[cfg(not(windows))]
pub fn create_platform(dispatcher: Arc<dyn Dispatcher>) -> Platform {
    Platform::new(
        Arc::new(unsupported::UnsupportedMonitor),
        Arc::new(unsupported::UnsupportedInjector),
        dispatcher,
    )
}

/// Stand-ins that make `start` fail cleanly where no backend exists
#[cfg(not(windows))]
mod unsupported {
    use scrambler_core::engine::KeyEventHandler;
    use scrambler_core::{Error, KeyEvent, KeyInjector, KeyMonitor, MonitorHandle, Result};

    pub struct UnsupportedMonitor;

    impl KeyMonitor for UnsupportedMonitor {
        fn install(&self, _handler: KeyEventHandler) -> Result<Box<dyn MonitorHandle>> {
            Err(Error::Monitor(format!(
                "No global keyboard backend for {}",
                std::env::consts::OS
            )))
        }
    }

    pub struct UnsupportedInjector;

    impl KeyInjector for UnsupportedInjector {
        fn inject(&self, _event: &KeyEvent) -> Result<()> {
            Err(Error::Injection("Key injection is not supported on this platform".into()))
        }
    }
}
