use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::capture::domain::stop_signal::StopSignal;
use crate::response::domain::actuator::{DigitalInput, Level};

/// Stop flag shared with another thread, e.g. a Ctrl-C handler.
#[derive(Clone, Default)]
pub struct SharedStopFlag {
    flag: Arc<AtomicBool>,
}

impl SharedStopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl StopSignal for SharedStopFlag {
    fn should_stop(&mut self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Runs while a button reads HIGH; stops on LOW or a read failure.
pub struct ButtonHeldSignal {
    button: Box<dyn DigitalInput>,
}

impl ButtonHeldSignal {
    pub fn new(button: Box<dyn DigitalInput>) -> Self {
        Self { button }
    }
}

impl StopSignal for ButtonHeldSignal {
    fn should_stop(&mut self) -> bool {
        match self.button.read() {
            Ok(level) => level != Level::High,
            Err(e) => {
                log::error!("Stop button unreadable, stopping: {e}");
                true
            }
        }
    }
}

/// Stops as soon as any member does.
#[derive(Default)]
pub struct AnyStopSignal {
    signals: Vec<Box<dyn StopSignal>>,
}

impl AnyStopSignal {
    pub fn new(signals: Vec<Box<dyn StopSignal>>) -> Self {
        Self { signals }
    }
}

impl StopSignal for AnyStopSignal {
    fn should_stop(&mut self) -> bool {
        self.signals.iter_mut().any(|s| s.should_stop())
    }
}
