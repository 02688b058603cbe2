use crate::response::domain::actuator::{
    check_pulse_width, ActuatorError, DigitalOutput, Level, ServoOutput,
};

/// Dry-run pin: logs each write instead of driving hardware.
pub struct LoggingDigitalOutput {
    label: String,
    level: Option<Level>,
}

impl LoggingDigitalOutput {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            level: None,
        }
    }

    pub fn level(&self) -> Option<Level> {
        self.level
    }
}

impl DigitalOutput for LoggingDigitalOutput {
    fn write(&mut self, level: Level) -> Result<(), ActuatorError> {
        if self.level != Some(level) {
            log::info!("[dry-run] {} -> {level}", self.label);
        }
        self.level = Some(level);
        Ok(())
    }
}

/// Dry-run servo: validates and logs pulse widths.
pub struct LoggingServoOutput {
    label: String,
    pulse_width: Option<u32>,
}

impl LoggingServoOutput {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            pulse_width: None,
        }
    }

    pub fn pulse_width(&self) -> Option<u32> {
        self.pulse_width
    }
}

impl ServoOutput for LoggingServoOutput {
    fn set_pulse_width(&mut self, micros: u32) -> Result<(), ActuatorError> {
        check_pulse_width(&self.label, micros)?;
        if self.pulse_width != Some(micros) {
            log::info!("[dry-run] {} -> {micros}us", self.label);
        }
        self.pulse_width = Some(micros);
        Ok(())
    }
}
