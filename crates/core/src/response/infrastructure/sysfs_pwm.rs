use std::fs;
use std::path::{Path, PathBuf};

use crate::response::domain::actuator::{check_pulse_width, ActuatorError, ServoOutput};

const NANOS_PER_SECOND: u64 = 1_000_000_000;
const NANOS_PER_MICRO: u64 = 1_000;

/// Servo on a sysfs PWM channel (`<root>/pwmchipN/pwmM`).
///
/// Period is fixed at open from the servo refresh rate; each pulse update
/// rewrites `duty_cycle` only.
pub struct SysfsServoOutput {
    label: String,
    dir: PathBuf,
}

impl SysfsServoOutput {
    pub fn open(
        root: &Path,
        chip: u32,
        channel: u32,
        frequency_hz: u32,
    ) -> Result<Self, ActuatorError> {
        let label = format!("pwmchip{chip}/pwm{channel}");
        if frequency_hz == 0 {
            return Err(ActuatorError::Rejected {
                target: label,
                reason: "frequency must be positive".into(),
            });
        }
        let chip_dir = root.join(format!("pwmchip{chip}"));
        let dir = chip_dir.join(format!("pwm{channel}"));
        let servo = Self { label, dir };
        if !servo.dir.exists() {
            servo.write_attr(&chip_dir.join("export"), &channel.to_string())?;
        }
        let period = NANOS_PER_SECOND / frequency_hz as u64;
        servo.write_attr(&servo.dir.join("period"), &period.to_string())?;
        servo.write_attr(&servo.dir.join("enable"), "1")?;
        log::debug!("Opened {} at {frequency_hz}Hz", servo.label);
        Ok(servo)
    }

    fn write_attr(&self, path: &Path, value: &str) -> Result<(), ActuatorError> {
        fs::write(path, value).map_err(|source| ActuatorError::Io {
            target: format!("{} ({})", self.label, path.display()),
            source,
        })
    }
}

impl ServoOutput for SysfsServoOutput {
    fn set_pulse_width(&mut self, micros: u32) -> Result<(), ActuatorError> {
        check_pulse_width(&self.label, micros)?;
        let duty = micros as u64 * NANOS_PER_MICRO;
        self.write_attr(&self.dir.join("duty_cycle"), &duty.to_string())
    }
}
