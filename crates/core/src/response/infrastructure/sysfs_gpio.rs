use std::fs;
use std::path::{Path, PathBuf};

use crate::response::domain::actuator::{ActuatorError, DigitalInput, DigitalOutput, Level};

/// A GPIO line under the Linux sysfs interface (`<root>/gpioN`).
struct SysfsLine {
    pin: u32,
    dir: PathBuf,
}

impl SysfsLine {
    /// Exports the pin if the kernel has not already, then sets direction.
    fn open(root: &Path, pin: u32, direction: &str) -> Result<Self, ActuatorError> {
        let dir = root.join(format!("gpio{pin}"));
        if !dir.exists() {
            write_attr(&root.join("export"), &pin.to_string(), pin)?;
        }
        let line = Self { pin, dir };
        write_attr(&line.dir.join("direction"), direction, pin)?;
        log::debug!("Opened GPIO {pin} as {direction}");
        Ok(line)
    }

    fn value_path(&self) -> PathBuf {
        self.dir.join("value")
    }
}

fn write_attr(path: &Path, value: &str, pin: u32) -> Result<(), ActuatorError> {
    fs::write(path, value).map_err(|source| ActuatorError::Io {
        target: format!("gpio{pin} ({})", path.display()),
        source,
    })
}

pub struct SysfsDigitalOutput {
    line: SysfsLine,
}

impl SysfsDigitalOutput {
    pub fn open(root: &Path, pin: u32) -> Result<Self, ActuatorError> {
        Ok(Self {
            line: SysfsLine::open(root, pin, "out")?,
        })
    }
}

impl DigitalOutput for SysfsDigitalOutput {
    fn write(&mut self, level: Level) -> Result<(), ActuatorError> {
        let value = if level.is_high() { "1" } else { "0" };
        write_attr(&self.line.value_path(), value, self.line.pin)
    }
}

pub struct SysfsDigitalInput {
    line: SysfsLine,
}

impl SysfsDigitalInput {
    pub fn open(root: &Path, pin: u32) -> Result<Self, ActuatorError> {
        Ok(Self {
            line: SysfsLine::open(root, pin, "in")?,
        })
    }
}

impl DigitalInput for SysfsDigitalInput {
    fn read(&mut self) -> Result<Level, ActuatorError> {
        let path = self.line.value_path();
        let raw = fs::read_to_string(&path).map_err(|source| ActuatorError::Io {
            target: format!("gpio{} ({})", self.line.pin, path.display()),
            source,
        })?;
        match raw.trim() {
            "0" => Ok(Level::Low),
            "1" => Ok(Level::High),
            other => Err(ActuatorError::Rejected {
                target: format!("gpio{}", self.line.pin),
                reason: format!("unexpected value {other:?}"),
            }),
        }
    }
}
