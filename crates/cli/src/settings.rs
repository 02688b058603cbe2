use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use facefollow_core::shared::config::{ConfigError, TrackerConfig};
use facefollow_core::shared::constants::{
    BUTTON_PIN, LED_CENTER_PIN, LED_LEFT_PIN, LED_RIGHT_PIN, ON_LIGHT_PIN, SERVO_FREQUENCY_HZ,
    SYSFS_GPIO_ROOT, SYSFS_PWM_ROOT,
};

/// Board wiring: BCM GPIO numbers and the PWM channels driving the servos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub led_left: u32,
    pub led_center: u32,
    pub led_right: u32,
    pub status_light: u32,
    pub button: u32,
    pub pwm_chip: u32,
    pub pwm_horizontal: u32,
    pub pwm_vertical: u32,
    pub pwm_frequency_hz: u32,
    pub gpio_root: PathBuf,
    pub pwm_root: PathBuf,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            led_left: LED_LEFT_PIN,
            led_center: LED_CENTER_PIN,
            led_right: LED_RIGHT_PIN,
            status_light: ON_LIGHT_PIN,
            button: BUTTON_PIN,
            pwm_chip: 0,
            pwm_horizontal: 0,
            pwm_vertical: 1,
            pwm_frequency_hz: SERVO_FREQUENCY_HZ,
            gpio_root: PathBuf::from(SYSFS_GPIO_ROOT),
            pwm_root: PathBuf::from(SYSFS_PWM_ROOT),
        }
    }
}

impl PinConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gpio = [
            ("led_left", self.led_left),
            ("led_center", self.led_center),
            ("led_right", self.led_right),
            ("status_light", self.status_light),
            ("button", self.button),
        ];
        for (i, (name, pin)) in gpio.iter().enumerate() {
            if let Some((other, _)) = gpio[i + 1..].iter().find(|(_, p)| p == pin) {
                return Err(ConfigError::Invalid(format!(
                    "GPIO {pin} assigned to both {name} and {other}"
                )));
            }
        }
        if self.pwm_horizontal == self.pwm_vertical {
            return Err(ConfigError::Invalid(format!(
                "Both servos assigned to PWM channel {}",
                self.pwm_horizontal
            )));
        }
        if self.pwm_frequency_hz == 0 {
            return Err(ConfigError::Invalid("PWM frequency must be positive".into()));
        }
        Ok(())
    }
}

/// Contents of the `--config` file. Missing sections fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tracking: TrackerConfig,
    pub pins: PinConfig,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracking.validate()?;
        self.pins.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_pins_match_board_wiring() {
        let pins = PinConfig::default();
        assert_eq!((pins.led_left, pins.led_center, pins.led_right), (16, 20, 21));
        assert_eq!(pins.status_light, 23);
        assert_eq!(pins.button, 22);
        assert_eq!(pins.pwm_frequency_hz, 50);
        assert!(pins.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"pins": {{"led_center": 12}}, "tracking": {{"frame": {{"height": 200}}}}}}"#
        )
        .unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.pins.led_center, 12);
        assert_eq!(settings.pins.led_left, 16);
        assert_eq!(settings.tracking.frame.height, 200);
        assert_eq!(settings.tracking.frame.width, 320);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load(Path::new("/nonexistent/facefollow.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2").unwrap();
        let err = Settings::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_duplicate_gpio_rejected() {
        let pins = PinConfig {
            button: 16,
            ..PinConfig::default()
        };
        let err = pins.validate().unwrap_err();
        assert!(err.to_string().contains("GPIO 16"));
    }

    #[test]
    fn test_shared_pwm_channel_rejected() {
        let pins = PinConfig {
            pwm_vertical: 0,
            ..PinConfig::default()
        };
        assert!(pins.validate().is_err());
    }

    #[test]
    fn test_settings_validate_checks_tracking() {
        let mut settings = Settings::default();
        settings.tracking.gimbal.horizontal.step = 0;
        assert!(settings.validate().is_err());
    }
}
