pub mod logging_outputs;
pub mod sysfs_gpio;
pub mod sysfs_pwm;
