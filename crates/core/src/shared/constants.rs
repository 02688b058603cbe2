/// Model-frame size the detector sees; offsets are measured in these pixels.
pub const FRAME_MODEL_WIDTH: u32 = 320;
pub const FRAME_MODEL_HEIGHT: u32 = 320;

/// Half-width of the center zone for the status lights.
pub const CENTER_SIZE_PX: f64 = 15.0;

pub const CENTER_TOLERANCE_X: f64 = 30.0;
pub const CENTER_TOLERANCE_Y: f64 = 30.0;

/// Servo pulse-width bounds in microseconds.
pub const SERVO_MIN: u32 = 500;
pub const SERVO_MAX: u32 = 2500;
pub const SERVO_START_X: u32 = 1300;
pub const SERVO_START_Y: u32 = 800;
pub const SERVO_INCREMENT_X: u32 = 20;
pub const SERVO_INCREMENT_Y: u32 = 20;

/// Standard hobby-servo refresh rate.
pub const SERVO_FREQUENCY_HZ: u32 = 50;

// BCM pin numbers on the reference board.
pub const LED_LEFT_PIN: u32 = 16;
pub const LED_CENTER_PIN: u32 = 20;
pub const LED_RIGHT_PIN: u32 = 21;
pub const BUTTON_PIN: u32 = 22;
pub const ON_LIGHT_PIN: u32 = 23;

pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";
pub const SYSFS_PWM_ROOT: &str = "/sys/class/pwm";

/// RGB colors for annotated boxes.
pub const PRIMARY_BOX_COLOR: [u8; 3] = [0, 255, 0];
pub const SECONDARY_BOX_COLOR: [u8; 3] = [255, 0, 0];
pub const BOX_THICKNESS_PX: u32 = 2;
