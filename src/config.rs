//! Camera configuration pushed to the device as one batch.

use serde::{Deserialize, Serialize};

/// Changes that can be applied while streaming.
pub const LEVEL_RECONFIGURE_RUNNING: u32 = 0;
/// Changes that need the acquisition engine stopped (image format, ROI).
pub const LEVEL_RECONFIGURE_STOP: u32 = 1;
/// Changes that need the device to be reopened.
pub const LEVEL_RECONFIGURE_CLOSE: u32 = 3;

/// Whether a reconfiguration at `level` needs the stream cycled.
pub const fn requires_stream_restart(level: u32) -> bool {
    level >= LEVEL_RECONFIGURE_STOP
}

/// GenICam automatic-control mode (`ExposureAuto`, `GainAuto`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AutoMode {
    /// Manual control.
    Off,
    /// Adjust once, then hold.
    Once,
    /// Adjust continuously.
    #[default]
    Continuous,
}

impl AutoMode {
    /// Enumeration entry name used by the device.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Once => "Once",
            Self::Continuous => "Continuous",
        }
    }
}

/// Desired device state.
///
/// A snapshot: nothing here is read back from the device. Enumeration-valued
/// fields hold the device's entry names (e.g. `"Line0"`, `"RisingEdge"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct CameraConfig {
    /// Target frame rate in Hz.
    pub acquisition_frame_rate: f64,
    /// Whether the frame rate limit is enforced.
    pub acquisition_frame_rate_enable: bool,

    /// Whether triggering is enabled.
    pub enable_trigger: bool,
    /// Trigger source (`Software`, `Line0`, ...).
    pub trigger_source: String,
    /// Trigger selector (`FrameStart`, ...).
    pub trigger_selector: String,
    /// Trigger activation (`RisingEdge`, ...).
    pub trigger_activation_mode: String,

    /// Digital line to configure.
    pub line_selector: String,
    /// Line direction (`Input`, `Output`).
    pub line_mode: String,
    /// Signal routed to an output line.
    pub line_source: String,

    /// Exposure mode (`Timed`, `TriggerWidth`).
    pub exposure_mode: String,
    /// Auto exposure mode.
    pub exposure_auto: AutoMode,
    /// Exposure time in microseconds, used when auto exposure is off.
    pub exposure_time: f64,
    /// Upper exposure limit in microseconds for auto exposure.
    pub auto_exposure_time_upper_limit: f64,

    /// Gain selector (`All`, ...).
    pub gain_selector: String,
    /// Auto gain mode.
    pub auto_gain: AutoMode,
    /// Gain in dB, used when auto gain is off.
    pub gain: f64,

    /// Black level.
    pub brightness: f64,

    /// Whether gamma correction is enabled.
    pub gamma_enable: bool,
    /// Gamma value.
    pub gamma: f64,

    /// Whether sharpening is enabled.
    pub sharpening_enable: bool,
    /// Whether the sharpening amount is chosen by the device.
    pub auto_sharpness: bool,
    /// Sharpening amount.
    pub sharpness: f64,
    /// Sharpening threshold.
    pub sharpening_threshold: f64,

    /// Whether saturation control is enabled.
    pub saturation_enable: bool,
    /// Saturation amount.
    pub saturation: f64,

    /// Auto white balance mode.
    pub auto_white_balance: AutoMode,
    /// Blue balance ratio, used when auto white balance is off.
    pub white_balance_blue_ratio: f64,
    /// Red balance ratio, used when auto white balance is off.
    pub white_balance_red_ratio: f64,

    /// Horizontal binning factor.
    pub image_format_x_binning: i32,
    /// Vertical binning factor.
    pub image_format_y_binning: i32,
    /// Horizontal decimation factor.
    pub image_format_x_decimation: i32,
    /// Vertical decimation factor.
    pub image_format_y_decimation: i32,
    /// ROI width; 0 or out of range selects the full width.
    pub image_format_roi_width: i32,
    /// ROI height; 0 or out of range selects the full height.
    pub image_format_roi_height: i32,
    /// ROI horizontal offset.
    pub image_format_x_offset: i32,
    /// ROI vertical offset.
    pub image_format_y_offset: i32,
    /// Pixel format entry name (`BayerRG8`, `Mono16`, ...).
    pub pixel_format: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            acquisition_frame_rate: 30.0,
            acquisition_frame_rate_enable: true,
            enable_trigger: false,
            trigger_source: "Software".to_owned(),
            trigger_selector: "FrameStart".to_owned(),
            trigger_activation_mode: "RisingEdge".to_owned(),
            line_selector: "Line0".to_owned(),
            line_mode: "Input".to_owned(),
            line_source: "ExposureActive".to_owned(),
            exposure_mode: "Timed".to_owned(),
            exposure_auto: AutoMode::Continuous,
            exposure_time: 100.0,
            auto_exposure_time_upper_limit: 5000.0,
            gain_selector: "All".to_owned(),
            auto_gain: AutoMode::Continuous,
            gain: 0.0,
            brightness: 0.0,
            gamma_enable: false,
            gamma: 1.0,
            sharpening_enable: false,
            auto_sharpness: false,
            sharpness: 1.0,
            sharpening_threshold: 0.25,
            saturation_enable: false,
            saturation: 1.0,
            auto_white_balance: AutoMode::Continuous,
            white_balance_blue_ratio: 800.0,
            white_balance_red_ratio: 550.0,
            image_format_x_binning: 1,
            image_format_y_binning: 1,
            image_format_x_decimation: 1,
            image_format_y_decimation: 1,
            image_format_roi_width: 0,
            image_format_roi_height: 0,
            image_format_x_offset: 0,
            image_format_y_offset: 0,
            pixel_format: "BayerRG8".to_owned(),
        }
    }
}

impl CameraConfig {
    /// Parse a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// `TriggerMode` entry matching [`enable_trigger`](Self::enable_trigger).
    pub const fn trigger_mode(&self) -> &'static str {
        if self.enable_trigger {
            "On"
        } else {
            "Off"
        }
    }
}
