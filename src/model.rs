//! Per-family configuration policy.
//!
//! Camera families share one configuration sequence but differ in node names
//! and in which optional features they expose. The family is picked once at
//! connect time from `DeviceModelName`.

use tracing::{debug, warn};

use crate::config::{requires_stream_restart, AutoMode, CameraConfig};
use crate::error::Result;
use crate::property::{self, get, is_available, set};
use crate::traits::NodeMap;

const BLACKFLY_S: &str = "Blackfly S";
const CHAMELEON3: &str = "Chameleon3";

/// Camera family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceModel {
    /// Blackfly S, and the fallback for unrecognized models.
    Generic,
    /// Chameleon3 (older SFNC node names, no exposure mode or gain selector).
    Chameleon3,
}

/// Sharpening nodes of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharpeningNodes {
    /// Boolean enabling sharpening; probed for availability.
    pub enable: &'static str,
    /// Boolean selecting automatic sharpening.
    pub auto: &'static str,
    /// Sharpening amount.
    pub value: &'static str,
    /// Sharpening threshold, if the family has one.
    pub threshold: Option<&'static str>,
}

/// Node names and optional features of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelPolicy {
    /// Boolean enabling the frame rate limit.
    pub frame_rate_enable: &'static str,
    /// Auto frame rate node forced to `Off`, if present on the family.
    pub frame_rate_auto: Option<&'static str>,
    /// Exposure mode node, if the family has one.
    pub exposure_mode: Option<&'static str>,
    /// Upper exposure limit used while auto exposure runs.
    pub auto_exposure_upper_limit: &'static str,
    /// Gain selector node, if the family has one.
    pub gain_selector: Option<&'static str>,
    /// Sharpening nodes.
    pub sharpening: SharpeningNodes,
    /// Boolean enabling saturation; probed for availability.
    pub saturation_enable: &'static str,
    /// Boolean enabling gamma correction.
    pub gamma_enable: &'static str,
}

const GENERIC_POLICY: ModelPolicy = ModelPolicy {
    frame_rate_enable: "AcquisitionFrameRateEnable",
    frame_rate_auto: None,
    exposure_mode: Some("ExposureMode"),
    auto_exposure_upper_limit: "AutoExposureExposureTimeUpperLimit",
    gain_selector: Some("GainSelector"),
    sharpening: SharpeningNodes {
        enable: "SharpeningEnable",
        auto: "SharpeningAuto",
        value: "Sharpening",
        threshold: Some("SharpeningThreshold"),
    },
    saturation_enable: "SaturationEnable",
    gamma_enable: "GammaEnable",
};

const CHAMELEON3_POLICY: ModelPolicy = ModelPolicy {
    frame_rate_enable: "AcquisitionFrameRateEnabled",
    frame_rate_auto: Some("AcquisitionFrameRateAuto"),
    exposure_mode: None,
    auto_exposure_upper_limit: "AutoExposureTimeUpperLimit",
    gain_selector: None,
    sharpening: SharpeningNodes {
        enable: "SharpnessEnabled",
        auto: "SharpnessAuto",
        value: "Sharpness",
        threshold: None,
    },
    saturation_enable: "SaturationEnabled",
    gamma_enable: "GammaEnabled",
};

impl DeviceModel {
    /// Pick the family for a `DeviceModelName` value.
    ///
    /// Returns `None` when no family matched; callers fall back to
    /// [`DeviceModel::Generic`].
    pub fn detect(model_name: &str) -> Option<Self> {
        if model_name.contains(BLACKFLY_S) {
            Some(Self::Generic)
        } else if model_name.contains(CHAMELEON3) {
            Some(Self::Chameleon3)
        } else {
            None
        }
    }

    /// Pick the family, falling back to [`DeviceModel::Generic`] with a warning.
    pub fn from_model_name(model_name: &str) -> Self {
        Self::detect(model_name).unwrap_or_else(|| {
            warn!(model_name, "could not detect camera model, using generic configuration");
            Self::Generic
        })
    }

    /// Node names and optional features of this family.
    pub const fn policy(self) -> &'static ModelPolicy {
        match self {
            Self::Generic => &GENERIC_POLICY,
            Self::Chameleon3 => &CHAMELEON3_POLICY,
        }
    }
}

/// Device model bound to a connected camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDriver {
    model: DeviceModel,
    width_max: i64,
    height_max: i64,
}

impl ModelDriver {
    /// Read sensor limits and raise the link throughput limit to its maximum.
    pub fn init<M: NodeMap + ?Sized>(model: DeviceModel, map: &mut M) -> Result<Self> {
        let mut driver = Self {
            model,
            width_max: 0,
            height_max: 0,
        };
        driver.read_max_size(&*map)?;

        if is_available(&*map, "DeviceLinkThroughputLimit") {
            let limit = property::set_to_max(map, "DeviceLinkThroughputLimit")?;
            debug!(limit, "device link throughput limit set to maximum");
        }
        Ok(driver)
    }

    /// Camera family.
    pub const fn model(&self) -> DeviceModel {
        self.model
    }

    /// Maximum image width at the current binning/decimation.
    pub const fn width_max(&self) -> i64 {
        self.width_max
    }

    /// Maximum image height at the current binning/decimation.
    pub const fn height_max(&self) -> i64 {
        self.height_max
    }

    fn read_max_size<M: NodeMap + ?Sized>(&mut self, map: &M) -> Result<()> {
        self.height_max = get(map, "HeightMax")?;
        self.width_max = get(map, "WidthMax")?;
        Ok(())
    }

    /// Write `config` to the device.
    ///
    /// Image format nodes are only written when `level` requires a stream
    /// restart; the caller is responsible for having stopped acquisition.
    pub fn apply<M: NodeMap + ?Sized>(
        &mut self,
        map: &mut M,
        config: &CameraConfig,
        level: u32,
        frame_rate_override: Option<f64>,
    ) -> Result<()> {
        let policy = self.model.policy();

        if requires_stream_restart(level) {
            self.apply_image_format(map, config)?;
        }

        set_frame_rate(map, policy, config.acquisition_frame_rate)?;
        set(map, policy.frame_rate_enable, config.acquisition_frame_rate_enable)?;

        // Trigger source can only be changed while the trigger is off.
        set(map, "TriggerMode", "Off")?;
        set(map, "TriggerSource", config.trigger_source.as_str())?;
        set(map, "TriggerSelector", config.trigger_selector.as_str())?;
        set(map, "TriggerActivation", config.trigger_activation_mode.as_str())?;
        set(map, "TriggerMode", config.trigger_mode())?;

        set(map, "LineSelector", config.line_selector.as_str())?;
        set(map, "LineMode", config.line_mode.as_str())?;
        set(map, "LineSource", config.line_source.as_str())?;

        if let Some(node) = policy.exposure_mode {
            set(map, node, config.exposure_mode.as_str())?;
        }
        set(map, "ExposureAuto", config.exposure_auto.as_str())?;

        let sharpening = &policy.sharpening;
        if is_available(&*map, sharpening.enable) {
            set(map, sharpening.enable, config.sharpening_enable)?;
            if config.sharpening_enable {
                set(map, sharpening.auto, config.auto_sharpness)?;
                set(map, sharpening.value, config.sharpness)?;
                if let Some(node) = sharpening.threshold {
                    set(map, node, config.sharpening_threshold)?;
                }
            }
        }

        if is_available(&*map, policy.saturation_enable) {
            set(map, policy.saturation_enable, config.saturation_enable)?;
            if config.saturation_enable {
                set(map, "Saturation", config.saturation)?;
            }
        }

        if config.exposure_auto == AutoMode::Off {
            set(map, "ExposureTime", config.exposure_time)?;
        } else {
            set(
                map,
                policy.auto_exposure_upper_limit,
                config.auto_exposure_time_upper_limit,
            )?;
        }

        if let Some(node) = policy.gain_selector {
            set(map, node, config.gain_selector.as_str())?;
        }
        set(map, "GainAuto", config.auto_gain.as_str())?;
        if config.auto_gain == AutoMode::Off {
            set(map, "Gain", config.gain)?;
        }

        set(map, "BlackLevel", config.brightness)?;

        if config.gamma_enable {
            set(map, policy.gamma_enable, true)?;
            set(map, "Gamma", config.gamma)?;
        }

        if is_available(&*map, "BalanceWhiteAuto") {
            set(map, "BalanceWhiteAuto", config.auto_white_balance.as_str())?;
            if config.auto_white_balance == AutoMode::Off {
                set(map, "BalanceRatioSelector", "Blue")?;
                set(map, "BalanceRatio", config.white_balance_blue_ratio)?;
                set(map, "BalanceRatioSelector", "Red")?;
                set(map, "BalanceRatio", config.white_balance_red_ratio)?;
            }
        }

        if let Some(rate) = frame_rate_override.filter(|rate| *rate > 0.0) {
            set_frame_rate(map, policy, rate)?;
        }
        Ok(())
    }

    fn apply_image_format<M: NodeMap + ?Sized>(&mut self, map: &mut M, config: &CameraConfig) -> Result<()> {
        set(map, "BinningHorizontal", config.image_format_x_binning)?;
        set(map, "BinningVertical", config.image_format_y_binning)?;
        set(map, "DecimationHorizontal", config.image_format_x_decimation)?;
        set(map, "DecimationVertical", config.image_format_y_decimation)?;

        // Limits change with binning and decimation.
        self.read_max_size(&*map)?;

        // Offsets first in case the ROI grows.
        set(map, "OffsetX", 0i64)?;
        set(map, "OffsetY", 0i64)?;
        set(map, "Width", clamp_roi(config.image_format_roi_width, self.width_max))?;
        set(map, "Height", clamp_roi(config.image_format_roi_height, self.height_max))?;
        set(map, "OffsetX", config.image_format_x_offset)?;
        set(map, "OffsetY", config.image_format_y_offset)?;

        set(map, "PixelFormat", config.pixel_format.as_str())?;
        debug!(
            width_max = self.width_max,
            height_max = self.height_max,
            pixel_format = %config.pixel_format,
            "image format applied"
        );
        Ok(())
    }

    /// Switch to manual gain and write `gain`.
    pub fn set_gain<M: NodeMap + ?Sized>(&self, map: &mut M, gain: f64) -> Result<()> {
        set(map, "GainAuto", AutoMode::Off.as_str())?;
        set(map, "Gain", gain)
    }
}

fn clamp_roi(requested: i32, max: i64) -> i64 {
    let requested = i64::from(requested);
    if requested <= 0 || requested > max {
        max
    } else {
        requested
    }
}

fn set_frame_rate<M: NodeMap + ?Sized>(map: &mut M, policy: &ModelPolicy, rate: f64) -> Result<()> {
    set(map, policy.frame_rate_enable, true)?;
    if let Some(node) = policy.frame_rate_auto {
        set(map, node, AutoMode::Off.as_str())?;
    }
    if let Ok((min, max)) = map.float_bounds("AcquisitionFrameRate") {
        debug!(min, max, requested = rate, "acquisition frame rate limits");
    }
    set(map, "AcquisitionFrameRate", rate)
}
