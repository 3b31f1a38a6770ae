//! Device selection, initialization and teardown.

use tracing::{debug, info, warn};

use crate::config::CameraConfig;
use crate::error::{CameraError, Result};
use crate::model::{DeviceModel, ModelDriver};
use crate::property::{self, get};
use crate::traits::{CameraSystem, DeviceHandle};

const USB3_VISION: &str = "U3V";
const SUPER_SPEED: &str = "SuperSpeed";

/// Whether a device of `device_type` linked at `speed` is running below its
/// rated bandwidth.
fn is_slow_link(device_type: &str, speed: &str) -> bool {
    device_type == USB3_VISION && speed != SUPER_SPEED
}

/// Owns the SDK system and, while connected, the device handle and its model.
pub struct Connection<S: CameraSystem> {
    system: S,
    serial: u32,
    device: Option<S::Device>,
    model: Option<ModelDriver>,
}

impl<S: CameraSystem> Connection<S> {
    /// Create a disconnected connection for `serial` (0 = first camera found).
    pub const fn new(system: S, serial: u32) -> Self {
        Self {
            system,
            serial,
            device: None,
            model: None,
        }
    }

    /// Serial in use. Populated from the device when connecting with serial 0.
    pub const fn serial(&self) -> u32 {
        self.serial
    }

    /// Whether a device handle is held.
    pub const fn is_connected(&self) -> bool {
        self.device.is_some()
    }

    /// Family of the connected camera.
    pub fn model(&self) -> Option<DeviceModel> {
        self.model.as_ref().map(ModelDriver::model)
    }

    /// Open and initialize the camera. Does nothing when already connected.
    pub fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let count = self.system.device_count();
        info!(count, "cameras detected");

        let mut device = self.select()?;
        self.identify(&device)?;

        device
            .init()
            .map_err(|err| CameraError::connection("initialize device", err))?;

        match init_model(&mut device) {
            Ok(model) => {
                debug!(serial = self.serial, model = ?model.model(), "camera connected");
                self.device = Some(device);
                self.model = Some(model);
                Ok(())
            }
            Err(err) => {
                if let Err(deinit) = device.deinit() {
                    warn!(error = %deinit, "failed to de-initialize camera after setup error");
                }
                Err(CameraError::connection("initialize device model", err))
            }
        }
    }

    fn select(&mut self) -> Result<S::Device> {
        let selected = if self.serial == 0 {
            self.system.device_by_index(0)
        } else {
            self.system.device_by_serial(&self.serial.to_string())
        };
        let device = selected.map_err(|err| CameraError::DeviceNotFound {
            serial: self.serial,
            source: Some(err),
        })?;
        if !device.is_valid() {
            return Err(CameraError::DeviceNotFound {
                serial: self.serial,
                source: None,
            });
        }
        Ok(device)
    }

    fn identify(&mut self, device: &S::Device) -> Result<()> {
        let transport = device.transport_node_map();

        if self.serial == 0 {
            let id: String = get(transport, "DeviceID")
                .map_err(|err| CameraError::connection("read device serial", err))?;
            self.serial = id
                .trim()
                .parse()
                .map_err(|err| CameraError::connection("parse device serial", err))?;
        }
        info!(serial = self.serial, "using camera");

        let Ok(device_type) = property::read_string(transport, "DeviceType") else {
            return Ok(());
        };
        info!(device_type = %device_type, "detected device type");

        if device_type == USB3_VISION {
            match property::read_string(transport, "DeviceCurrentSpeed") {
                Ok(speed) if !is_slow_link(&device_type, &speed) => {}
                Ok(speed) => warn!(speed = %speed, "USB 3 camera is not running at SuperSpeed, check the cable and port"),
                Err(err) => debug!(error = %err, "could not read USB link speed"),
            }
        }
        Ok(())
    }

    /// Release the device. Does nothing when not connected.
    ///
    /// The handle is dropped even when teardown fails, so [`connect`](Self::connect)
    /// can be retried.
    pub fn disconnect(&mut self) -> Result<()> {
        let Some(mut device) = self.device.take() else {
            return Ok(());
        };
        self.model = None;

        let deinit = device.deinit();
        drop(device);

        let serial = self.serial.to_string();
        let released = self
            .system
            .remove_by_serial(&serial)
            .and_then(|()| self.system.refresh());
        debug!(serial = self.serial, "camera released");

        deinit.and(released).map_err(CameraError::DisconnectionFailed)
    }

    pub(crate) fn device_mut(&mut self) -> Result<&mut S::Device> {
        self.device.as_mut().ok_or(CameraError::NotConnected)
    }

    fn parts(&mut self) -> Result<(&mut S::Device, &mut ModelDriver)> {
        match (self.device.as_mut(), self.model.as_mut()) {
            (Some(device), Some(model)) => Ok((device, model)),
            _ => Err(CameraError::NotConnected),
        }
    }

    /// Write `config` to the device through the camera's model.
    pub fn configure(&mut self, config: &CameraConfig, level: u32, frame_rate_override: Option<f64>) -> Result<()> {
        let (device, model) = self.parts()?;
        model.apply(device.node_map_mut(), config, level, frame_rate_override)
    }

    /// Switch to manual gain and write `gain` in dB.
    pub fn set_gain(&mut self, gain: f64) -> Result<()> {
        let (device, model) = self.parts()?;
        model.set_gain(device.node_map_mut(), gain)
    }

    /// Maximum image width at the current binning/decimation.
    pub fn width_max(&self) -> Result<i64> {
        self.model
            .as_ref()
            .map(ModelDriver::width_max)
            .ok_or(CameraError::NotConnected)
    }

    /// Maximum image height at the current binning/decimation.
    pub fn height_max(&self) -> Result<i64> {
        self.model
            .as_ref()
            .map(ModelDriver::height_max)
            .ok_or(CameraError::NotConnected)
    }

    /// Current value of device node `name` rendered as text.
    pub fn read_property(&self, name: &str) -> Result<String> {
        let device = self.device.as_ref().ok_or(CameraError::NotConnected)?;
        property::read_string(device.node_map(), name)
    }
}

fn init_model<D: DeviceHandle>(device: &mut D) -> Result<ModelDriver> {
    let model_name = property::read_string(device.node_map(), "DeviceModelName")?;
    info!(model_name = %model_name, "camera model");
    let model = DeviceModel::from_model_name(&model_name);
    ModelDriver::init(model, device.node_map_mut())
}
