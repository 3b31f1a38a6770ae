//! mv-cam-driver: a machine-vision camera driver core.
//!
//! The driver connects to a camera by serial number, pushes a configuration
//! snapshot to it through a model-specific policy, runs the acquisition state
//! machine and turns raw device buffers into [`OutputImage`]s. The device SDK
//! sits behind the traits in [`traits`], so the same driver runs against real
//! hardware (the `v4l2` feature) or the test mock.

pub mod acquisition;
pub mod camera;
pub mod config;
pub mod connection;
pub mod decode;
pub mod error;
pub mod model;
pub mod property;
pub mod settings;
pub mod traits;
pub mod validation;

#[cfg(feature = "v4l2")]
pub mod device;

#[cfg(test)]
pub mod mock;

pub use acquisition::StreamState;
pub use camera::Camera;
pub use config::{
    AutoMode, CameraConfig, LEVEL_RECONFIGURE_CLOSE, LEVEL_RECONFIGURE_RUNNING, LEVEL_RECONFIGURE_STOP,
};
pub use decode::{OutputImage, PixelEncoding, Timestamp};
pub use error::{CameraError, ErrorCategory, Result, SdkError};
pub use model::DeviceModel;
pub use settings::{DriverSettings, SettingsError};
pub use traits::{AccessMode, CameraSystem, DeviceHandle, NodeMap, NodeValue, RawFrame};

#[cfg(feature = "v4l2")]
pub use device::{V4l2Device, V4l2System};
