//! Thread-safe camera facade.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::acquisition::{Acquisition, StreamState};
use crate::config::CameraConfig;
use crate::decode::OutputImage;
use crate::error::Result;
use crate::model::DeviceModel;
use crate::settings::DriverSettings;
use crate::traits::CameraSystem;

/// A camera shared between a configuration thread and a grab thread.
///
/// Every device-touching call takes one internal lock, so a grab blocks
/// configuration for at most the grab timeout. The timeout itself is kept
/// outside the lock and applies from the next grab.
pub struct Camera<S: CameraSystem> {
    inner: Mutex<Acquisition<S>>,
    timeout_ms: AtomicU64,
}

impl<S: CameraSystem> Camera<S> {
    /// Create a disconnected camera. Nothing is opened until
    /// [`connect`](Self::connect) or [`apply_configuration`](Self::apply_configuration).
    pub fn new(system: S, settings: &DriverSettings) -> Self {
        Self {
            inner: Mutex::new(Acquisition::new(system, settings)),
            timeout_ms: AtomicU64::new(settings.timeout_ms),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Acquisition<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open and initialize the camera. Does nothing when already connected.
    pub fn connect(&self) -> Result<()> {
        self.lock().connection_mut().connect()
    }

    /// Stop streaming and release the camera. Does nothing when not connected.
    pub fn disconnect(&self) -> Result<()> {
        self.lock().disconnect()
    }

    /// Begin acquisition. Does nothing when running or not connected.
    pub fn start(&self) -> Result<()> {
        self.lock().start()
    }

    /// End acquisition. Does nothing when stopped.
    pub fn stop(&self) -> Result<()> {
        self.lock().stop()
    }

    /// Connect if needed and write `config` at reconfiguration `level`.
    pub fn apply_configuration(&self, config: &CameraConfig, level: u32) -> Result<()> {
        self.lock().apply_configuration(config, level)
    }

    /// Wait for the next frame and decode it.
    pub fn grab_frame(&self) -> Result<OutputImage> {
        let timeout = self.timeout();
        self.lock().grab_frame(timeout)
    }

    /// Change the grab timeout.
    #[allow(clippy::cast_possible_truncation)]
    pub fn set_timeout(&self, timeout: Duration) {
        let millis = timeout.as_millis().min(u128::from(u64::MAX)) as u64;
        self.timeout_ms.store(millis, Ordering::Relaxed);
    }

    /// Current grab timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.load(Ordering::Relaxed))
    }

    /// Switch to manual gain and write `gain` in dB.
    pub fn set_gain(&self, gain: f64) -> Result<()> {
        self.lock().connection_mut().set_gain(gain)
    }

    /// Maximum image width at the current binning/decimation.
    pub fn width_max(&self) -> Result<i64> {
        self.lock().connection().width_max()
    }

    /// Maximum image height at the current binning/decimation.
    pub fn height_max(&self) -> Result<i64> {
        self.lock().connection().height_max()
    }

    /// Current value of device node `name` rendered as text.
    pub fn read_property(&self, name: &str) -> Result<String> {
        self.lock().connection().read_property(name)
    }

    /// Current stream state.
    pub fn stream_state(&self) -> StreamState {
        self.lock().state()
    }

    /// Whether a device is connected.
    pub fn is_connected(&self) -> bool {
        self.lock().connection().is_connected()
    }

    /// Serial in use, populated on connect when configured as 0.
    pub fn serial(&self) -> u32 {
        self.lock().connection().serial()
    }

    /// Family of the connected camera.
    pub fn model(&self) -> Option<DeviceModel> {
        self.lock().connection().model()
    }
}
