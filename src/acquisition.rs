//! Stream state machine on top of a [`Connection`].
//!
//! Nothing in here locks; [`Camera`](crate::Camera) serializes every call.

use std::time::Duration;

use tracing::debug;

use crate::config::{requires_stream_restart, CameraConfig};
use crate::connection::Connection;
use crate::decode::{decode, OutputImage};
use crate::error::{CameraError, Result};
use crate::settings::DriverSettings;
use crate::traits::{CameraSystem, DeviceHandle};

/// Whether the device is acquiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// Not acquiring.
    #[default]
    Stopped,
    /// Acquiring; frames can be grabbed.
    Running,
}

/// Connection plus stream state and the per-camera settings that affect them.
pub struct Acquisition<S: CameraSystem> {
    connection: Connection<S>,
    state: StreamState,
    enable_frame_checking: bool,
    frame_rate_override: Option<f64>,
    frame_id: String,
}

impl<S: CameraSystem> Acquisition<S> {
    /// Create a disconnected, stopped controller.
    pub fn new(system: S, settings: &DriverSettings) -> Self {
        Self {
            connection: Connection::new(system, settings.serial),
            state: StreamState::Stopped,
            enable_frame_checking: settings.enable_frame_checking,
            frame_rate_override: settings.frame_rate_override,
            frame_id: settings.frame_id.clone(),
        }
    }

    /// Underlying connection.
    pub const fn connection(&self) -> &Connection<S> {
        &self.connection
    }

    /// Underlying connection, mutably.
    pub fn connection_mut(&mut self) -> &mut Connection<S> {
        &mut self.connection
    }

    /// Current stream state.
    pub const fn state(&self) -> StreamState {
        self.state
    }

    /// Begin acquisition. Does nothing when running or not connected.
    pub fn start(&mut self) -> Result<()> {
        if self.state == StreamState::Running || !self.connection.is_connected() {
            return Ok(());
        }
        self.connection
            .device_mut()?
            .begin_acquisition()
            .map_err(CameraError::AcquisitionStartFailed)?;
        self.state = StreamState::Running;
        debug!(serial = self.connection.serial(), "acquisition started");
        Ok(())
    }

    /// End acquisition. Does nothing when stopped.
    ///
    /// The state is `Stopped` afterwards even if the device refused.
    pub fn stop(&mut self) -> Result<()> {
        if self.state == StreamState::Stopped {
            return Ok(());
        }
        self.state = StreamState::Stopped;

        let Ok(device) = self.connection.device_mut() else {
            return Ok(());
        };
        device
            .end_acquisition()
            .map_err(CameraError::AcquisitionStopFailed)?;
        debug!(serial = self.connection.serial(), "acquisition stopped");
        Ok(())
    }

    /// Connect if needed, then write `config` to the device.
    ///
    /// Levels that need a stream restart cycle acquisition around the writes
    /// and leave the stream in the state it was found in.
    pub fn apply_configuration(&mut self, config: &CameraConfig, level: u32) -> Result<()> {
        if !self.connection.is_connected() {
            self.connection.connect()?;
        }

        if requires_stream_restart(level) {
            let was_running = self.state == StreamState::Running;
            // Image format nodes are locked while the device acquires.
            self.start()?;
            self.stop()?;
            let configured = self
                .connection
                .configure(config, level, self.frame_rate_override);
            // A failed write still leaves the stream as it was found.
            if was_running {
                let restarted = self.start();
                configured?;
                restarted?;
            } else {
                configured?;
            }
        } else {
            self.connection
                .configure(config, level, self.frame_rate_override)?;
        }
        debug!(level, "configuration applied");
        Ok(())
    }

    /// Retrieve and decode the next frame, waiting up to `timeout`.
    pub fn grab_frame(&mut self, timeout: Duration) -> Result<OutputImage> {
        if !self.connection.is_connected() {
            return Err(CameraError::NotConnected);
        }
        if self.state == StreamState::Stopped {
            return Err(CameraError::NotStreaming);
        }

        let serial = self.connection.serial();
        let frame = self
            .connection
            .device_mut()?
            .next_frame(timeout)
            .map_err(CameraError::FrameRetrievalFailed)?;

        if frame.incomplete {
            if self.enable_frame_checking {
                return Err(CameraError::IncompleteFrame { serial });
            }
            debug!(serial, frame_number = frame.frame_number, "passing incomplete frame through");
        }
        decode(&frame, &self.frame_id)
    }

    /// Stop streaming and release the device. Does nothing when not connected.
    pub fn disconnect(&mut self) -> Result<()> {
        let stopped = self.stop();
        let released = self.connection.disconnect();
        stopped.and(released)
    }
}
