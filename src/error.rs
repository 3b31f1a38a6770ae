//! Error types for the driver and the device SDK boundary.

use thiserror::Error;

/// Failure reported by the device SDK.
///
/// Backends convert their native error types into this at the boundary so
/// that nothing SDK-specific escapes the driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SdkError {
    message: String,
    code: Option<i32>,
}

impl SdkError {
    /// Create an SDK error from a message.
    pub fn new<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Attach the SDK's numeric error code.
    #[must_use]
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// The SDK's numeric error code, if it reported one.
    pub const fn code(&self) -> Option<i32> {
        self.code
    }

    /// The SDK's error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for SdkError {
    fn from(err: std::io::Error) -> Self {
        let code = err.raw_os_error();
        let sdk = Self::new(err.to_string());
        match code {
            Some(code) => sdk.with_code(code),
            None => sdk,
        }
    }
}

/// Result type for calls across the device SDK boundary.
pub type SdkResult<T> = std::result::Result<T, SdkError>;

/// Boxed cause carried by connection-level failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Broad classification of a [`CameraError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller asked for something the current state does not allow.
    Misuse,
    /// The device or its SDK failed, or reported data the driver cannot use.
    Device,
}

/// Error type for camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// No device matched the requested serial (0 = first available).
    #[error("could not find camera with serial {serial}")]
    DeviceNotFound {
        /// Requested serial, 0 when any camera was acceptable.
        serial: u32,
        /// SDK failure behind the lookup, if any.
        #[source]
        source: Option<SdkError>,
    },
    /// Enumeration, initialization or model setup failed.
    #[error("failed to connect to camera: {stage}")]
    ConnectionFailed {
        /// Step of the connect sequence that failed.
        stage: &'static str,
        /// Underlying cause.
        #[source]
        source: BoxError,
    },
    /// Tearing down the connection failed. The handle has been released.
    #[error("failed to disconnect camera")]
    DisconnectionFailed(#[source] SdkError),
    /// The device refused to begin acquisition.
    #[error("failed to start capture")]
    AcquisitionStartFailed(#[source] SdkError),
    /// The device refused to end acquisition.
    #[error("failed to stop capture")]
    AcquisitionStopFailed(#[source] SdkError),
    /// No device is connected.
    #[error("not connected to the camera")]
    NotConnected,
    /// The device is connected but not streaming.
    #[error("camera is not running, start capturing frames first")]
    NotStreaming,
    /// The device delivered a structurally incomplete frame.
    #[error("image received from camera {serial} is incomplete")]
    IncompleteFrame {
        /// Serial of the camera that produced the frame.
        serial: u32,
    },
    /// Retrieving the next buffer failed or timed out.
    #[error("failed to retrieve buffer")]
    FrameRetrievalFailed(#[source] SdkError),
    /// The colour filter tag is not one of the four bayer layouts.
    #[error("bayer format {filter:?} not recognized for {bits_per_pixel}-bit format")]
    UnrecognizedBayerFormat {
        /// Colour filter tag reported by the device.
        filter: String,
        /// Bits per pixel of the frame.
        bits_per_pixel: u32,
    },
    /// The property does not exist or cannot be read in the current state.
    #[error("property {name} is not available")]
    PropertyUnavailable {
        /// Node name.
        name: String,
    },
    /// The property exists but cannot be written in the current state.
    #[error("property {name} is not writable")]
    PropertyNotWritable {
        /// Node name.
        name: String,
    },
    /// The SDK rejected a read or write, or returned an unexpected value kind.
    #[error("failed to access property {name}")]
    PropertyAccessFailed {
        /// Node name.
        name: String,
        /// Underlying cause.
        #[source]
        source: SdkError,
    },
}

impl CameraError {
    /// Whether this error is a caller misuse or a device-side failure.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NotConnected | Self::NotStreaming => ErrorCategory::Misuse,
            _ => ErrorCategory::Device,
        }
    }

    pub(crate) fn connection<E: Into<BoxError>>(stage: &'static str, source: E) -> Self {
        Self::ConnectionFailed {
            stage,
            source: source.into(),
        }
    }
}

/// Result type for camera operations.
pub type Result<T> = std::result::Result<T, CameraError>;
