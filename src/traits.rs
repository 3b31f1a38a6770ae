//! Device SDK boundary: the traits a camera backend implements.
//!
//! The driver talks to hardware only through these traits. A backend maps
//! its native enumeration, node map and buffer API onto them and converts
//! its errors into [`SdkError`](crate::error::SdkError).

use std::time::Duration;

use crate::error::SdkResult;

/// Access mode of a node in a device node map.
///
/// Mirrors the GenICam access modes; a node's mode can change with device
/// state (e.g. image format nodes become read-only while streaming).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// The node does not exist on this device.
    NotImplemented,
    /// The node exists but is currently unavailable.
    NotAvailable,
    /// The node can only be read.
    ReadOnly,
    /// The node can only be written.
    WriteOnly,
    /// The node can be read and written.
    ReadWrite,
}

impl AccessMode {
    /// Whether the node exists and is currently available.
    pub const fn is_available(self) -> bool {
        matches!(self, Self::ReadOnly | Self::WriteOnly | Self::ReadWrite)
    }

    /// Whether the node can currently be read.
    pub const fn is_readable(self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadWrite)
    }

    /// Whether the node can currently be written.
    pub const fn is_writable(self) -> bool {
        matches!(self, Self::WriteOnly | Self::ReadWrite)
    }
}

/// Value held by a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// Integer node.
    Integer(i64),
    /// Float node.
    Float(f64),
    /// Boolean node.
    Boolean(bool),
    /// String node, or the symbolic name of an enumeration entry.
    Text(String),
}

impl NodeValue {
    /// Short name of the value kind, for diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::Text(_) => "text",
        }
    }
}

/// Named property registry of a device.
pub trait NodeMap {
    /// Current access mode of `name`.
    fn access(&self, name: &str) -> AccessMode;

    /// Read the current value of `name`.
    fn value(&self, name: &str) -> SdkResult<NodeValue>;

    /// Write `value` to `name`.
    fn set_value(&mut self, name: &str, value: NodeValue) -> SdkResult<()>;

    /// Minimum and maximum of an integer node.
    fn int_bounds(&self, name: &str) -> SdkResult<(i64, i64)>;

    /// Minimum and maximum of a float node.
    fn float_bounds(&self, name: &str) -> SdkResult<(f64, f64)>;
}

/// One buffer retrieved from a streaming device.
///
/// The pixel data and colour filter tag are borrowed from the device and
/// stay valid only until the next retrieval.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    /// Pixel payload.
    pub data: &'a [u8],
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Bytes per line.
    pub stride: u32,
    /// Bits per pixel of the payload.
    pub bits_per_pixel: u32,
    /// Colour filter tag (e.g. `BayerRG`), `None` for mono sensors.
    pub color_filter: Option<&'a str>,
    /// Device timestamp in nanoseconds.
    pub timestamp_ns: u64,
    /// Frame counter reported by the device.
    pub frame_number: u64,
    /// Whether the device flagged the buffer as incomplete.
    pub incomplete: bool,
}

/// An opened, not necessarily initialized, physical device.
pub trait DeviceHandle {
    /// Node map type exposed by the device.
    type NodeMap: NodeMap;

    /// Whether the handle still refers to a present device.
    fn is_valid(&self) -> bool;

    /// Transport-layer node map (`DeviceID`, `DeviceType`, `DeviceCurrentSpeed`).
    ///
    /// Readable before [`init`](Self::init).
    fn transport_node_map(&self) -> &Self::NodeMap;

    /// Initialize the device so its node map becomes usable.
    fn init(&mut self) -> SdkResult<()>;

    /// Release the device's resources. The handle may be initialized again.
    fn deinit(&mut self) -> SdkResult<()>;

    /// Device node map. Only meaningful after [`init`](Self::init).
    fn node_map(&self) -> &Self::NodeMap;

    /// Mutable device node map.
    fn node_map_mut(&mut self) -> &mut Self::NodeMap;

    /// Begin streaming.
    fn begin_acquisition(&mut self) -> SdkResult<()>;

    /// End streaming.
    fn end_acquisition(&mut self) -> SdkResult<()>;

    /// Block until the next buffer arrives or `timeout` expires.
    fn next_frame(&mut self, timeout: Duration) -> SdkResult<RawFrame<'_>>;
}

/// Entry point of a device SDK: enumerates and hands out devices.
pub trait CameraSystem {
    /// Device handle type produced by this system.
    type Device: DeviceHandle;

    /// Number of devices in the enumeration cache.
    fn device_count(&self) -> usize;

    /// Acquire the device at `index` in the enumeration cache.
    fn device_by_index(&mut self, index: usize) -> SdkResult<Self::Device>;

    /// Acquire the device whose serial number is `serial`.
    fn device_by_serial(&mut self, serial: &str) -> SdkResult<Self::Device>;

    /// Drop the device with `serial` from the enumeration cache.
    fn remove_by_serial(&mut self, serial: &str) -> SdkResult<()>;

    /// Re-enumerate devices and merge them into the cache.
    fn refresh(&mut self) -> SdkResult<()>;
}
