//! V4L2 backend using the v4l crate.
//!
//! Each `/dev/videoN` capture node is one camera with serial `N + 1`, keeping
//! serial 0 free for "first available". The
//! device node map exposes the V4L2 format, frame interval and a set of user
//! controls under their GenICam names. GenICam features V4L2 has no notion of
//! (binning, offsets, triggering) are emulated: selectors and line routing are
//! stored as written, everything else is pinned to its neutral value.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;
use v4l::buffer::{Flags as BufferFlags, Type};
use v4l::capability::Flags as CapabilityFlags;
use v4l::control::{Control, Description, Flags as ControlFlags, Value};
use v4l::framesize::FrameSizeEnum;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::{CaptureStream, Stream as _};
use v4l::video::capture::Parameters;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::error::{SdkError, SdkResult};
use crate::traits::{AccessMode, CameraSystem, DeviceHandle, NodeMap, NodeValue, RawFrame};

const BUFFER_COUNT: u32 = 4;

const V4L2_CID_BRIGHTNESS: u32 = 0x0098_0900;
const V4L2_CID_SATURATION: u32 = 0x0098_0902;
const V4L2_CID_AUTO_WHITE_BALANCE: u32 = 0x0098_090c;
const V4L2_CID_GAMMA: u32 = 0x0098_0910;
const V4L2_CID_AUTOGAIN: u32 = 0x0098_0912;
const V4L2_CID_GAIN: u32 = 0x0098_0913;
const V4L2_CID_SHARPNESS: u32 = 0x0098_091b;
const V4L2_CID_EXPOSURE_AUTO: u32 = 0x009a_0901;
const V4L2_CID_EXPOSURE_ABSOLUTE: u32 = 0x009a_0902;

const V4L2_EXPOSURE_MANUAL: i64 = 1;
const V4L2_EXPOSURE_APERTURE_PRIORITY: i64 = 3;

/// A V4L2 pixel format and its GenICam name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelFormat {
    name: &'static str,
    fourcc: &'static [u8; 4],
    bits_per_pixel: u32,
    color_filter: Option<&'static str>,
}

const fn pixel_format(
    name: &'static str,
    fourcc: &'static [u8; 4],
    bits_per_pixel: u32,
    color_filter: Option<&'static str>,
) -> PixelFormat {
    PixelFormat {
        name,
        fourcc,
        bits_per_pixel,
        color_filter,
    }
}

const PIXEL_FORMATS: &[PixelFormat] = &[
    pixel_format("Mono8", b"GREY", 8, None),
    pixel_format("Mono16", b"Y16 ", 16, None),
    pixel_format("RGB8", b"RGB3", 24, None),
    pixel_format("BayerRG8", b"RGGB", 8, Some("BayerRG")),
    pixel_format("BayerGR8", b"GRBG", 8, Some("BayerGR")),
    pixel_format("BayerGB8", b"GBRG", 8, Some("BayerGB")),
    pixel_format("BayerBG8", b"BA81", 8, Some("BayerBG")),
    pixel_format("BayerRG16", b"RG16", 16, Some("BayerRG")),
    pixel_format("BayerGR16", b"GR16", 16, Some("BayerGR")),
    pixel_format("BayerGB16", b"GB16", 16, Some("BayerGB")),
    pixel_format("BayerBG16", b"BYR2", 16, Some("BayerBG")),
    pixel_format("YUV422_8", b"YUYV", 16, None),
];

fn pixel_format_by_name(name: &str) -> Option<&'static PixelFormat> {
    PIXEL_FORMATS.iter().find(|format| format.name == name)
}

fn pixel_format_by_fourcc(fourcc: FourCC) -> Option<&'static PixelFormat> {
    PIXEL_FORMATS.iter().find(|format| *format.fourcc == fourcc.repr)
}

/// How a control's raw value maps to its GenICam node.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ControlKind {
    /// Float node; GenICam value = raw value * scale.
    Scaled(f64),
    /// Boolean control shown as an `Off`/`Continuous` enumeration.
    Switch,
    /// `V4L2_CID_EXPOSURE_AUTO` menu shown as an `Off`/`Continuous` enumeration.
    ExposureMenu,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ControlNode {
    name: &'static str,
    id: u32,
    kind: ControlKind,
}

const CONTROLS: &[ControlNode] = &[
    ControlNode {
        name: "Gain",
        id: V4L2_CID_GAIN,
        kind: ControlKind::Scaled(1.0),
    },
    ControlNode {
        name: "GainAuto",
        id: V4L2_CID_AUTOGAIN,
        kind: ControlKind::Switch,
    },
    // V4L2 exposure is in units of 100 µs.
    ControlNode {
        name: "ExposureTime",
        id: V4L2_CID_EXPOSURE_ABSOLUTE,
        kind: ControlKind::Scaled(100.0),
    },
    ControlNode {
        name: "ExposureAuto",
        id: V4L2_CID_EXPOSURE_AUTO,
        kind: ControlKind::ExposureMenu,
    },
    ControlNode {
        name: "BlackLevel",
        id: V4L2_CID_BRIGHTNESS,
        kind: ControlKind::Scaled(1.0),
    },
    ControlNode {
        name: "Gamma",
        id: V4L2_CID_GAMMA,
        kind: ControlKind::Scaled(1.0),
    },
    ControlNode {
        name: "Saturation",
        id: V4L2_CID_SATURATION,
        kind: ControlKind::Scaled(1.0),
    },
    ControlNode {
        name: "Sharpening",
        id: V4L2_CID_SHARPNESS,
        kind: ControlKind::Scaled(1.0),
    },
    ControlNode {
        name: "BalanceWhiteAuto",
        id: V4L2_CID_AUTO_WHITE_BALANCE,
        kind: ControlKind::Switch,
    },
];

/// GenICam nodes with no V4L2 counterpart. Pinned nodes only accept their
/// initial value.
const EMULATED: &[(&str, fn() -> NodeValue, bool)] = &[
    ("BinningHorizontal", || NodeValue::Integer(1), true),
    ("BinningVertical", || NodeValue::Integer(1), true),
    ("DecimationHorizontal", || NodeValue::Integer(1), true),
    ("DecimationVertical", || NodeValue::Integer(1), true),
    ("OffsetX", || NodeValue::Integer(0), true),
    ("OffsetY", || NodeValue::Integer(0), true),
    ("TriggerMode", || NodeValue::Text("Off".to_owned()), true),
    ("ExposureMode", || NodeValue::Text("Timed".to_owned()), true),
    ("GainSelector", || NodeValue::Text("All".to_owned()), true),
    ("AcquisitionFrameRateEnable", || NodeValue::Boolean(true), false),
    ("TriggerSource", || NodeValue::Text("Software".to_owned()), false),
    ("TriggerSelector", || NodeValue::Text("FrameStart".to_owned()), false),
    ("TriggerActivation", || NodeValue::Text("RisingEdge".to_owned()), false),
    ("LineSelector", || NodeValue::Text("Line0".to_owned()), false),
    ("LineMode", || NodeValue::Text("Input".to_owned()), false),
    ("LineSource", || NodeValue::Text("Off".to_owned()), false),
];

#[derive(Debug, Clone, PartialEq)]
struct EmulatedNode {
    value: NodeValue,
    pinned: bool,
}

fn unsupported(name: &str) -> SdkError {
    SdkError::new(format!("node {name} is not supported by V4L2"))
}

/// Node map of a V4L2 device, or of its transport layer when no device is attached.
pub struct V4l2NodeMap {
    info: Vec<(&'static str, String)>,
    device: Option<Device>,
    controls: HashMap<u32, Description>,
    emulated: HashMap<&'static str, EmulatedNode>,
    streaming: bool,
}

impl V4l2NodeMap {
    fn transport(info: Vec<(&'static str, String)>) -> Self {
        Self {
            info,
            device: None,
            controls: HashMap::new(),
            emulated: HashMap::new(),
            streaming: false,
        }
    }

    fn device(info: Vec<(&'static str, String)>, device: Device) -> Self {
        let emulated = EMULATED
            .iter()
            .map(|(name, value, pinned)| {
                (
                    *name,
                    EmulatedNode {
                        value: value(),
                        pinned: *pinned,
                    },
                )
            })
            .collect();
        Self {
            info,
            device: Some(device),
            controls: HashMap::new(),
            emulated,
            streaming: false,
        }
    }

    fn handle(&self) -> SdkResult<&Device> {
        self.device
            .as_ref()
            .ok_or_else(|| SdkError::new("node map has no device"))
    }

    fn load_controls(&mut self) -> SdkResult<()> {
        let controls = self.handle()?.query_controls()?;
        self.controls = controls
            .into_iter()
            .map(|control| (control.id, control))
            .collect();
        debug!(count = self.controls.len(), "V4L2 controls loaded");
        Ok(())
    }

    fn control(&self, name: &str) -> Option<(&ControlNode, &Description)> {
        let node = CONTROLS.iter().find(|node| node.name == name)?;
        self.controls.get(&node.id).map(|description| (node, description))
    }

    fn read_control(&self, id: u32) -> SdkResult<i64> {
        match self.handle()?.control(id)?.value {
            Value::Integer(value) => Ok(value),
            Value::Boolean(value) => Ok(i64::from(value)),
            other => Err(SdkError::new(format!("unexpected control value {other:?}"))),
        }
    }

    fn write_control(&self, node: &ControlNode, value: &NodeValue) -> SdkResult<()> {
        let value = match (node.kind, value) {
            #[allow(clippy::cast_possible_truncation)]
            (ControlKind::Scaled(scale), NodeValue::Float(v)) => Value::Integer((v / scale).round() as i64),
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            (ControlKind::Scaled(scale), NodeValue::Integer(v)) => {
                Value::Integer((*v as f64 / scale).round() as i64)
            }
            (ControlKind::Switch, NodeValue::Text(mode)) => Value::Boolean(auto_enabled(node.name, mode)?),
            (ControlKind::ExposureMenu, NodeValue::Text(mode)) => Value::Integer(if auto_enabled(node.name, mode)? {
                V4L2_EXPOSURE_APERTURE_PRIORITY
            } else {
                V4L2_EXPOSURE_MANUAL
            }),
            (_, other) => {
                return Err(SdkError::new(format!(
                    "cannot write {} value to {}",
                    other.kind(),
                    node.name
                )))
            }
        };
        self.handle()?.set_control(Control { id: node.id, value })?;
        Ok(())
    }

    fn pixel_format(&self) -> SdkResult<(v4l::Format, Option<&'static PixelFormat>)> {
        let format = self.handle()?.format()?;
        Ok((format, pixel_format_by_fourcc(format.fourcc)))
    }

    fn max_size(&self) -> SdkResult<(u32, u32)> {
        let device = self.handle()?;
        let format = device.format()?;
        let sizes = device.enum_framesizes(format.fourcc).unwrap_or_default();
        let max = sizes
            .iter()
            .map(|size| match &size.size {
                FrameSizeEnum::Discrete(discrete) => (discrete.width, discrete.height),
                FrameSizeEnum::Stepwise(stepwise) => (stepwise.max_width, stepwise.max_height),
            })
            .fold((format.width, format.height), |(w, h), (sw, sh)| (w.max(sw), h.max(sh)));
        Ok(max)
    }

    fn set_size(&self, width: Option<u32>, height: Option<u32>) -> SdkResult<()> {
        let device = self.handle()?;
        let mut format = device.format()?;
        format.width = width.unwrap_or(format.width);
        format.height = height.unwrap_or(format.height);
        let applied = device.set_format(&format)?;
        debug!(width = applied.width, height = applied.height, "V4L2 frame size set");
        Ok(())
    }

    fn frame_rate(&self) -> SdkResult<f64> {
        let params = self.handle()?.params()?;
        if params.interval.numerator == 0 {
            return Err(SdkError::new("device reports no frame interval"));
        }
        Ok(f64::from(params.interval.denominator) / f64::from(params.interval.numerator))
    }
}

fn auto_enabled(name: &str, mode: &str) -> SdkResult<bool> {
    match mode {
        "Off" => Ok(false),
        "Once" | "Continuous" => Ok(true),
        other => Err(SdkError::new(format!("{name} has no entry {other}"))),
    }
}

fn to_i64(value: u32) -> NodeValue {
    NodeValue::Integer(i64::from(value))
}

impl NodeMap for V4l2NodeMap {
    fn access(&self, name: &str) -> AccessMode {
        if self.info.iter().any(|(key, _)| *key == name) {
            return AccessMode::ReadOnly;
        }
        if self.device.is_none() {
            return AccessMode::NotImplemented;
        }
        match name {
            "WidthMax" | "HeightMax" | "PixelColorFilter" => AccessMode::ReadOnly,
            "Width" | "Height" | "PixelFormat" if self.streaming => AccessMode::ReadOnly,
            "Width" | "Height" | "PixelFormat" | "AcquisitionFrameRate" => AccessMode::ReadWrite,
            _ if self.emulated.contains_key(name) => AccessMode::ReadWrite,
            _ => match self.control(name) {
                None => AccessMode::NotImplemented,
                Some((_, description)) if description.flags.contains(ControlFlags::DISABLED) => {
                    AccessMode::NotAvailable
                }
                Some((_, description)) if description.flags.contains(ControlFlags::READ_ONLY) => {
                    AccessMode::ReadOnly
                }
                Some((_, description)) if description.flags.contains(ControlFlags::WRITE_ONLY) => {
                    AccessMode::WriteOnly
                }
                Some(_) => AccessMode::ReadWrite,
            },
        }
    }

    fn value(&self, name: &str) -> SdkResult<NodeValue> {
        if let Some((_, value)) = self.info.iter().find(|(key, _)| *key == name) {
            return Ok(NodeValue::Text(value.clone()));
        }
        match name {
            "Width" => Ok(to_i64(self.handle()?.format()?.width)),
            "Height" => Ok(to_i64(self.handle()?.format()?.height)),
            "WidthMax" => Ok(to_i64(self.max_size()?.0)),
            "HeightMax" => Ok(to_i64(self.max_size()?.1)),
            "PixelFormat" => {
                let (format, known) = self.pixel_format()?;
                Ok(NodeValue::Text(
                    known.map_or_else(|| format.fourcc.to_string(), |known| known.name.to_owned()),
                ))
            }
            "PixelColorFilter" => {
                let (_, known) = self.pixel_format()?;
                let filter = known.and_then(|known| known.color_filter).unwrap_or("None");
                Ok(NodeValue::Text(filter.to_owned()))
            }
            "AcquisitionFrameRate" => Ok(NodeValue::Float(self.frame_rate()?)),
            _ => {
                if let Some(node) = self.emulated.get(name) {
                    return Ok(node.value.clone());
                }
                let (node, _) = self.control(name).ok_or_else(|| unsupported(name))?;
                let raw = self.read_control(node.id)?;
                Ok(match node.kind {
                    #[allow(clippy::cast_precision_loss)]
                    ControlKind::Scaled(scale) => NodeValue::Float(raw as f64 * scale),
                    ControlKind::Switch => NodeValue::Text(if raw == 0 { "Off" } else { "Continuous" }.to_owned()),
                    ControlKind::ExposureMenu => NodeValue::Text(
                        if raw == V4L2_EXPOSURE_MANUAL { "Off" } else { "Continuous" }.to_owned(),
                    ),
                })
            }
        }
    }

    fn set_value(&mut self, name: &str, value: NodeValue) -> SdkResult<()> {
        match (name, &value) {
            ("Width" | "Height" | "PixelFormat", _) if self.streaming => {
                Err(SdkError::new(format!("{name} cannot change while streaming")))
            }
            ("Width", NodeValue::Integer(width)) => {
                self.set_size(Some(u32::try_from(*width).map_err(|_| unsupported(name))?), None)
            }
            ("Height", NodeValue::Integer(height)) => {
                self.set_size(None, Some(u32::try_from(*height).map_err(|_| unsupported(name))?))
            }
            ("PixelFormat", NodeValue::Text(entry)) => {
                let known = pixel_format_by_name(entry)
                    .ok_or_else(|| SdkError::new(format!("pixel format {entry} is not supported")))?;
                let device = self.handle()?;
                let mut format = device.format()?;
                format.fourcc = FourCC::new(known.fourcc);
                let applied = device.set_format(&format)?;
                if applied.fourcc != format.fourcc {
                    return Err(SdkError::new(format!(
                        "device refused pixel format {entry}, kept {}",
                        applied.fourcc
                    )));
                }
                Ok(())
            }
            ("AcquisitionFrameRate", NodeValue::Float(rate)) => {
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                let fps = rate.round().max(1.0) as u32;
                let applied = self.handle()?.set_params(&Parameters::with_fps(fps))?;
                debug!(requested = fps, interval = ?applied.interval, "V4L2 frame interval set");
                Ok(())
            }
            _ => {
                if let Some(node) = self.emulated.get_mut(name) {
                    if node.pinned && node.value != value {
                        return Err(unsupported(name));
                    }
                    node.value = value;
                    return Ok(());
                }
                let (node, _) = self.control(name).ok_or_else(|| unsupported(name))?;
                self.write_control(node, &value)
            }
        }
    }

    fn int_bounds(&self, name: &str) -> SdkResult<(i64, i64)> {
        match name {
            "Width" => Ok((1, i64::from(self.max_size()?.0))),
            "Height" => Ok((1, i64::from(self.max_size()?.1))),
            _ => self
                .control(name)
                .map(|(_, description)| (description.minimum, description.maximum))
                .ok_or_else(|| SdkError::new(format!("node {name} has no integer range"))),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn float_bounds(&self, name: &str) -> SdkResult<(f64, f64)> {
        match self.control(name) {
            Some((
                ControlNode {
                    kind: ControlKind::Scaled(scale),
                    ..
                },
                description,
            )) => Ok((
                description.minimum as f64 * scale,
                description.maximum as f64 * scale,
            )),
            _ => Err(SdkError::new(format!("node {name} has no float range"))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FrameLayout {
    width: u32,
    height: u32,
    stride: u32,
    bits_per_pixel: u32,
    color_filter: Option<&'static str>,
}

/// A V4L2 capture node.
pub struct V4l2Device {
    index: usize,
    capture: bool,
    transport: V4l2NodeMap,
    nodes: V4l2NodeMap,
    stream: Option<MmapStream<'static>>,
    layout: Option<FrameLayout>,
}

impl V4l2Device {
    /// Open `/dev/video{index}`.
    pub fn open(index: usize) -> SdkResult<Self> {
        let device = Device::new(index)?;
        let caps = device.query_caps()?;
        let capture = caps.capabilities.contains(CapabilityFlags::VIDEO_CAPTURE)
            && caps.capabilities.contains(CapabilityFlags::STREAMING);

        let transport = V4l2NodeMap::transport(vec![
            ("DeviceID", serial_of(index)),
            ("DeviceType", "V4L2".to_owned()),
            ("DeviceDriver", caps.driver.clone()),
            ("DeviceBusInfo", caps.bus.clone()),
        ]);
        let nodes = V4l2NodeMap::device(
            vec![
                ("DeviceModelName", caps.card.clone()),
                ("DeviceVendorName", caps.driver),
            ],
            device,
        );

        Ok(Self {
            index,
            capture,
            transport,
            nodes,
            stream: None,
            layout: None,
        })
    }

    /// Index of the `/dev/video` node.
    pub const fn index(&self) -> usize {
        self.index
    }

    fn layout(&self) -> SdkResult<FrameLayout> {
        let (format, known) = self.nodes.pixel_format()?;
        let bits_per_pixel = match known {
            Some(known) => known.bits_per_pixel,
            None if format.width > 0 => format.stride.saturating_mul(8) / format.width,
            None => 8,
        };
        Ok(FrameLayout {
            width: format.width,
            height: format.height,
            stride: format.stride,
            bits_per_pixel,
            color_filter: known.and_then(|known| known.color_filter),
        })
    }
}

impl DeviceHandle for V4l2Device {
    type NodeMap = V4l2NodeMap;

    fn is_valid(&self) -> bool {
        self.capture
    }

    fn transport_node_map(&self) -> &V4l2NodeMap {
        &self.transport
    }

    fn init(&mut self) -> SdkResult<()> {
        self.nodes.load_controls()
    }

    fn deinit(&mut self) -> SdkResult<()> {
        let stopped = self.end_acquisition();
        self.nodes.controls.clear();
        stopped
    }

    fn node_map(&self) -> &V4l2NodeMap {
        &self.nodes
    }

    fn node_map_mut(&mut self) -> &mut V4l2NodeMap {
        &mut self.nodes
    }

    fn begin_acquisition(&mut self) -> SdkResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let layout = self.layout()?;
        let mut stream = MmapStream::with_buffers(self.nodes.handle()?, Type::VideoCapture, BUFFER_COUNT)?;
        stream.start()?;

        debug!(
            index = self.index,
            width = layout.width,
            height = layout.height,
            "V4L2 streaming started"
        );
        self.layout = Some(layout);
        self.stream = Some(stream);
        self.nodes.streaming = true;
        Ok(())
    }

    fn end_acquisition(&mut self) -> SdkResult<()> {
        self.nodes.streaming = false;
        self.layout = None;
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        stream.stop()?;
        Ok(())
    }

    fn next_frame(&mut self, timeout: Duration) -> SdkResult<RawFrame<'_>> {
        let layout = self
            .layout
            .ok_or_else(|| SdkError::new("device is not streaming"))?;
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| SdkError::new("device is not streaming"))?;

        stream.set_timeout(timeout);
        let (buffer, meta) = CaptureStream::next(stream)?;

        let used = (meta.bytesused as usize).min(buffer.len());
        #[allow(clippy::cast_sign_loss)]
        let timestamp_ns = (meta.timestamp.sec.max(0) as u64)
            .saturating_mul(1_000_000_000)
            .saturating_add((meta.timestamp.usec.max(0) as u64).saturating_mul(1000));

        Ok(RawFrame {
            data: buffer.get(..used).unwrap_or(buffer),
            width: layout.width,
            height: layout.height,
            stride: layout.stride,
            bits_per_pixel: layout.bits_per_pixel,
            color_filter: layout.color_filter,
            timestamp_ns,
            frame_number: u64::from(meta.sequence),
            incomplete: meta.flags.contains(BufferFlags::ERROR),
        })
    }
}

/// Enumeration of V4L2 capture nodes.
#[derive(Debug, Default)]
pub struct V4l2System {
    cache: Vec<usize>,
}

impl V4l2System {
    /// Enumerate the capture nodes present now.
    pub fn new() -> Self {
        let system = Self { cache: enumerate() };
        debug!(devices = ?system.cache, "V4L2 capture nodes");
        system
    }
}

/// Serial reported for `/dev/video{index}`.
pub fn serial_of(index: usize) -> String {
    (index + 1).to_string()
}

/// `/dev/video` index behind `serial`. Serial 0 names no node.
fn node_of(serial: &str) -> Option<usize> {
    serial.trim().parse::<usize>().ok()?.checked_sub(1)
}

fn enumerate() -> Vec<usize> {
    let mut indices: Vec<usize> = v4l::context::enum_devices()
        .iter()
        .map(v4l::context::Node::index)
        .filter(|index| V4l2Device::open(*index).is_ok_and(|device| device.is_valid()))
        .collect();
    indices.sort_unstable();
    indices
}

impl CameraSystem for V4l2System {
    type Device = V4l2Device;

    fn device_count(&self) -> usize {
        self.cache.len()
    }

    fn device_by_index(&mut self, index: usize) -> SdkResult<V4l2Device> {
        let node = self
            .cache
            .get(index)
            .copied()
            .ok_or_else(|| SdkError::new(format!("no V4L2 capture device at position {index}")))?;
        V4l2Device::open(node)
    }

    fn device_by_serial(&mut self, serial: &str) -> SdkResult<V4l2Device> {
        let node = node_of(serial)
            .ok_or_else(|| SdkError::new(format!("{serial} is not a V4L2 device serial")))?;
        if !self.cache.contains(&node) {
            return Err(SdkError::new(format!("no V4L2 capture device /dev/video{node}")));
        }
        V4l2Device::open(node)
    }

    fn remove_by_serial(&mut self, serial: &str) -> SdkResult<()> {
        if let Some(node) = node_of(serial) {
            self.cache.retain(|index| *index != node);
        }
        Ok(())
    }

    fn refresh(&mut self) -> SdkResult<()> {
        for index in enumerate() {
            if !self.cache.contains(&index) {
                self.cache.push(index);
            }
        }
        self.cache.sort_unstable();
        Ok(())
    }
}
