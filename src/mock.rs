//! Mock device SDK for testing without hardware.
//!
//! Every SDK call is recorded in a shared [`MockProbe`] so tests can assert on
//! the exact sequence the driver issued, and individual calls can be made to
//! fail on demand.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{SdkError, SdkResult};
use crate::traits::{AccessMode, CameraSystem, DeviceHandle, NodeMap, NodeValue, RawFrame};

/// SDK call observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum SdkCall {
    /// Device lookup by index.
    GetByIndex(usize),
    /// Device lookup by serial.
    GetBySerial(String),
    /// Device initialization.
    Init,
    /// Device de-initialization.
    Deinit,
    /// Acquisition start.
    BeginAcquisition,
    /// Acquisition stop.
    EndAcquisition,
    /// Buffer retrieval with the timeout it was given.
    NextFrame(Duration),
    /// Node write.
    Set(String, NodeValue),
    /// Enumeration cache removal.
    RemoveBySerial(String),
    /// Enumeration cache refresh.
    Refresh,
}

/// SDK call that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockFailure {
    /// Device lookup.
    Lookup,
    /// Device initialization.
    Init,
    /// Device de-initialization.
    Deinit,
    /// Acquisition start.
    BeginAcquisition,
    /// Acquisition stop.
    EndAcquisition,
    /// Buffer retrieval.
    NextFrame,
}

#[derive(Debug, Default)]
struct ProbeState {
    calls: Vec<SdkCall>,
    failures: HashSet<MockFailure>,
    incomplete_frames: bool,
}

/// Shared view into the mock: call log, failure switches, frame flags.
#[derive(Debug, Clone, Default)]
pub struct MockProbe(Arc<Mutex<ProbeState>>);

impl MockProbe {
    fn state(&self) -> MutexGuard<'_, ProbeState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: SdkCall) {
        self.state().calls.push(call);
    }

    fn check(&self, failure: MockFailure) -> SdkResult<()> {
        if self.state().failures.contains(&failure) {
            Err(SdkError::new(format!("injected {failure:?} failure")).with_code(-1002))
        } else {
            Ok(())
        }
    }

    /// Every call recorded so far.
    pub fn calls(&self) -> Vec<SdkCall> {
        self.state().calls.clone()
    }

    /// Forget the recorded calls.
    pub fn clear(&self) {
        self.state().calls.clear();
    }

    /// Number of recorded calls equal to `call`.
    pub fn count(&self, call: &SdkCall) -> usize {
        self.state().calls.iter().filter(|c| *c == call).count()
    }

    /// Timeouts of the recorded buffer retrievals, in call order.
    pub fn frame_timeouts(&self) -> Vec<Duration> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                SdkCall::NextFrame(timeout) => Some(*timeout),
                _ => None,
            })
            .collect()
    }

    /// Recorded calls with node writes collapsed to `"set"` markers.
    pub fn acquisition_trace(&self) -> Vec<&'static str> {
        let mut trace: Vec<&'static str> = Vec::new();
        for call in &self.state().calls {
            let step = match call {
                SdkCall::BeginAcquisition => "begin",
                SdkCall::EndAcquisition => "end",
                SdkCall::Set(..) => "set",
                _ => continue,
            };
            if step == "set" && trace.last() == Some(&"set") {
                continue;
            }
            trace.push(step);
        }
        trace
    }

    /// Make `failure` fail until [`recover`](Self::recover) is called.
    pub fn fail(&self, failure: MockFailure) {
        self.state().failures.insert(failure);
    }

    /// Let `failure` succeed again.
    pub fn recover(&self, failure: MockFailure) {
        self.state().failures.remove(&failure);
    }

    /// Flag every following frame as incomplete.
    pub fn set_incomplete_frames(&self, incomplete: bool) {
        self.state().incomplete_frames = incomplete;
    }

    fn incomplete_frames(&self) -> bool {
        self.state().incomplete_frames
    }
}

/// A node in a [`MockNodeMap`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockNode {
    value: NodeValue,
    access: AccessMode,
    int_bounds: Option<(i64, i64)>,
    float_bounds: Option<(f64, f64)>,
}

impl MockNode {
    fn new(value: NodeValue) -> Self {
        Self {
            value,
            access: AccessMode::ReadWrite,
            int_bounds: None,
            float_bounds: None,
        }
    }

    /// Read-write integer node.
    pub fn int(value: i64) -> Self {
        Self::new(NodeValue::Integer(value))
    }

    /// Read-write float node.
    pub fn float(value: f64) -> Self {
        Self::new(NodeValue::Float(value))
    }

    /// Read-write boolean node.
    pub fn boolean(value: bool) -> Self {
        Self::new(NodeValue::Boolean(value))
    }

    /// Read-write text or enumeration node.
    pub fn text(value: &str) -> Self {
        Self::new(NodeValue::Text(value.to_owned()))
    }

    /// Make the node read-only.
    #[must_use]
    pub const fn read_only(self) -> Self {
        self.with_access(AccessMode::ReadOnly)
    }

    /// Set the node's access mode.
    #[must_use]
    pub const fn with_access(mut self, access: AccessMode) -> Self {
        self.access = access;
        self
    }

    /// Set float bounds.
    #[must_use]
    pub const fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.float_bounds = Some((min, max));
        self
    }

    /// Set integer bounds.
    #[must_use]
    pub const fn with_int_bounds(mut self, min: i64, max: i64) -> Self {
        self.int_bounds = Some((min, max));
        self
    }
}

/// In-memory node map.
#[derive(Debug, Clone, Default)]
pub struct MockNodeMap {
    nodes: HashMap<String, MockNode>,
    probe: MockProbe,
}

const COMMON_NODES: &[(&str, fn() -> MockNode)] = &[
    ("OffsetX", || MockNode::int(0)),
    ("OffsetY", || MockNode::int(0)),
    ("BinningHorizontal", || MockNode::int(1)),
    ("BinningVertical", || MockNode::int(1)),
    ("DecimationHorizontal", || MockNode::int(1)),
    ("DecimationVertical", || MockNode::int(1)),
    ("PixelFormat", || MockNode::text("BayerRG8")),
    ("PixelColorFilter", || MockNode::text("BayerRG").read_only()),
    ("AcquisitionFrameRate", || MockNode::float(30.0).with_bounds(1.0, 226.0)),
    ("TriggerMode", || MockNode::text("Off")),
    ("TriggerSource", || MockNode::text("Software")),
    ("TriggerSelector", || MockNode::text("FrameStart")),
    ("TriggerActivation", || MockNode::text("RisingEdge")),
    ("LineSelector", || MockNode::text("Line0")),
    ("LineMode", || MockNode::text("Input")),
    ("LineSource", || MockNode::text("Off")),
    ("ExposureAuto", || MockNode::text("Continuous")),
    ("ExposureTime", || MockNode::float(5000.0)),
    ("Saturation", || MockNode::float(1.0)),
    ("GainAuto", || MockNode::text("Continuous")),
    ("Gain", || MockNode::float(0.0).with_bounds(0.0, 47.99)),
    ("BlackLevel", || MockNode::float(0.0)),
    ("Gamma", || MockNode::float(1.0)),
    ("BalanceWhiteAuto", || MockNode::text("Continuous")),
    ("BalanceRatioSelector", || MockNode::text("Red")),
    ("BalanceRatio", || MockNode::float(1.0)),
];

const GENERIC_NODES: &[(&str, fn() -> MockNode)] = &[
    ("DeviceLinkThroughputLimit", || {
        MockNode::int(380_000_000).with_int_bounds(10_000_000, 500_000_000)
    }),
    ("AcquisitionFrameRateEnable", || MockNode::boolean(false)),
    ("ExposureMode", || MockNode::text("Timed")),
    ("AutoExposureExposureTimeUpperLimit", || MockNode::float(30_000.0)),
    ("SharpeningEnable", || MockNode::boolean(false)),
    ("SharpeningAuto", || MockNode::boolean(false)),
    ("Sharpening", || MockNode::float(0.0)),
    ("SharpeningThreshold", || MockNode::float(0.25)),
    ("SaturationEnable", || MockNode::boolean(false)),
    ("GainSelector", || MockNode::text("All")),
    ("GammaEnable", || MockNode::boolean(false)),
];

const CHAMELEON3_NODES: &[(&str, fn() -> MockNode)] = &[
    ("AcquisitionFrameRateEnabled", || MockNode::boolean(false)),
    ("AcquisitionFrameRateAuto", || MockNode::text("Continuous")),
    ("AutoExposureTimeUpperLimit", || MockNode::float(30_000.0)),
    ("SharpnessEnabled", || MockNode::boolean(false)),
    ("SharpnessAuto", || MockNode::boolean(false)),
    ("Sharpness", || MockNode::int(1024)),
    ("SaturationEnabled", || MockNode::boolean(false)),
    ("GammaEnabled", || MockNode::boolean(false)),
];

impl MockNodeMap {
    /// Empty node map with its own probe.
    pub fn detached() -> Self {
        Self::default()
    }

    fn from_table(model_name: &str, width: i64, height: i64, tables: &[&[(&str, fn() -> MockNode)]]) -> Self {
        let mut map = Self::detached()
            .with_node("DeviceModelName", MockNode::text(model_name).read_only())
            .with_node("WidthMax", MockNode::int(width).read_only())
            .with_node("HeightMax", MockNode::int(height).read_only())
            .with_node("Width", MockNode::int(width).with_int_bounds(16, width))
            .with_node("Height", MockNode::int(height).with_int_bounds(16, height));
        for table in tables {
            for (name, node) in *table {
                map = map.with_node(name, node());
            }
        }
        map
    }

    /// Node map of a Blackfly S style camera.
    pub fn genicam(model_name: &str, width: i64, height: i64) -> Self {
        Self::from_table(model_name, width, height, &[COMMON_NODES, GENERIC_NODES])
    }

    /// Node map of a Chameleon3 style camera.
    pub fn chameleon3(model_name: &str, width: i64, height: i64) -> Self {
        Self::from_table(model_name, width, height, &[COMMON_NODES, CHAMELEON3_NODES])
    }

    /// Add or replace a node.
    #[must_use]
    pub fn with_node(mut self, name: &str, node: MockNode) -> Self {
        self.nodes.insert(name.to_owned(), node);
        self
    }

    /// Remove a node.
    #[must_use]
    pub fn without_node(mut self, name: &str) -> Self {
        self.nodes.remove(name);
        self
    }

    fn int_or(&self, name: &str, fallback: i64) -> i64 {
        match self.nodes.get(name).map(|node| &node.value) {
            Some(NodeValue::Integer(v)) => *v,
            _ => fallback,
        }
    }

    fn text_of(&self, name: &str) -> Option<&str> {
        match self.nodes.get(name).map(|node| &node.value) {
            Some(NodeValue::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    fn node(&self, name: &str) -> SdkResult<&MockNode> {
        self.nodes
            .get(name)
            .ok_or_else(|| SdkError::new(format!("node {name} does not exist")).with_code(-1011))
    }
}

impl NodeMap for MockNodeMap {
    fn access(&self, name: &str) -> AccessMode {
        self.nodes.get(name).map_or(AccessMode::NotImplemented, |node| node.access)
    }

    fn value(&self, name: &str) -> SdkResult<NodeValue> {
        Ok(self.node(name)?.value.clone())
    }

    fn set_value(&mut self, name: &str, value: NodeValue) -> SdkResult<()> {
        let node = self
            .nodes
            .get_mut(name)
            .ok_or_else(|| SdkError::new(format!("node {name} does not exist")).with_code(-1011))?;
        self.probe.record(SdkCall::Set(name.to_owned(), value.clone()));
        node.value = value;
        Ok(())
    }

    fn int_bounds(&self, name: &str) -> SdkResult<(i64, i64)> {
        self.node(name)?
            .int_bounds
            .ok_or_else(|| SdkError::new(format!("node {name} has no integer range")))
    }

    fn float_bounds(&self, name: &str) -> SdkResult<(f64, f64)> {
        self.node(name)?
            .float_bounds
            .ok_or_else(|| SdkError::new(format!("node {name} has no float range")))
    }
}

/// Mock camera.
#[derive(Debug, Clone)]
pub struct MockDevice {
    serial: String,
    transport: MockNodeMap,
    nodes: MockNodeMap,
    probe: MockProbe,
    valid: bool,
    initialized: bool,
    acquiring: bool,
    buffer: Vec<u8>,
    frame_count: u64,
}

impl MockDevice {
    fn with_nodes(serial: u32, nodes: MockNodeMap) -> Self {
        let transport = MockNodeMap::detached()
            .with_node("DeviceID", MockNode::text(&serial.to_string()).read_only())
            .with_node("DeviceType", MockNode::text("U3V").read_only())
            .with_node("DeviceCurrentSpeed", MockNode::text("SuperSpeed").read_only());
        Self {
            serial: serial.to_string(),
            transport,
            nodes,
            probe: MockProbe::default(),
            valid: true,
            initialized: false,
            acquiring: false,
            buffer: Vec::new(),
            frame_count: 0,
        }
    }

    /// Blackfly S colour camera with a small sensor.
    pub fn blackfly(serial: u32) -> Self {
        Self::with_nodes(serial, MockNodeMap::genicam("Blackfly S BFS-U3-04S2C", 64, 48))
    }

    /// Chameleon3 colour camera with a small sensor.
    pub fn chameleon3(serial: u32) -> Self {
        Self::with_nodes(serial, MockNodeMap::chameleon3("Chameleon3 CM3-U3-13S2C", 64, 48))
    }

    /// Camera whose model name matches no known family.
    pub fn unknown_model(serial: u32) -> Self {
        Self::with_nodes(serial, MockNodeMap::genicam("Grasshopper3 GS3-U3-23S6M", 64, 48))
    }

    /// Add or replace a device node.
    #[must_use]
    pub fn with_node(mut self, name: &str, node: MockNode) -> Self {
        self.nodes = self.nodes.with_node(name, node);
        self
    }

    /// Add or replace a transport-layer node.
    #[must_use]
    pub fn with_transport_node(mut self, name: &str, node: MockNode) -> Self {
        self.transport = self.transport.with_node(name, node);
        self
    }

    /// Make the handle report itself as invalid.
    #[must_use]
    pub const fn invalid(mut self) -> Self {
        self.valid = false;
        self
    }

    fn attach(mut self, probe: &MockProbe) -> Self {
        self.probe = probe.clone();
        self.transport.probe = probe.clone();
        self.nodes.probe = probe.clone();
        self
    }

    fn bits_per_pixel(&self) -> u32 {
        match self.nodes.text_of("PixelFormat") {
            Some(format) if format.ends_with("16") => 16,
            Some("RGB8" | "BGR8") => 24,
            _ => 8,
        }
    }
}

impl DeviceHandle for MockDevice {
    type NodeMap = MockNodeMap;

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn transport_node_map(&self) -> &MockNodeMap {
        &self.transport
    }

    fn init(&mut self) -> SdkResult<()> {
        self.probe.record(SdkCall::Init);
        self.probe.check(MockFailure::Init)?;
        self.initialized = true;
        Ok(())
    }

    fn deinit(&mut self) -> SdkResult<()> {
        self.probe.record(SdkCall::Deinit);
        self.probe.check(MockFailure::Deinit)?;
        self.initialized = false;
        self.acquiring = false;
        Ok(())
    }

    fn node_map(&self) -> &MockNodeMap {
        &self.nodes
    }

    fn node_map_mut(&mut self) -> &mut MockNodeMap {
        &mut self.nodes
    }

    fn begin_acquisition(&mut self) -> SdkResult<()> {
        self.probe.record(SdkCall::BeginAcquisition);
        self.probe.check(MockFailure::BeginAcquisition)?;
        if !self.initialized {
            return Err(SdkError::new("camera is not initialized").with_code(-1002));
        }
        self.acquiring = true;
        Ok(())
    }

    fn end_acquisition(&mut self) -> SdkResult<()> {
        self.probe.record(SdkCall::EndAcquisition);
        self.probe.check(MockFailure::EndAcquisition)?;
        self.acquiring = false;
        Ok(())
    }

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn next_frame(&mut self, timeout: Duration) -> SdkResult<RawFrame<'_>> {
        self.probe.record(SdkCall::NextFrame(timeout));
        self.probe.check(MockFailure::NextFrame)?;
        if !self.acquiring {
            return Err(SdkError::new(format!("no image within {timeout:?}")).with_code(-1011));
        }

        let (width, height) = (
            self.nodes.int_or("Width", 0).max(0) as u32,
            self.nodes.int_or("Height", 0).max(0) as u32,
        );
        let bits_per_pixel = self.bits_per_pixel();
        let stride = width * bits_per_pixel.div_ceil(8);
        let size = (stride * height) as usize;

        // Horizontal gradient, shifted by one per frame.
        let line = stride.max(1) as usize;
        let shift = self.frame_count;
        self.buffer.clear();
        self.buffer
            .extend((0..size).map(|i| ((i % line) as u64 + shift) as u8));

        let frame_number = self.frame_count;
        self.frame_count += 1;

        Ok(RawFrame {
            data: &self.buffer,
            width,
            height,
            stride,
            bits_per_pixel,
            color_filter: self.nodes.text_of("PixelColorFilter"),
            timestamp_ns: frame_number * 33_333_333,
            frame_number,
            incomplete: self.probe.incomplete_frames(),
        })
    }
}

/// Mock SDK entry point holding an enumeration cache.
#[derive(Debug, Default)]
pub struct MockSystem {
    catalog: Vec<MockDevice>,
    cache: Vec<MockDevice>,
    probe: MockProbe,
}

impl MockSystem {
    /// System with no cameras attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a camera.
    #[must_use]
    pub fn with_camera(mut self, device: MockDevice) -> Self {
        let device = device.attach(&self.probe);
        self.catalog.push(device.clone());
        self.cache.push(device);
        self
    }

    /// Probe shared by the system and all of its cameras.
    pub fn probe(&self) -> MockProbe {
        self.probe.clone()
    }
}

impl CameraSystem for MockSystem {
    type Device = MockDevice;

    fn device_count(&self) -> usize {
        self.cache.len()
    }

    fn device_by_index(&mut self, index: usize) -> SdkResult<MockDevice> {
        self.probe.record(SdkCall::GetByIndex(index));
        self.probe.check(MockFailure::Lookup)?;
        self.cache
            .get(index)
            .cloned()
            .ok_or_else(|| SdkError::new(format!("no camera at index {index}")).with_code(-1006))
    }

    fn device_by_serial(&mut self, serial: &str) -> SdkResult<MockDevice> {
        self.probe.record(SdkCall::GetBySerial(serial.to_owned()));
        self.probe.check(MockFailure::Lookup)?;
        self.cache
            .iter()
            .find(|device| device.serial == serial)
            .cloned()
            .ok_or_else(|| SdkError::new(format!("no camera with serial {serial}")).with_code(-1006))
    }

    fn remove_by_serial(&mut self, serial: &str) -> SdkResult<()> {
        self.probe.record(SdkCall::RemoveBySerial(serial.to_owned()));
        self.cache.retain(|device| device.serial != serial);
        Ok(())
    }

    fn refresh(&mut self) -> SdkResult<()> {
        self.probe.record(SdkCall::Refresh);
        for device in &self.catalog {
            if !self.cache.iter().any(|cached| cached.serial == device.serial) {
                self.cache.push(device.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_system_lookup() {
        let mut system = MockSystem::new()
            .with_camera(MockDevice::blackfly(1001))
            .with_camera(MockDevice::chameleon3(1002));
        assert_eq!(system.device_count(), 2);
        let device = system.device_by_serial("1002").expect("device should exist");
        assert!(device.is_valid());
        assert!(system.device_by_serial("9999").is_err());
        assert!(system.device_by_index(2).is_err());
    }

    #[test]
    fn test_mock_cache_refresh() {
        let mut system = MockSystem::new().with_camera(MockDevice::blackfly(1001));
        system.remove_by_serial("1001").expect("remove should succeed");
        assert_eq!(system.device_count(), 0);
        system.refresh().expect("refresh should succeed");
        assert_eq!(system.device_count(), 1);
    }

    #[test]
    fn test_mock_frames() {
        let mut system = MockSystem::new().with_camera(MockDevice::blackfly(1001));
        let mut device = system.device_by_index(0).expect("device should exist");
        assert!(device.next_frame(Duration::from_millis(10)).is_err());

        device.init().expect("init should succeed");
        device.begin_acquisition().expect("begin should succeed");
        let frame = device.next_frame(Duration::from_millis(10)).expect("frame");
        assert_eq!((frame.width, frame.height, frame.stride), (64, 48, 64));
        assert_eq!(frame.data.len(), 64 * 48);
        assert_eq!(frame.color_filter, Some("BayerRG"));
        assert_eq!(frame.frame_number, 0);

        let frame = device.next_frame(Duration::from_millis(10)).expect("frame");
        assert_eq!(frame.frame_number, 1);
        assert_eq!(frame.data.first().copied(), Some(1));
    }

    #[test]
    fn test_mock_failure_injection() {
        let mut system = MockSystem::new().with_camera(MockDevice::blackfly(1001));
        let probe = system.probe();
        let mut device = system.device_by_index(0).expect("device should exist");
        device.init().expect("init should succeed");

        probe.fail(MockFailure::BeginAcquisition);
        assert!(device.begin_acquisition().is_err());
        probe.recover(MockFailure::BeginAcquisition);
        device.begin_acquisition().expect("begin should succeed");
        assert_eq!(probe.count(&SdkCall::BeginAcquisition), 2);
    }
}
