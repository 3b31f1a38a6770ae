//! Typed, checked access to device node maps.
//!
//! Every read checks that the node is available and readable, every write
//! that it is available and writable, before the SDK is touched. Some SDKs
//! misbehave when asked for a node that does not exist on the connected
//! device/firmware combination.

use crate::error::{CameraError, Result, SdkError};
use crate::traits::{NodeMap, NodeValue};

/// Rust types that can be read from a node.
pub trait FromNode: Sized {
    /// Convert a node value, `None` if the kind does not match.
    fn from_node(value: NodeValue) -> Option<Self>;
}

/// Rust types that can be written to a node.
pub trait IntoNode {
    /// Convert into a node value.
    fn into_node(self) -> NodeValue;
}

impl FromNode for i64 {
    fn from_node(value: NodeValue) -> Option<Self> {
        match value {
            NodeValue::Integer(v) => Some(v),
            _ => None,
        }
    }
}

impl FromNode for f64 {
    fn from_node(value: NodeValue) -> Option<Self> {
        match value {
            NodeValue::Float(v) => Some(v),
            #[allow(clippy::cast_precision_loss)]
            NodeValue::Integer(v) => Some(v as Self),
            _ => None,
        }
    }
}

impl FromNode for bool {
    fn from_node(value: NodeValue) -> Option<Self> {
        match value {
            NodeValue::Boolean(v) => Some(v),
            _ => None,
        }
    }
}

impl FromNode for String {
    fn from_node(value: NodeValue) -> Option<Self> {
        match value {
            NodeValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl IntoNode for i64 {
    fn into_node(self) -> NodeValue {
        NodeValue::Integer(self)
    }
}

impl IntoNode for i32 {
    fn into_node(self) -> NodeValue {
        NodeValue::Integer(i64::from(self))
    }
}

impl IntoNode for f64 {
    fn into_node(self) -> NodeValue {
        NodeValue::Float(self)
    }
}

impl IntoNode for f32 {
    fn into_node(self) -> NodeValue {
        NodeValue::Float(f64::from(self))
    }
}

impl IntoNode for bool {
    fn into_node(self) -> NodeValue {
        NodeValue::Boolean(self)
    }
}

impl IntoNode for String {
    fn into_node(self) -> NodeValue {
        NodeValue::Text(self)
    }
}

impl IntoNode for &str {
    fn into_node(self) -> NodeValue {
        NodeValue::Text(self.to_owned())
    }
}

/// Whether `name` exists and is currently available.
pub fn is_available<M: NodeMap + ?Sized>(map: &M, name: &str) -> bool {
    map.access(name).is_available()
}

/// Read `name` as `T`.
pub fn get<T: FromNode, M: NodeMap + ?Sized>(map: &M, name: &str) -> Result<T> {
    let access = map.access(name);
    if !access.is_available() || !access.is_readable() {
        return Err(CameraError::PropertyUnavailable {
            name: name.to_owned(),
        });
    }

    let value = map.value(name).map_err(|source| CameraError::PropertyAccessFailed {
        name: name.to_owned(),
        source,
    })?;
    let kind = value.kind();
    T::from_node(value).ok_or_else(|| CameraError::PropertyAccessFailed {
        name: name.to_owned(),
        source: SdkError::new(format!("unexpected {kind} value")),
    })
}

/// Write `value` to `name`.
pub fn set<T: IntoNode, M: NodeMap + ?Sized>(map: &mut M, name: &str, value: T) -> Result<()> {
    let access = map.access(name);
    if !access.is_available() {
        return Err(CameraError::PropertyUnavailable {
            name: name.to_owned(),
        });
    }
    if !access.is_writable() {
        return Err(CameraError::PropertyNotWritable {
            name: name.to_owned(),
        });
    }

    map.set_value(name, value.into_node())
        .map_err(|source| CameraError::PropertyAccessFailed {
            name: name.to_owned(),
            source,
        })
}

/// Write the maximum of integer node `name` to it. Returns the value written.
pub fn set_to_max<M: NodeMap + ?Sized>(map: &mut M, name: &str) -> Result<i64> {
    let access = map.access(name);
    if !access.is_available() || !access.is_readable() {
        return Err(CameraError::PropertyUnavailable {
            name: name.to_owned(),
        });
    }

    let (_, max) = map
        .int_bounds(name)
        .map_err(|source| CameraError::PropertyAccessFailed {
            name: name.to_owned(),
            source,
        })?;
    set(map, name, max)?;
    Ok(max)
}

/// Render the current value of `name` as text.
pub fn read_string<M: NodeMap + ?Sized>(map: &M, name: &str) -> Result<String> {
    let access = map.access(name);
    if !access.is_available() || !access.is_readable() {
        return Err(CameraError::PropertyUnavailable {
            name: name.to_owned(),
        });
    }

    let value = map.value(name).map_err(|source| CameraError::PropertyAccessFailed {
        name: name.to_owned(),
        source,
    })?;
    Ok(match value {
        NodeValue::Integer(v) => v.to_string(),
        NodeValue::Float(v) => v.to_string(),
        NodeValue::Boolean(v) => v.to_string(),
        NodeValue::Text(v) => v,
    })
}
