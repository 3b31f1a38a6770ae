//! Frame decoding: pixel encoding classification and image packing.

use std::fmt;
use std::time::Duration;

use crate::error::{CameraError, Result};
use crate::traits::RawFrame;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Pixel encoding of an [`OutputImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelEncoding {
    /// 8-bit monochrome.
    Mono8,
    /// 16-bit monochrome.
    Mono16,
    /// Packed 8-bit RGB.
    Rgb8,
    /// 8-bit bayer, RGGB layout.
    BayerRggb8,
    /// 8-bit bayer, GRBG layout.
    BayerGrbg8,
    /// 8-bit bayer, GBRG layout.
    BayerGbrg8,
    /// 8-bit bayer, BGGR layout.
    BayerBggr8,
    /// 16-bit bayer, RGGB layout.
    BayerRggb16,
    /// 16-bit bayer, GRBG layout.
    BayerGrbg16,
    /// 16-bit bayer, GBRG layout.
    BayerGbrg16,
    /// 16-bit bayer, BGGR layout.
    BayerBggr16,
}

impl PixelEncoding {
    /// Conventional encoding name (`mono8`, `bayer_rggb16`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mono8 => "mono8",
            Self::Mono16 => "mono16",
            Self::Rgb8 => "rgb8",
            Self::BayerRggb8 => "bayer_rggb8",
            Self::BayerGrbg8 => "bayer_grbg8",
            Self::BayerGbrg8 => "bayer_gbrg8",
            Self::BayerBggr8 => "bayer_bggr8",
            Self::BayerRggb16 => "bayer_rggb16",
            Self::BayerGrbg16 => "bayer_grbg16",
            Self::BayerGbrg16 => "bayer_gbrg16",
            Self::BayerBggr16 => "bayer_bggr16",
        }
    }

    /// Bytes occupied by one pixel.
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Mono8 | Self::BayerRggb8 | Self::BayerGrbg8 | Self::BayerGbrg8 | Self::BayerBggr8 => 1,
            Self::Mono16
            | Self::BayerRggb16
            | Self::BayerGrbg16
            | Self::BayerGbrg16
            | Self::BayerBggr16 => 2,
            Self::Rgb8 => 3,
        }
    }

    /// Whether this is one of the bayer encodings.
    pub const fn is_bayer(self) -> bool {
        !matches!(self, Self::Mono8 | Self::Mono16 | Self::Rgb8)
    }
}

impl fmt::Display for PixelEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colour filter array layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BayerPattern {
    /// Red-green / green-blue.
    Rggb,
    /// Green-red / blue-green.
    Grbg,
    /// Green-blue / red-green.
    Gbrg,
    /// Blue-green / green-red.
    Bggr,
}

impl BayerPattern {
    /// Parse a device colour filter tag (`BayerRG`, `BayerGR`, `BayerGB`, `BayerBG`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "BayerRG" => Some(Self::Rggb),
            "BayerGR" => Some(Self::Grbg),
            "BayerGB" => Some(Self::Gbrg),
            "BayerBG" => Some(Self::Bggr),
            _ => None,
        }
    }

    const fn encoding(self, wide: bool) -> PixelEncoding {
        match (self, wide) {
            (Self::Rggb, false) => PixelEncoding::BayerRggb8,
            (Self::Grbg, false) => PixelEncoding::BayerGrbg8,
            (Self::Gbrg, false) => PixelEncoding::BayerGbrg8,
            (Self::Bggr, false) => PixelEncoding::BayerBggr8,
            (Self::Rggb, true) => PixelEncoding::BayerRggb16,
            (Self::Grbg, true) => PixelEncoding::BayerGrbg16,
            (Self::Gbrg, true) => PixelEncoding::BayerGbrg16,
            (Self::Bggr, true) => PixelEncoding::BayerBggr16,
        }
    }
}

/// Choose the output encoding for a frame.
///
/// A missing, empty or `"None"` filter tag means a mono sensor (or a binned
/// colour sensor). Any other tag must be a known bayer layout.
pub fn classify(bits_per_pixel: u32, color_filter: Option<&str>) -> Result<PixelEncoding> {
    match color_filter {
        None | Some("" | "None") => Ok(match bits_per_pixel {
            16 => PixelEncoding::Mono16,
            24 => PixelEncoding::Rgb8,
            _ => PixelEncoding::Mono8,
        }),
        Some(tag) => BayerPattern::from_tag(tag)
            .map(|pattern| pattern.encoding(bits_per_pixel == 16))
            .ok_or_else(|| CameraError::UnrecognizedBayerFormat {
                filter: tag.to_owned(),
                bits_per_pixel,
            }),
    }
}

/// Capture time split into whole seconds and nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp {
    /// Whole seconds.
    pub sec: u64,
    /// Nanoseconds within the second.
    pub nanosec: u32,
}

impl Timestamp {
    /// Split a nanosecond counter.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self {
            sec: nanos / NANOS_PER_SEC,
            nanosec: (nanos % NANOS_PER_SEC) as u32,
        }
    }
}

impl From<Timestamp> for Duration {
    fn from(stamp: Timestamp) -> Self {
        Self::new(stamp.sec, stamp.nanosec)
    }
}

/// A decoded frame, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputImage {
    /// Pixel encoding.
    pub encoding: PixelEncoding,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bytes per line.
    pub stride: u32,
    /// Device capture time.
    pub timestamp: Timestamp,
    /// Coordinate frame label.
    pub frame_id: String,
    /// Device frame counter.
    pub sequence: u64,
    /// Pixel bytes, `stride * height` unless the device delivered less.
    pub data: Vec<u8>,
}

/// Classify `frame` and copy it into an [`OutputImage`].
pub fn decode(frame: &RawFrame<'_>, frame_id: &str) -> Result<OutputImage> {
    let encoding = classify(frame.bits_per_pixel, frame.color_filter)?;

    let expected = (frame.stride as usize).saturating_mul(frame.height as usize);
    let len = expected.min(frame.data.len());
    let data = frame.data.get(..len).unwrap_or_default().to_vec();

    Ok(OutputImage {
        encoding,
        width: frame.width,
        height: frame.height,
        stride: frame.stride,
        timestamp: Timestamp::from_nanos(frame.timestamp_ns),
        frame_id: frame_id.to_owned(),
        sequence: frame.frame_number,
        data,
    })
}
