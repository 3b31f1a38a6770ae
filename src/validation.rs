//! Checks on decoded images, for integration testing against real or virtual
//! cameras.

use thiserror::Error;

use crate::decode::OutputImage;

/// A decoded image or image sequence failed a check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Buffer size or stride disagrees with the image geometry.
    #[error("bad layout: {0}")]
    Layout(String),
    /// Pixel content does not look like the expected pattern.
    #[error("bad content: {0}")]
    Content(String),
    /// Sequence numbers or timestamps are out of order.
    #[error("bad sequence: {0}")]
    Sequence(String),
}

/// Result type for validation helpers.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Check that `image` holds exactly `stride * height` bytes and that each
/// line is wide enough for its encoding.
pub fn validate_layout(image: &OutputImage) -> Result<()> {
    let min_stride = image.width * image.encoding.bytes_per_pixel();
    if image.stride < min_stride {
        return Err(ValidationError::Layout(format!(
            "stride {} is shorter than {} bytes needed for {}x{} {}",
            image.stride, min_stride, image.width, image.height, image.encoding
        )));
    }

    let expected = image.stride as usize * image.height as usize;
    if image.data.len() != expected {
        return Err(ValidationError::Layout(format!(
            "expected {expected} bytes, got {}",
            image.data.len()
        )));
    }
    Ok(())
}

/// Check that `image` is not a single flat value.
///
/// Catches devices that stream black or blank frames.
pub fn validate_not_flat(image: &OutputImage) -> Result<()> {
    let mut bytes = image.data.iter();
    let Some(first) = bytes.next() else {
        return Err(ValidationError::Content("image is empty".to_owned()));
    };
    if bytes.all(|byte| byte == first) {
        return Err(ValidationError::Content(format!("every byte is {first:#04x}")));
    }
    Ok(())
}

/// Check that the middle line of an 8-bit image rises from left to right by
/// at least `min_span`.
pub fn validate_gradient(image: &OutputImage, min_span: u8) -> Result<()> {
    if image.encoding.bytes_per_pixel() != 1 {
        return Err(ValidationError::Content(format!(
            "gradient check needs an 8-bit encoding, got {}",
            image.encoding
        )));
    }

    let start = (image.height / 2) as usize * image.stride as usize;
    let line = image
        .data
        .get(start..start + image.width as usize)
        .ok_or_else(|| ValidationError::Layout("middle line is out of bounds".to_owned()))?;

    if let Some(x) = line.windows(2).position(|pair| matches!(pair, [a, b] if b < a)) {
        return Err(ValidationError::Content(format!("gradient falls at x={}", x + 1)));
    }

    let span = match (line.first(), line.last()) {
        (Some(first), Some(last)) => last.saturating_sub(*first),
        _ => 0,
    };
    if span < min_span {
        return Err(ValidationError::Content(format!(
            "gradient spans {span}, expected at least {min_span}"
        )));
    }
    Ok(())
}

/// Check that sequence numbers increase by exactly one and timestamps never
/// go backwards.
pub fn validate_frame_sequence(images: &[OutputImage]) -> Result<()> {
    if images.is_empty() {
        return Err(ValidationError::Sequence(
            "cannot validate an empty sequence".to_owned(),
        ));
    }

    for (index, pair) in images.windows(2).enumerate() {
        let [prev, curr] = pair else { continue };
        if curr.sequence != prev.sequence + 1 {
            return Err(ValidationError::Sequence(format!(
                "gap at index {}: expected {}, got {}",
                index + 1,
                prev.sequence + 1,
                curr.sequence
            )));
        }
        if curr.timestamp < prev.timestamp {
            return Err(ValidationError::Sequence(format!(
                "timestamp goes backwards at index {}",
                index + 1
            )));
        }
    }
    Ok(())
}
