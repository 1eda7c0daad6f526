//! Image references handed over by the external image source.

/// Unique identifier for an image.
pub type ImageId = String;

/// Descriptor for an image, as provided by the image source.
///
/// The core never loads pixels; it only needs the id to scope stores and
/// feed subscriptions, and the dimensions/URL for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub id: ImageId,
    pub url: String,
    /// Pixel width of the image
    pub width: u32,
    /// Pixel height of the image
    pub height: u32,
}

impl ImageRef {
    pub fn new(id: impl Into<ImageId>, url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            width,
            height,
        }
    }
}
