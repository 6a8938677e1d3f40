use crate::detection::Blob;
use ndarray::Array2;

/// Single channel image, indexed `[row, column]`
pub type GrayImage = Array2<u8>;

/// Segmentation result for one frame of the stream
pub struct Frame {
    pub dims: (u32, u32),
    pub blobs: Vec<Blob>,
    pub index: u64,
}

impl Frame {
    pub fn new(index: u64, dims: (u32, u32), blobs: Vec<Blob>) -> Self {
        Self { dims, blobs, index }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.dims.0 as f32
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.dims.1 as f32
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Blob> {
        self.blobs.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

/// (width, height) of an image
#[inline]
pub fn image_dims(img: &GrayImage) -> (usize, usize) {
    let (rows, cols) = img.dim();
    (cols, rows)
}
