use std::path::Path;

use image::{imageops::FilterType, Rgb, RgbImage};
use wide::f32x8;

use crate::error::{Error, Result};

/// Options for [`load_and_prep_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepOptions {
    /// Side of the square the image is resized to.
    pub img_shape: u32,
    /// Divide pixel values by 255 so they land in `[0, 1]`.
    pub scale: bool,
}

impl Default for PrepOptions {
    fn default() -> Self {
        Self {
            img_shape: 224,
            scale: true,
        }
    }
}

/// An RGB image as `height x width x 3` floats, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    height: usize,
    width: usize,
    data: Box<[f32]>,
    scaled: bool,
}

impl ImageTensor {
    pub const CHANNELS: usize = 3;

    fn from_rgb(img: &RgbImage, scale: bool) -> Self {
        let mut data: Box<[f32]> = img.as_raw().iter().map(|&v| v as f32).collect();
        if scale {
            scale_in_place(&mut data, 1.0 / 255.0);
        }
        Self {
            height: img.height() as usize,
            width: img.width() as usize,
            data,
            scaled: scale,
        }
    }

    /// `[height, width, channels]`
    pub fn shape(&self) -> [usize; 3] {
        [self.height, self.width, Self::CHANNELS]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn get(&self, y: usize, x: usize, channel: usize) -> f32 {
        self.data[(y * self.width + x) * Self::CHANNELS + channel]
    }

    pub fn is_scaled(&self) -> bool {
        self.scaled
    }

    /// Smallest and largest value in the tensor.
    pub fn value_range(&self) -> (f32, f32) {
        self.data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Converts back to 8-bit pixels for display.
    pub fn to_rgb_image(&self) -> RgbImage {
        let factor = if self.scaled { 255.0 } else { 1.0 };
        let mut img = RgbImage::new(self.width as u32, self.height as u32);
        for (i, px) in self.data.chunks_exact(Self::CHANNELS).enumerate() {
            let to_u8 = |v: f32| (v * factor).round().clamp(0.0, 255.0) as u8;
            let (x, y) = ((i % self.width) as u32, (i / self.width) as u32);
            img.put_pixel(x, y, Rgb([to_u8(px[0]), to_u8(px[1]), to_u8(px[2])]));
        }
        img
    }
}

/// Multiplies every value by `factor`, eight lanes at a time.
fn scale_in_place(data: &mut [f32], factor: f32) {
    let lanes = f32x8::splat(factor);
    let mut chunks = data.chunks_exact_mut(8);
    for chunk in &mut chunks {
        let mut block = [0f32; 8];
        block.copy_from_slice(chunk);
        chunk.copy_from_slice(&(f32x8::from(block) * lanes).to_array());
    }
    for v in chunks.into_remainder() {
        *v *= factor;
    }
}

/// Reads the image at `path`, resizes it to `img_shape x img_shape` RGB and
/// optionally scales its values into `[0, 1]`.
pub fn load_and_prep_image(path: impl AsRef<Path>, options: PrepOptions) -> Result<ImageTensor> {
    if options.img_shape == 0 {
        return Err(Error::invalid("img_shape must be greater than zero"));
    }
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let img = image::load_from_memory(&bytes)?;
    let resized = img
        .resize_exact(options.img_shape, options.img_shape, FilterType::Triangle)
        .to_rgb8();

    tracing::debug!(
        path = %path.display(),
        original = ?(img.width(), img.height()),
        size = options.img_shape,
        "prepared image"
    );
    Ok(ImageTensor::from_rgb(&resized, options.scale))
}
