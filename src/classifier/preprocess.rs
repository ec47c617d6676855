//! Image-to-tensor conversion for the disease classifier.
//!
//! The model expects NHWC float input: pixels in row-major order with
//! interleaved R,G,B channels, each channel scaled to [0,1]. Unlike
//! ImageNet-style pipelines there is no per-channel mean/std; the model
//! was trained on raw /255 input.

use image::DynamicImage;
use ndarray::Array4;
use tract_onnx::prelude::*;

const IMAGE_MEAN: f32 = 0.0;
const IMAGE_STD: f32 = 255.0;

/// Resize an image to `input_size` x `input_size` (non-uniform scale) and
/// convert it to a `[1, H, W, 3]` float tensor.
///
/// No EXIF orientation correction is applied; the caller gets the pixels
/// exactly as decoded.
pub fn image_to_tensor(img: &DynamicImage, input_size: u32) -> Tensor {
    let resized = img.resize_exact(input_size, input_size, image::imageops::FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let side = input_size as usize;
    Array4::from_shape_fn((1, side, side, 3), |(_, y, x, c)| {
        let pixel = rgb.get_pixel(x as u32, y as u32);
        (pixel[c] as f32 - IMAGE_MEAN) / IMAGE_STD
    })
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_image(side: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_pixel(side, side, image::Rgb(rgb)))
    }

    #[test]
    fn test_tensor_shape() {
        let img = uniform_image(224, [0, 0, 0]);
        let tensor = image_to_tensor(&img, 224);
        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
        assert_eq!(tensor.len(), 3 * 224 * 224);
    }

    #[test]
    fn test_uniform_image_normalization() {
        let img = uniform_image(224, [100, 150, 200]);
        let tensor = image_to_tensor(&img, 224);
        let view = tensor.to_array_view::<f32>().unwrap();
        let values = view.as_slice().unwrap();

        let expected = [100.0 / 255.0, 150.0 / 255.0, 200.0 / 255.0];
        for triplet in values.chunks_exact(3) {
            for (got, want) in triplet.iter().zip(expected.iter()) {
                assert!((got - want).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_resizes_arbitrary_input() {
        let img = uniform_image(640, [10, 20, 30]);
        let tensor = image_to_tensor(&img, 224);
        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
    }
}
