/// Borrowed interleaved RGB frame.
#[derive(Clone, Copy, Debug)]
pub struct RgbImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h*3
}

/// Owned interleaved RGB frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbImage {
    /// All-black image of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width * height * 3],
        }
    }

    /// Image where every pixel has the same color.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn view(&self) -> RgbImageView<'_> {
        RgbImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        self.view().pixel(x, y)
    }

    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let i = (y * self.width + x) * 3;
        self.data[i..i + 3].copy_from_slice(&rgb);
    }
}

impl RgbImageView<'_> {
    /// Expected buffer length for this view's dimensions.
    #[inline]
    pub fn expected_len(&self) -> usize {
        self.width * self.height * 3
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Iterate pixels in row-major order as `(x, y, [r, g, b])`.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, [u8; 3])> + '_ {
        let w = self.width.max(1);
        self.data
            .chunks_exact(3)
            .enumerate()
            .map(move |(i, px)| (i % w, i / w, [px[0], px[1], px[2]]))
    }
}

#[inline]
fn get_rgb(src: &RgbImageView<'_>, x: i32, y: i32) -> [f32; 3] {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return [0.0; 3];
    }
    let p = src.pixel(x as usize, y as usize);
    [p[0] as f32, p[1] as f32, p[2] as f32]
}

/// Bilinear RGB sample. Neighbours outside the frame read as black.
#[inline]
pub fn sample_bilinear_rgb(src: &RgbImageView<'_>, x: f32, y: f32) -> [f32; 3] {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_rgb(src, x0, y0);
    let (x1, y1) = (x0.saturating_add(1), y0.saturating_add(1));
    let p10 = get_rgb(src, x1, y0);
    let p01 = get_rgb(src, x0, y1);
    let p11 = get_rgb(src, x1, y1);

    let mut out = [0.0f32; 3];
    for c in 0..3 {
        let a = p00[c] + fx * (p10[c] - p00[c]);
        let b = p01[c] + fx * (p11[c] - p01[c]);
        out[c] = a + fy * (b - a);
    }
    out
}

#[inline]
pub fn sample_bilinear_rgb_u8(src: &RgbImageView<'_>, x: f32, y: f32) -> [u8; 3] {
    let v = sample_bilinear_rgb(src, x, y);
    [
        v[0].round().clamp(0.0, 255.0) as u8,
        v[1].round().clamp(0.0, 255.0) as u8,
        v[2].round().clamp(0.0, 255.0) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixels_iterate_row_major() {
        let mut img = RgbImage::new(3, 2);
        img.set_pixel(2, 1, [1, 2, 3]);
        let last = img.view().pixels().last().expect("non-empty");
        assert_eq!(last, (2, 1, [1, 2, 3]));
        assert_eq!(img.view().pixels().count(), 6);
    }

    #[test]
    fn bilinear_sample_on_integer_coords_is_exact() {
        let mut img = RgbImage::filled(4, 4, [10, 20, 30]);
        img.set_pixel(1, 2, [200, 100, 50]);
        assert_eq!(sample_bilinear_rgb_u8(&img.view(), 1.0, 2.0), [200, 100, 50]);
        assert_eq!(sample_bilinear_rgb_u8(&img.view(), 0.0, 0.0), [10, 20, 30]);
    }

    #[test]
    fn bilinear_sample_blends_with_black_outside() {
        let img = RgbImage::filled(2, 2, [100, 100, 100]);
        let v = sample_bilinear_rgb(&img.view(), -0.5, 0.0);
        assert!((v[0] - 50.0).abs() < 1e-4);
        assert_eq!(sample_bilinear_rgb_u8(&img.view(), -5.0, -5.0), [0, 0, 0]);
    }

    #[test]
    fn huge_coordinates_read_black() {
        let img = RgbImage::filled(2, 2, [100, 100, 100]);
        assert_eq!(sample_bilinear_rgb_u8(&img.view(), 3.4e10, 2.4e9), [0, 0, 0]);
        assert_eq!(sample_bilinear_rgb_u8(&img.view(), -3.4e10, f32::MAX), [0, 0, 0]);
    }
}
