use image::{GenericImageView, GrayImage, ImageBuffer, Rgb, RgbImage};

pub use image::imageops::colorops::grayscale;

pub const WHITE: u8 = u8::MAX;
pub const BLACK: u8 = u8::MIN;

pub fn filled(width: u32, height: u32, red: u8, green: u8, blue: u8) -> RgbImage {
    let mut buf = ImageBuffer::new(width, height);
    buf.enumerate_pixels_mut()
        .for_each(|(_, _, pixel)| *pixel = image::Rgb([red, green, blue]));
    buf
}

pub fn construct_gray(raw: &[&[u8]]) -> GrayImage {
    assert!(raw.windows(2).all(|w| w[0].len() == w[1].len()));
    let height = raw.len() as u32;
    let width = raw.iter().next().map(|row| row.len()).unwrap_or(0) as u32;
    GrayImage::from_fn(width, height, |x, y| {
        image::Luma([raw[y as usize][x as usize]])
    })
}

/// Copies the rows `[start_y, end_y)` into a new image.
pub fn crop_rows(img: &RgbImage, start_y: u32, end_y: u32) -> RgbImage {
    assert!(start_y <= end_y && end_y <= img.height());
    image::imageops::crop_imm(img, 0, start_y, img.width(), end_y - start_y).to_image()
}

/// Number of non-black pixels in a binary mask.
pub fn mask_population(mask: &GrayImage) -> u32 {
    mask.pixels().filter(|p| p[0] != BLACK).count() as u32
}

// https://sighack.com/post/averaging-rgb-colors-the-right-way
pub fn average_color<I>(img: &I) -> Rgb<u8>
where
    I: GenericImageView<Pixel = Rgb<u8>>,
{
    let mut sums = [0u64; 3];
    let mut count = 0u64;

    img.pixels().for_each(|(_, _, rgb)| {
        for c in 0..3 {
            sums[c] += rgb[c] as u64 * rgb[c] as u64;
        }
        count += 1;
    });

    if count == 0 {
        return Rgb([0, 0, 0]);
    }

    let mut avg = [0u8; 3];
    for c in 0..3 {
        avg[c] = (sums[c] as f64 / count as f64).sqrt() as u8;
    }
    Rgb(avg)
}

/// RGB to HSV on the same scale opencv uses for 8-bit images, i.e., hue in
/// `[0, 180]` and saturation/value in `[0, 255]`.
pub fn rgb_to_hsv(rgb: Rgb<u8>) -> [u8; 3] {
    let r = rgb[0] as f32;
    let g = rgb[1] as f32;
    let b = rgb[2] as f32;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let value = max;
    let saturation = if max == 0.0 { 0.0 } else { 255.0 * delta / max };

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let hue = if hue < 0.0 { hue + 360.0 } else { hue } / 2.0;

    [
        hue.round() as u8,
        saturation.round() as u8,
        value.round() as u8,
    ]
}
