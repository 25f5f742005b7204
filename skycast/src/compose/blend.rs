//! Layer blending.

use std::fmt;
use std::str::FromStr;

use image::{Rgba, RgbaImage};

use super::error::ComposeError;

/// Green used to paint precipitation over satellite imagery.
pub const PRECIPITATION_GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

/// How strongly an overlay covers what is beneath it.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Opacity(f32);

impl Opacity {
    pub const OPAQUE: Opacity = Opacity(1.0);

    pub fn new(value: f32) -> Result<Self, ComposeError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ComposeError::InvalidOpacity(value.to_string()))
        }
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self::OPAQUE
    }
}

impl fmt::Display for Opacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Opacity {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f32 = s
            .trim()
            .parse()
            .map_err(|_| ComposeError::InvalidOpacity(s.to_string()))?;
        Opacity::new(value)
    }
}

/// Draws `layer` over `base` in place.
///
/// Straight-alpha source-over, with every layer pixel's alpha scaled by
/// `opacity`. Both images must have the same dimensions.
pub fn blend(
    base: &mut RgbaImage,
    layer: &RgbaImage,
    opacity: Opacity,
) -> Result<(), ComposeError> {
    if base.dimensions() != layer.dimensions() {
        return Err(ComposeError::SizeMismatch {
            base: base.dimensions(),
            layer: layer.dimensions(),
        });
    }

    for (dst, src) in base.pixels_mut().zip(layer.pixels()) {
        *dst = over(*dst, *src, opacity.value());
    }
    Ok(())
}

fn over(dst: Rgba<u8>, src: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let sa = f32::from(src[3]) / 255.0 * opacity;
    if sa <= 0.0 {
        return dst;
    }
    let da = f32::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);

    let mut out = [0u8; 4];
    for c in 0..3 {
        let value =
            (f32::from(src[c]) * sa + f32::from(dst[c]) * da * (1.0 - sa)) / out_a;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

/// Recolours `mask` to a solid colour, keeping each pixel's alpha.
pub fn tint(mask: &RgbaImage, colour: Rgba<u8>) -> RgbaImage {
    let mut out = mask.clone();
    for pixel in out.pixels_mut() {
        let alpha = (u16::from(pixel[3]) * u16::from(colour[3]) / 255) as u8;
        *pixel = Rgba([colour[0], colour[1], colour[2], alpha]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(colour: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(4, 4, Rgba(colour))
    }

    #[test]
    fn test_opacity_bounds() {
        assert!(Opacity::new(0.0).is_ok());
        assert!(Opacity::new(1.0).is_ok());
        assert!(Opacity::new(-0.1).is_err());
        assert!(Opacity::new(1.01).is_err());
        assert!(Opacity::new(f32::NAN).is_err());
        assert_eq!(Opacity::default(), Opacity::OPAQUE);
    }

    #[test]
    fn test_opacity_parse() {
        assert_eq!("0.7".parse::<Opacity>().unwrap().value(), 0.7);
        assert!("lots".parse::<Opacity>().is_err());
        assert!("2".parse::<Opacity>().is_err());
    }

    #[test]
    fn test_opaque_layer_replaces_base() {
        let mut base = solid([10, 20, 30, 255]);
        blend(&mut base, &solid([200, 100, 0, 255]), Opacity::OPAQUE).unwrap();
        assert_eq!(*base.get_pixel(0, 0), Rgba([200, 100, 0, 255]));
    }

    #[test]
    fn test_transparent_layer_keeps_base() {
        let mut base = solid([10, 20, 30, 255]);
        blend(&mut base, &solid([200, 100, 0, 0]), Opacity::OPAQUE).unwrap();
        assert_eq!(*base.get_pixel(3, 3), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_zero_opacity_keeps_base() {
        let mut base = solid([10, 20, 30, 255]);
        blend(&mut base, &solid([200, 100, 0, 255]), Opacity::new(0.0).unwrap()).unwrap();
        assert_eq!(*base.get_pixel(1, 1), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_half_opacity_mixes() {
        let mut base = solid([0, 0, 0, 255]);
        blend(&mut base, &solid([200, 100, 50, 255]), Opacity::new(0.5).unwrap()).unwrap();
        assert_eq!(*base.get_pixel(0, 0), Rgba([100, 50, 25, 255]));
    }

    #[test]
    fn test_layer_over_transparent_base() {
        let mut base = solid([0, 0, 0, 0]);
        blend(&mut base, &solid([200, 100, 50, 255]), Opacity::new(0.5).unwrap()).unwrap();
        let pixel = base.get_pixel(0, 0);
        assert_eq!(&pixel.0[..3], &[200, 100, 50]);
        assert_eq!(pixel[3], 128);
    }

    #[test]
    fn test_size_mismatch() {
        let mut base = RgbaImage::new(4, 4);
        let layer = RgbaImage::new(8, 8);
        assert_eq!(
            blend(&mut base, &layer, Opacity::OPAQUE),
            Err(ComposeError::SizeMismatch {
                base: (4, 4),
                layer: (8, 8)
            })
        );
    }

    #[test]
    fn test_tint_keeps_alpha() {
        let mut mask = RgbaImage::new(2, 1);
        mask.put_pixel(0, 0, Rgba([1, 2, 3, 0]));
        mask.put_pixel(1, 0, Rgba([9, 9, 9, 180]));
        let tinted = tint(&mask, PRECIPITATION_GREEN);
        assert_eq!(*tinted.get_pixel(0, 0), Rgba([0, 255, 0, 0]));
        assert_eq!(*tinted.get_pixel(1, 0), Rgba([0, 255, 0, 180]));
    }
}
