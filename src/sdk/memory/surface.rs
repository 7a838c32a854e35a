use crate::{
    foundation::core::{Affine, FrameRGBA, Point, Rect},
    sdk::OffscreenSurface,
    sdk::memory::MemoryImage,
};

pub type PremulRgba8 = [u8; 4];

/// CPU render target holding premultiplied RGBA8 pixels.
#[derive(Clone, Debug)]
pub struct MemorySurface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl MemorySurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Draw `img` with `to_surface` mapping image pixels to surface pixels.
    ///
    /// Nearest sampling at pixel centers; source-over with `alpha` as layer opacity.
    pub fn draw_image(&mut self, img: &MemoryImage, to_surface: Affine, alpha: u8) {
        if alpha == 0 || img.width == 0 || img.height == 0 {
            return;
        }
        if to_surface.determinant().abs() < 1e-12 {
            return;
        }
        let inverse = to_surface.inverse();
        let src_rect = Rect::new(0.0, 0.0, f64::from(img.width), f64::from(img.height));
        let bbox = to_surface
            .transform_rect_bbox(src_rect)
            .intersect(Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height)));
        if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
            return;
        }

        let x0 = bbox.x0.floor().max(0.0) as u32;
        let y0 = bbox.y0.floor().max(0.0) as u32;
        let x1 = (bbox.x1.ceil() as u32).min(self.width);
        let y1 = (bbox.y1.ceil() as u32).min(self.height);
        let opacity = f32::from(alpha) / 255.0;

        for y in y0..y1 {
            for x in x0..x1 {
                let src = inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if src.x < 0.0 || src.y < 0.0 {
                    continue;
                }
                let (sx, sy) = (src.x.floor() as u32, src.y.floor() as u32);
                if sx >= img.width || sy >= img.height {
                    continue;
                }
                let i = (y as usize * self.width as usize + x as usize) * 4;
                let dst = [
                    self.data[i],
                    self.data[i + 1],
                    self.data[i + 2],
                    self.data[i + 3],
                ];
                let out = over(dst, img.pixel(sx, sy), opacity);
                self.data[i..i + 4].copy_from_slice(&out);
            }
        }
    }
}

impl OffscreenSurface for MemorySurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn read_pixels(&self) -> Option<FrameRGBA> {
        Some(FrameRGBA {
            width: self.width,
            height: self.height,
            data: self.data.clone(),
            premultiplied: true,
        })
    }
}

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../../tests/unit/sdk/surface.rs"]
mod tests;
