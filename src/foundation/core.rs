use crate::foundation::error::{PagError, PagResult};

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Geometric state of a layer in its parent's coordinate space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerTransform2D {
    pub position: Vec2,
    pub anchor: Vec2, // pivot in layer-local space
    pub scale: Vec2,  // default (1,1)
    pub rotation_deg: f64,
}

impl Default for LayerTransform2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            anchor: Vec2::ZERO,
            scale: Vec2::new(1.0, 1.0),
            rotation_deg: 0.0,
        }
    }
}

impl LayerTransform2D {
    pub fn to_affine(self) -> Affine {
        let t_position = Affine::translate(self.position);
        let t_rotate = Affine::rotate(self.rotation_deg.to_radians());
        let t_scale = Affine::scale_non_uniform(self.scale.x, self.scale.y);
        let t_unanchor = Affine::translate(-self.anchor);

        // Canonical order: T(position) * R(rot) * S(scale) * T(-anchor)
        t_position * t_rotate * t_scale * t_unanchor
    }
}

/// Timeline sampling for frame-by-frame output.
///
/// `total_frames = floor(duration_secs * fps)` and frame `i` maps to progress
/// `i / max(total_frames - 1, 1)`, so a single-frame document renders at progress 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTiming {
    pub duration_secs: f64,
    pub fps: f64,
}

impl FrameTiming {
    pub fn new(duration_secs: f64, fps: f64) -> PagResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(PagError::validation("fps must be finite and > 0"));
        }
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(PagError::validation("duration must be finite and >= 0"));
        }
        Ok(Self { duration_secs, fps })
    }

    pub fn from_micros(duration_micros: i64, fps: f64) -> PagResult<Self> {
        Self::new(duration_micros as f64 / 1_000_000.0, fps)
    }

    pub fn total_frames(self) -> u64 {
        (self.duration_secs * self.fps).floor().max(0.0) as u64
    }

    pub fn progress_at(self, frame: u64) -> f64 {
        let denom = self.total_frames().saturating_sub(1).max(1);
        (frame as f64 / denom as f64).clamp(0.0, 1.0)
    }
}

/// Read-back pixels of one rendered frame.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Copy of the pixel data with straight (non-premultiplied) alpha.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if !self.premultiplied {
            return out;
        }
        for px in out.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
