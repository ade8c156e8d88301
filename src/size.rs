use crate::error::HordeError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AspectRatio {
    #[default]
    Square,
    /// 16:9
    Landscape,
    /// 9:16
    Portrait,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 3] = [
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Portrait,
    ];

    /// Target dimensions before the safe-size downscale.
    pub fn base_dimensions(&self) -> ImageSize {
        match self {
            AspectRatio::Square => ImageSize::new(768, 768),
            AspectRatio::Landscape => ImageSize::new(1280, 720),
            AspectRatio::Portrait => ImageSize::new(720, 1280),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1/1",
            AspectRatio::Landscape => "16/9",
            AspectRatio::Portrait => "9/16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = HordeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1/1" | "1:1" | "square" => Ok(AspectRatio::Square),
            "16/9" | "16:9" | "landscape" => Ok(AspectRatio::Landscape),
            "9/16" | "9:16" | "portrait" => Ok(AspectRatio::Portrait),
            other => Err(HordeError::InvalidInput(format!(
                "Unknown aspect ratio: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn longest_side(&self) -> u32 {
        self.width.max(self.height)
    }

    /// Clamp each axis to `max_side` on its own. Never enlarges.
    pub fn clamp(&self, max_side: u32) -> Self {
        Self {
            width: self.width.min(max_side),
            height: self.height.min(max_side),
        }
    }

    /// Uniformly shrink so the longest side fits in `max_side`, rounding to the
    /// nearest pixel. Sizes that already fit are returned unchanged.
    pub fn fit_within(&self, max_side: u32) -> Self {
        let longest = self.longest_side();
        if longest == 0 {
            return *self;
        }
        let scale = (max_side as f64 / longest as f64).min(1.0);
        Self {
            width: (self.width as f64 * scale).round() as u32,
            height: (self.height as f64 * scale).round() as u32,
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Size to request for `ratio` without triggering the upfront kudos charge.
pub fn safe_size(ratio: AspectRatio, safe_max_side: u32) -> ImageSize {
    ratio.base_dimensions().fit_within(safe_max_side)
}
