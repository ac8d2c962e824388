use image::{ImageError, ImageReader};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use strum::{Display, EnumString};

/// Aspect ratios the image model can render.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    #[strum(serialize = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    #[strum(serialize = "3:4")]
    Portrait,
    #[serde(rename = "4:3")]
    #[strum(serialize = "4:3")]
    Landscape,
    #[serde(rename = "16:9")]
    #[strum(serialize = "16:9")]
    Widescreen,
    #[serde(rename = "9:16")]
    #[strum(serialize = "9:16")]
    Vertical,
}

impl AspectRatio {
    /// Map pixel dimensions to the closest supported ratio.
    ///
    /// Thresholds sit between neighbouring targets (16:9 = 1.78, 4:3 = 1.33,
    /// 1:1, 3:4 = 0.75, 9:16 = 0.56). Each bucket includes its lower bound.
    pub fn classify(width: u32, height: u32) -> Self {
        let ratio = f64::from(width) / f64::from(height);

        if ratio >= 1.55 {
            AspectRatio::Widescreen
        } else if ratio >= 1.15 {
            AspectRatio::Landscape
        } else if ratio >= 0.85 {
            AspectRatio::Square
        } else if ratio >= 0.65 {
            AspectRatio::Portrait
        } else {
            AspectRatio::Vertical
        }
    }

    /// Read the image header and classify its dimensions.
    pub fn detect(bytes: &[u8]) -> Result<Self, ImageError> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_dimensions()?;
        Ok(Self::classify(width, height))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Vertical => "9:16",
        }
    }
}
