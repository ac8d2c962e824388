//! Test fixtures: synthetic start frames at representative resolutions

#![allow(dead_code)]

use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// A start frame with the ratio the classifier must pick for it
#[derive(Debug, Clone)]
pub struct FrameFixture {
    pub filename: &'static str,
    pub width: u32,
    pub height: u32,
    pub expected_ratio: &'static str,
    pub description: &'static str,
}

pub const FRAME_FIXTURES: &[FrameFixture] = &[
    FrameFixture {
        filename: "landscape_1080p.png",
        width: 192,
        height: 108,
        expected_ratio: "16:9",
        description: "1920x1080 scaled down, ratio 1.778",
    },
    FrameFixture {
        filename: "square_post.png",
        width: 80,
        height: 80,
        expected_ratio: "1:1",
        description: "800x800 scaled down, ratio 1.0",
    },
    FrameFixture {
        filename: "portrait_tablet.png",
        width: 96,
        height: 128,
        expected_ratio: "3:4",
        description: "768x1024 scaled down, ratio 0.75",
    },
    FrameFixture {
        filename: "classic_tv.png",
        width: 128,
        height: 96,
        expected_ratio: "4:3",
        description: "1024x768 scaled down, ratio 1.333",
    },
    FrameFixture {
        filename: "phone_story.png",
        width: 108,
        height: 192,
        expected_ratio: "9:16",
        description: "1080x1920 scaled down, ratio 0.5625",
    },
    FrameFixture {
        filename: "boundary_wide.png",
        width: 155,
        height: 100,
        expected_ratio: "16:9",
        description: "Exactly 1.55, lower bound of 16:9",
    },
    FrameFixture {
        filename: "boundary_tall.png",
        width: 65,
        height: 100,
        expected_ratio: "3:4",
        description: "Exactly 0.65, lower bound of 3:4",
    },
];

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format)
        .expect("encode fixture image");
    bytes
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

impl FrameFixture {
    pub fn bytes(&self) -> Vec<u8> {
        png_bytes(self.width, self.height)
    }
}
