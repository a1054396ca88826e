//! Shared test fixtures: an in-memory fetcher and image encoders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};
use topcolors::analysis::Fetcher;
use topcolors::error::{Error, Result};

#[derive(Clone)]
enum Response {
    Body(Vec<u8>),
    Fail,
    Hang,
}

/// Serves canned responses and records how it was called.
pub struct MockFetcher {
    responses: HashMap<String, Response>,
    fallback: Option<Vec<u8>>,
    delay: Duration,
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    per_url: Mutex<HashMap<String, usize>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            fallback: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            per_url: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_body(mut self, url: &str, body: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), Response::Body(body));
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.responses.insert(url.to_string(), Response::Fail);
        self
    }

    pub fn hanging(mut self, url: &str) -> Self {
        self.responses.insert(url.to_string(), Response::Hang);
        self
    }

    /// Body served for any URL without its own response.
    pub fn fallback(mut self, body: Vec<u8>) -> Self {
        self.fallback = Some(body);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.per_url.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .per_url
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let response = self
            .responses
            .get(url)
            .cloned()
            .or_else(|| self.fallback.clone().map(Response::Body));

        let result = match response {
            Some(Response::Body(body)) => Ok(body),
            Some(Response::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
            Some(Response::Fail) | None => Err(Error::Fetch {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Encode an 8-bit RGB raster (row-major) as PNG.
pub fn png_rgb8(width: u32, height: u32, pixels: &[[u8; 3]]) -> Vec<u8> {
    assert_eq!(pixels.len(), (width * height) as usize);
    let img = RgbImage::from_fn(width, height, |x, y| Rgb(pixels[(y * width + x) as usize]));
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Png)
}

/// Encode a single-color 16-bit RGB raster as PNG.
pub fn png_rgb16_solid(width: u32, height: u32, color: [u16; 3]) -> Vec<u8> {
    let img: ImageBuffer<Rgb<u16>, Vec<u16>> = ImageBuffer::from_pixel(width, height, Rgb(color));
    encode(DynamicImage::ImageRgb16(img), ImageFormat::Png)
}

/// Encode a single-color 8-bit RGB raster as baseline JPEG. Lossy, so
/// decoded channels may drift a few units from `color`.
pub fn jpeg_solid(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).expect("image encoding");
    buf.into_inner()
}

/// The 2x2 fixture: white, white, black, red.
pub fn two_by_two() -> Vec<u8> {
    png_rgb8(
        2,
        2,
        &[[255, 255, 255], [255, 255, 255], [0, 0, 0], [255, 0, 0]],
    )
}
