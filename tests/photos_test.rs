//! Integration tests for photo serving and on-the-fly scaling.

mod common;

use std::io::Cursor;

use common::TestHarness;
use image::{ImageBuffer, ImageFormat, Rgb};
use serde_json::Value;

/// Generate a PNG with the given dimensions.
fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128u8])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Create a listing with the given photo bytes and return the photo key.
async fn listing_with_photo(addr: std::net::SocketAddr, photo: Vec<u8>) -> String {
    let form = reqwest::multipart::Form::new()
        .text("title", "With photo")
        .text("description", "")
        .text("price", "10.00")
        .part(
            "photos",
            reqwest::multipart::Part::bytes(photo).file_name("photo.png"),
        );

    let client = reqwest::Client::new();
    let created: Value = client
        .post(format!("http://{addr}/listings"))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    created["photos"][0]["key"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn original_photo_is_served_byte_for_byte() {
    let (_h, addr) = TestHarness::with_server().await;

    let original = png_bytes(40, 30);
    let key = listing_with_photo(addr, original.clone()).await;

    let resp = reqwest::get(format!("http://{addr}/photos/{key}")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "image/png"
    );
    assert_eq!(
        resp.headers().get("cache-control").unwrap(),
        "private, max-age=86400"
    );
    let body = resp.bytes().await.unwrap();
    assert_eq!(body.as_ref(), original.as_slice());
}

#[tokio::test]
async fn width_zero_also_serves_original() {
    let (_h, addr) = TestHarness::with_server().await;

    let original = png_bytes(40, 30);
    let key = listing_with_photo(addr, original.clone()).await;

    let resp = reqwest::get(format!("http://{addr}/photos/{key}?width=0"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = resp.bytes().await.unwrap();
    assert_eq!(body.as_ref(), original.as_slice());
}

#[tokio::test]
async fn scaled_photo_is_jpeg_with_requested_longer_side() {
    let (_h, addr) = TestHarness::with_server().await;

    let key = listing_with_photo(addr, png_bytes(400, 200)).await;

    let resp = reqwest::get(format!("http://{addr}/photos/{key}?width=100"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "image/jpeg"
    );
    let body = resp.bytes().await.unwrap();
    let scaled = image::load_from_memory(&body).unwrap();
    assert_eq!(scaled.width(), 100);
    assert_eq!(scaled.height(), 50);
}

#[tokio::test]
async fn portrait_photo_scales_on_height() {
    let (_h, addr) = TestHarness::with_server().await;

    let key = listing_with_photo(addr, png_bytes(200, 400)).await;

    let resp = reqwest::get(format!("http://{addr}/photos/{key}?width=100"))
        .await
        .unwrap();
    let body = resp.bytes().await.unwrap();
    let scaled = image::load_from_memory(&body).unwrap();
    assert_eq!(scaled.height(), 100);
    assert_eq!(scaled.width(), 50);
}

#[tokio::test]
async fn unknown_photo_key_is_404() {
    let (_h, addr) = TestHarness::with_server().await;

    let resp = reqwest::get(format!(
        "http://{addr}/photos/{}",
        "0".repeat(32)
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn malformed_photo_key_is_404() {
    let (_h, addr) = TestHarness::with_server().await;

    let resp = reqwest::get(format!("http://{addr}/photos/..%2F..%2Fetc%2Fpasswd"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn undecodable_blob_with_width_is_500() {
    let (_h, addr) = TestHarness::with_server().await;

    // Upload bytes that are not an image. Serving the original still works,
    // but asking for a scaled variant fails at decode time.
    let key = listing_with_photo(addr, b"definitely not an image".to_vec()).await;

    let resp = reqwest::get(format!("http://{addr}/photos/{key}?width=100"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Internal server error");
}
