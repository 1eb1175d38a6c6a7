//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use filtered_image_server::{HttpServer, Shutdown};
use image::{DynamicImage, ImageFormat, Luma, Rgb, RgbImage};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// PNG of a single grey level.
pub fn solid_png(level: u8) -> Vec<u8> {
    let img = image::GrayImage::from_pixel(32, 32, Luma([level]));
    encode_png(DynamicImage::ImageLuma8(img))
}

/// Colourful PNG gradient.
pub fn gradient_png() -> Vec<u8> {
    let img = RgbImage::from_fn(48, 24, |x, y| Rgb([(x * 5) as u8, (y * 10) as u8, 120]));
    encode_png(DynamicImage::ImageRgb8(img))
}

fn encode_png(img: DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
    buf
}

/// Start a mock image origin on an ephemeral port.
///
/// Routes:
/// - `/missing*` → 404
/// - `/dark.png` → solid PNG, level 20
/// - `/light.png` → solid PNG, level 230
/// - `/not-image.txt` → 200 with a text body
/// - anything else → gradient PNG
///
/// HEAD gets the same status and headers with no body.
pub async fn start_image_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let Some((method, path)) = read_request_line(&mut socket).await else {
                            return;
                        };
                        let (status, content_type, body) = route(&path);
                        let head = format!(
                            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            status,
                            content_type,
                            body.len()
                        );
                        let _ = socket.write_all(head.as_bytes()).await;
                        if method != "HEAD" {
                            let _ = socket.write_all(&body).await;
                        }
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

fn route(path: &str) -> (&'static str, &'static str, Vec<u8>) {
    if path.starts_with("/missing") {
        ("404 Not Found", "text/plain", b"not found".to_vec())
    } else if path == "/dark.png" {
        ("200 OK", "image/png", solid_png(20))
    } else if path == "/light.png" {
        ("200 OK", "image/png", solid_png(230))
    } else if path == "/not-image.txt" {
        ("200 OK", "text/plain", b"definitely not pixels".to_vec())
    } else {
        ("200 OK", "image/png", gradient_png())
    }
}

async fn read_request_line(socket: &mut tokio::net::TcpStream) -> Option<(String, String)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let text = String::from_utf8_lossy(&buf);
    let mut parts = text.lines().next()?.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();
    Some((method, path))
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Run `server` on an ephemeral port. Trigger the returned [`Shutdown`] to stop it.
pub async fn start_server(server: HttpServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}

/// Poll `check` until it returns true or two seconds pass.
pub async fn eventually<F: FnMut() -> bool>(mut check: F) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

/// Number of entries in `dir` (0 if it doesn't exist).
pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

/// Test client that never goes through a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
