use image::{GrayImage, Luma};
use qrcode::{Color, QrCode};
use std::io::Cursor;
use std::path::Path;

/// Pixels per QR module
const SCALE: u32 = 8;
/// Quiet zone around the code, in modules
const QUIET: u32 = 4;

/// Render a QR code for the payload as PNG bytes.
/// The mapping from payload to image is deterministic.
pub fn render_png(payload: &str) -> anyhow::Result<Vec<u8>> {
    let code = QrCode::new(payload.as_bytes())?;
    let width = code.width();
    let colors = code.to_colors();

    let size = (width as u32 + 2 * QUIET) * SCALE;
    let img = GrayImage::from_fn(size, size, |x, y| {
        let mx = (x / SCALE) as i64 - QUIET as i64;
        let my = (y / SCALE) as i64 - QUIET as i64;
        let dark = mx >= 0
            && my >= 0
            && (mx as usize) < width
            && (my as usize) < width
            && colors[my as usize * width + mx as usize] == Color::Dark;
        if dark {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    });

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// Render the payload and write it as a PNG file.
pub fn write_png(payload: &str, path: &Path) -> anyhow::Result<()> {
    let bytes = render_png(payload)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_produces_png_bytes() {
        let bytes = render_png("http://medical-college.edu/students/PRN2025001").unwrap();
        // PNG signature
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn render_is_deterministic() {
        let a = render_png("http://medical-college.edu/students/P1").unwrap();
        let b = render_png("http://medical-college.edu/students/P1").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qr_P1.png");
        write_png("http://medical-college.edu/students/P1", &path).unwrap();
        assert!(path.exists());
    }
}
