use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Photo uploads are capped at 5 MB
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

const PHOTO_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// A file persisted under the uploads directory.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Public URL as served by the static route (e.g. "/uploads/171234-ab12cd34.jpg")
    pub url: String,
    pub path: PathBuf,
}

pub fn ensure_uploads_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// Lowercased extension of the original file name, if it is an allowed
/// photo format.
pub fn photo_extension(original_name: &str) -> Option<String> {
    let ext = Path::new(original_name)
        .extension()?
        .to_string_lossy()
        .to_lowercase();
    PHOTO_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Store an uploaded photo under the uploads directory.
///
/// Rejects disallowed extensions and oversized payloads; the stored name is
/// derived from the upload instant, never from the client-supplied name.
pub fn save_photo(dir: &Path, original_name: &str, bytes: &[u8]) -> anyhow::Result<StoredFile> {
    let ext = photo_extension(original_name)
        .ok_or_else(|| anyhow::anyhow!("Only image files are allowed (jpg, jpeg, png, gif)"))?;

    if bytes.len() > MAX_PHOTO_BYTES {
        anyhow::bail!(
            "Photo exceeds the {} MB upload limit",
            MAX_PHOTO_BYTES / (1024 * 1024)
        );
    }

    ensure_uploads_dir(dir)?;
    let file_name = format!(
        "{}-{}.{}",
        chrono::Utc::now().timestamp_millis(),
        &Uuid::new_v4().to_string()[..8],
        ext
    );
    let path = dir.join(&file_name);
    std::fs::write(&path, bytes)?;

    Ok(StoredFile {
        url: format!("/uploads/{}", file_name),
        path,
    })
}

/// Delete the file behind an /uploads URL, ignoring files already gone.
/// Only the final path component is used, so a stored URL can never point
/// outside the uploads directory.
pub fn remove_upload(dir: &Path, url: &str) -> anyhow::Result<()> {
    let file_name = match Path::new(url).file_name() {
        Some(name) => name.to_owned(),
        None => return Ok(()),
    };
    let path = dir.join(file_name);
    if path.exists() {
        std::fs::remove_file(&path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_extension_allows_images_only() {
        assert_eq!(photo_extension("me.JPG").as_deref(), Some("jpg"));
        assert_eq!(photo_extension("scan.png").as_deref(), Some("png"));
        assert_eq!(photo_extension("roster.xlsx"), None);
        assert_eq!(photo_extension("noext"), None);
    }

    #[test]
    fn save_and_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let stored = save_photo(dir.path(), "photo.png", b"fake-png").unwrap();
        assert!(stored.path.exists());
        assert!(stored.url.starts_with("/uploads/"));

        remove_upload(dir.path(), &stored.url).unwrap();
        assert!(!stored.path.exists());
        // A second removal is a no-op
        remove_upload(dir.path(), &stored.url).unwrap();
    }

    #[test]
    fn save_rejects_wrong_extension() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_photo(dir.path(), "virus.exe", b"data").unwrap_err();
        assert!(err.to_string().contains("image files"));
    }

    #[test]
    fn save_rejects_oversized_photo() {
        let dir = tempfile::tempdir().unwrap();
        let big = vec![0u8; MAX_PHOTO_BYTES + 1];
        assert!(save_photo(dir.path(), "big.jpg", &big).is_err());
    }
}
