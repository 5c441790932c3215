use chrono::Utc;
use contracts::domain::a001_student::aggregate::{Student, StudentDto};
use contracts::domain::a001_student::{ImportReport, ImportRow};
use uuid::Uuid;

use super::bulk_import::{self, FileQrGenerator, QrGenerator, SqlStudentStore, StudentStore};
use super::repository;
use crate::shared::{config, uploads};

/// A photo uploaded alongside the registration form.
pub struct UploadedPhoto {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Register a single student: store the photo (if any), render the QR
/// image, stamp card validity and persist.
pub async fn create(dto: StudentDto, photo: Option<UploadedPhoto>) -> anyhow::Result<Student> {
    let mut aggregate = Student::new_for_insert(
        dto.full_name.clone().unwrap_or_default(),
        dto.address.clone().unwrap_or_default(),
        dto.date_of_birth
            .ok_or_else(|| anyhow::anyhow!("dateOfBirth is required"))?,
        dto.mobile_number.clone().unwrap_or_default(),
        dto.prn_number.clone().unwrap_or_default(),
        dto.roll_number.clone().unwrap_or_default(),
        dto.year_of_joining
            .ok_or_else(|| anyhow::anyhow!("yearOfJoining is required"))?,
        dto.course_name.clone().unwrap_or_default(),
    );

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.stamp_card_validity(Utc::now());

    let uploads_dir = config::uploads_dir();
    if let Some(photo) = photo {
        let stored = uploads::save_photo(&uploads_dir, &photo.file_name, &photo.bytes)?;
        aggregate.photo_url = Some(stored.url);
    }

    let payload = bulk_import::qr_payload(&config::get_config().qr.base_url, &aggregate.prn_number);
    let qr_ref = FileQrGenerator::new(uploads_dir)
        .generate(&payload)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    aggregate.qr_code = Some(qr_ref.0);

    let saved = SqlStudentStore
        .save(aggregate)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    Ok(saved)
}

/// Update a stored record; a newly uploaded photo replaces the old file.
pub async fn update(
    id: Uuid,
    dto: StudentDto,
    photo: Option<UploadedPhoto>,
) -> anyhow::Result<Option<Student>> {
    let mut aggregate = match repository::get_by_id(id).await? {
        Some(aggregate) => aggregate,
        None => return Ok(None),
    };

    aggregate.update(&dto);
    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;

    if let Some(photo) = photo {
        let uploads_dir = config::uploads_dir();
        let stored = uploads::save_photo(&uploads_dir, &photo.file_name, &photo.bytes)?;
        if let Some(old_url) = aggregate.photo_url.replace(stored.url) {
            uploads::remove_upload(&uploads_dir, &old_url)?;
        }
    }

    aggregate.before_write();
    repository::update(&aggregate).await?;
    Ok(Some(aggregate))
}

/// Delete the record and cascade to its photo and QR files.
pub async fn delete(id: Uuid) -> anyhow::Result<bool> {
    let aggregate = match repository::get_by_id(id).await? {
        Some(aggregate) => aggregate,
        None => return Ok(false),
    };

    let removed = repository::delete(id).await?;
    if removed {
        let uploads_dir = config::uploads_dir();
        if let Some(photo_url) = &aggregate.photo_url {
            uploads::remove_upload(&uploads_dir, photo_url)?;
        }
        if let Some(qr_url) = &aggregate.qr_code {
            uploads::remove_upload(&uploads_dir, qr_url)?;
        }
    }
    Ok(removed)
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Student>> {
    repository::get_by_id(id).await
}

pub async fn list_all() -> anyhow::Result<Vec<Student>> {
    repository::list_all().await
}

/// Run a parsed batch through the import pipeline against the production
/// collaborators. One shared import instant stamps the whole batch.
pub async fn import_rows(rows: Vec<ImportRow>) -> ImportReport {
    let store = SqlStudentStore;
    let qr_gen = FileQrGenerator::new(config::uploads_dir());
    bulk_import::import_batch(
        rows,
        &store,
        &qr_gen,
        &config::get_config().qr.base_url,
        Utc::now(),
    )
    .await
}

/// Students selected for card printing, in the requested order where found.
pub async fn find_for_print(ids: &[Uuid]) -> anyhow::Result<Vec<Student>> {
    repository::find_by_ids(ids).await
}

/// In-memory QR PNG for one student, for direct download/preview.
pub async fn qr_png(id: Uuid) -> anyhow::Result<Option<Vec<u8>>> {
    let student = match repository::get_by_id(id).await? {
        Some(student) => student,
        None => return Ok(None),
    };
    let payload = bulk_import::qr_payload(&config::get_config().qr.base_url, &student.prn_number);
    let bytes = crate::shared::qr::render_png(&payload)?;
    Ok(Some(bytes))
}
