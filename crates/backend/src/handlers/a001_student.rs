use axum::{
    extract::{Multipart, Path},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::a001_student::{self, bulk_import, service::UploadedPhoto};
use contracts::domain::a001_student::aggregate::{Student, StudentDto};
use contracts::domain::a001_student::ImportReport;

/// Registration form fields plus the optional photo file, collected from
/// one multipart request.
struct StudentForm {
    dto: StudentDto,
    photo: Option<UploadedPhoto>,
}

async fn collect_student_form(multipart: &mut Multipart) -> anyhow::Result<StudentForm> {
    let mut dto = StudentDto::default();
    let mut photo = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "photo" {
            let file_name = field.file_name().unwrap_or("photo").to_string();
            let bytes = field.bytes().await?;
            if !bytes.is_empty() {
                photo = Some(UploadedPhoto {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field.text().await?;
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        match name.as_str() {
            "fullName" => dto.full_name = Some(value),
            "address" => dto.address = Some(value),
            "dateOfBirth" => {
                let date = NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                    .map_err(|_| anyhow::anyhow!("'{}' is not a valid date", value))?;
                dto.date_of_birth = Some(date);
            }
            "mobileNumber" => dto.mobile_number = Some(value),
            "prnNumber" => dto.prn_number = Some(value),
            "rollNumber" => dto.roll_number = Some(value),
            "yearOfJoining" => {
                let year = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("'{}' is not a valid year", value))?;
                dto.year_of_joining = Some(year);
            }
            "courseName" => dto.course_name = Some(value),
            _ => {}
        }
    }

    Ok(StudentForm { dto, photo })
}

/// GET /api/students
pub async fn list_all() -> Result<Json<Vec<Student>>, StatusCode> {
    match a001_student::service::list_all().await {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            tracing::error!("Failed to list students: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/students/:id
pub async fn get_by_id(Path(id): Path<String>) -> Result<Json<Student>, StatusCode> {
    let uuid = match uuid::Uuid::parse_str(&id) {
        Ok(uuid) => uuid,
        Err(_) => return Err(StatusCode::BAD_REQUEST),
    };
    match a001_student::service::get_by_id(uuid).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to fetch student {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /api/students
pub async fn create(mut multipart: Multipart) -> Result<impl IntoResponse, StatusCode> {
    let form = match collect_student_form(&mut multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!("Rejected registration form: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    match a001_student::service::create(form.dto, form.photo).await {
        Ok(student) => Ok((StatusCode::CREATED, Json(student))),
        Err(e) => {
            tracing::error!("Failed to register student: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// PUT /api/students/:id
pub async fn update(
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Student>, StatusCode> {
    let uuid = match uuid::Uuid::parse_str(&id) {
        Ok(uuid) => uuid,
        Err(_) => return Err(StatusCode::BAD_REQUEST),
    };
    let form = match collect_student_form(&mut multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!("Rejected update form: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    match a001_student::service::update(uuid, form.dto, form.photo).await {
        Ok(Some(student)) => Ok(Json(student)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to update student {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// DELETE /api/students/:id
pub async fn delete(Path(id): Path<String>) -> Result<Json<DeleteResponse>, StatusCode> {
    let uuid = match uuid::Uuid::parse_str(&id) {
        Ok(uuid) => uuid,
        Err(_) => return Err(StatusCode::BAD_REQUEST),
    };
    match a001_student::service::delete(uuid).await {
        Ok(true) => Ok(Json(DeleteResponse {
            message: "Student deleted successfully".into(),
        })),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to delete student {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /api/students/bulk
///
/// Accepts a multipart CSV upload. An unparseable file is the only
/// batch-fatal condition and is reported as 400 before the batch runs;
/// every parsed row lands in the returned report.
pub async fn bulk_import(mut multipart: Multipart) -> Result<Json<ImportReport>, StatusCode> {
    let mut csv_text = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Broken multipart upload: {}", e);
                return Err(StatusCode::BAD_REQUEST);
            }
        };
        let is_file = field.file_name().is_some() || field.name() == Some("bulkFile");
        if !is_file {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_lowercase();
        if !file_name.ends_with(".csv") {
            tracing::warn!("Rejected bulk upload '{}': only CSV is accepted", file_name);
            return Err(StatusCode::BAD_REQUEST);
        }
        match field.bytes().await {
            Ok(bytes) => csv_text = Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                tracing::warn!("Failed to read bulk upload: {}", e);
                return Err(StatusCode::BAD_REQUEST);
            }
        }
    }

    let csv_text = csv_text.ok_or(StatusCode::BAD_REQUEST)?;
    let rows = match bulk_import::parse_csv_rows(&csv_text) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("Unparseable bulk upload: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    tracing::info!("Bulk import started with {} rows", rows.len());
    let report = a001_student::service::import_rows(rows).await;
    tracing::info!(
        "Bulk import finished: {} ok, {} failed of {}",
        report.success,
        report.errors,
        report.total
    );
    Ok(Json(report))
}

/// GET /api/students/:id/qr-code
pub async fn qr_code(Path(id): Path<String>) -> Result<impl IntoResponse, StatusCode> {
    let uuid = match uuid::Uuid::parse_str(&id) {
        Ok(uuid) => uuid,
        Err(_) => return Err(StatusCode::BAD_REQUEST),
    };
    match a001_student::service::qr_png(uuid).await {
        Ok(Some(bytes)) => Ok(([(header::CONTENT_TYPE, "image/png")], bytes)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to render QR for {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Deserialize)]
pub struct PrintRequest {
    pub ids: Vec<String>,
}

#[derive(Serialize)]
pub struct PrintResponse {
    pub message: String,
    #[serde(rename = "printJobId")]
    pub print_job_id: String,
    pub cards: Vec<Student>,
}

/// POST /api/students/print
pub async fn print_cards(
    Json(request): Json<PrintRequest>,
) -> Result<Json<PrintResponse>, StatusCode> {
    if request.ids.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mut ids = Vec::with_capacity(request.ids.len());
    for raw in &request.ids {
        match uuid::Uuid::parse_str(raw) {
            Ok(uuid) => ids.push(uuid),
            Err(_) => return Err(StatusCode::BAD_REQUEST),
        }
    }

    match a001_student::service::find_for_print(&ids).await {
        Ok(cards) => Ok(Json(PrintResponse {
            message: format!("{} ID cards prepared for printing", cards.len()),
            print_job_id: format!("print-{}", chrono::Utc::now().timestamp_millis()),
            cards,
        })),
        Err(e) => {
            tracing::error!("Failed to prepare print job: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
