use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentId(pub Uuid);

impl StudentId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for StudentId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(StudentId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    #[serde(flatten)]
    pub base: BaseAggregate<StudentId>,

    #[serde(rename = "photoUrl")]
    pub photo_url: Option<String>,

    #[serde(rename = "fullName")]
    pub full_name: String,

    pub address: String,

    #[serde(rename = "dateOfBirth")]
    pub date_of_birth: NaiveDate,

    #[serde(rename = "mobileNumber")]
    pub mobile_number: String,

    /// Permanent Registration Number, globally unique among students
    #[serde(rename = "prnNumber")]
    pub prn_number: String,

    #[serde(rename = "rollNumber")]
    pub roll_number: String,

    #[serde(rename = "yearOfJoining")]
    pub year_of_joining: i32,

    #[serde(rename = "courseName")]
    pub course_name: String,

    /// Reference to the generated QR code image (e.g. "/uploads/qr_P1.png")
    #[serde(rename = "qrCode")]
    pub qr_code: Option<String>,

    #[serde(rename = "cardValidity")]
    pub card_validity: Option<NaiveDate>,
}

impl Student {
    #[allow(clippy::too_many_arguments)]
    pub fn new_for_insert(
        full_name: String,
        address: String,
        date_of_birth: NaiveDate,
        mobile_number: String,
        prn_number: String,
        roll_number: String,
        year_of_joining: i32,
        course_name: String,
    ) -> Self {
        let id = StudentId::new_v4();
        let code = format!("STU-{}", &id.as_string()[..8]);

        Self {
            base: BaseAggregate::new(id, code),
            photo_url: None,
            full_name,
            address,
            date_of_birth,
            mobile_number,
            prn_number,
            roll_number,
            year_of_joining,
            course_name,
            qr_code: None,
            card_validity: None,
        }
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    /// Card validity runs one year from the given instant
    pub fn stamp_card_validity(&mut self, from: chrono::DateTime<chrono::Utc>) {
        let date = from.date_naive();
        let next_year = date
            .with_year(date.year() + 1)
            // Feb 29 has no counterpart next year
            .unwrap_or_else(|| date + chrono::Duration::days(365));
        self.card_validity = Some(next_year);
    }

    /// Apply form data on top of the stored record.
    /// `None` fields in the DTO leave the current value untouched.
    pub fn update(&mut self, dto: &StudentDto) {
        if let Some(full_name) = &dto.full_name {
            self.full_name = full_name.clone();
        }
        if let Some(address) = &dto.address {
            self.address = address.clone();
        }
        if let Some(date_of_birth) = dto.date_of_birth {
            self.date_of_birth = date_of_birth;
        }
        if let Some(mobile_number) = &dto.mobile_number {
            self.mobile_number = mobile_number.clone();
        }
        if let Some(prn_number) = &dto.prn_number {
            self.prn_number = prn_number.clone();
        }
        if let Some(roll_number) = &dto.roll_number {
            self.roll_number = roll_number.clone();
        }
        if let Some(year_of_joining) = dto.year_of_joining {
            self.year_of_joining = year_of_joining;
        }
        if let Some(course_name) = &dto.course_name {
            self.course_name = course_name.clone();
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.full_name.trim().is_empty() {
            return Err("Full name must not be empty".into());
        }
        if self.address.trim().is_empty() {
            return Err("Address must not be empty".into());
        }
        if self.prn_number.trim().is_empty() {
            return Err("PRN number must not be empty".into());
        }
        if self.roll_number.trim().is_empty() {
            return Err("Roll number must not be empty".into());
        }
        if self.course_name.trim().is_empty() {
            return Err("Course name must not be empty".into());
        }
        if self.mobile_number.len() != 10 || !self.mobile_number.chars().all(|c| c.is_ascii_digit())
        {
            return Err("Mobile number must be exactly 10 digits".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
        self.base.metadata.increment_version();
    }
}

impl AggregateRoot for Student {
    type Id = StudentId;

    fn id(&self) -> Self::Id {
        self.base.id
    }

    fn code(&self) -> &str {
        &self.base.code
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.base.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.base.metadata
    }

    fn aggregate_index() -> &'static str {
        "a001"
    }

    fn collection_name() -> &'static str {
        "student"
    }
}

// ============================================================================
// DTO
// ============================================================================
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StudentDto {
    pub id: Option<String>,
    #[serde(rename = "fullName")]
    pub full_name: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "dateOfBirth")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(rename = "mobileNumber")]
    pub mobile_number: Option<String>,
    #[serde(rename = "prnNumber")]
    pub prn_number: Option<String>,
    #[serde(rename = "rollNumber")]
    pub roll_number: Option<String>,
    #[serde(rename = "yearOfJoining")]
    pub year_of_joining: Option<i32>,
    #[serde(rename = "courseName")]
    pub course_name: Option<String>,
    #[serde(rename = "photoUrl")]
    pub photo_url: Option<String>,
}
