use serde::{Deserialize, Serialize};

/// Response for the registration summary dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Registered students overall
    #[serde(rename = "totalStudents")]
    pub total_students: i64,
    /// Students with an issued (QR-bearing) ID card
    #[serde(rename = "totalCards")]
    pub total_cards: i64,
    /// Registrations within the last 7 days
    #[serde(rename = "newRegistrations")]
    pub new_registrations: i64,
    /// Distinct courses with at least one student
    #[serde(rename = "courseCount")]
    pub course_count: i64,
    #[serde(rename = "courseDistribution")]
    pub course_distribution: Vec<CourseCount>,
    #[serde(rename = "yearlyRegistration")]
    pub yearly_registration: Vec<YearCount>,
    /// Five most recently registered students
    #[serde(rename = "recentStudents")]
    pub recent_students: Vec<RecentStudent>,
}

/// Students per course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseCount {
    pub course: String,
    pub count: i64,
}

/// Registrations per year of joining
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearCount {
    pub year: i32,
    pub count: i64,
}

/// Compact listing entry for the dashboard's recent-registrations panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentStudent {
    pub id: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    #[serde(rename = "prnNumber")]
    pub prn_number: String,
    #[serde(rename = "courseName")]
    pub course_name: String,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}
