use chrono::{Duration, Utc};
use contracts::dashboards::d100_registration_summary::dto::{
    CourseCount, DashboardStats, RecentStudent, YearCount,
};
use contracts::domain::common::AggregateId;

use super::repository;
use crate::domain::a001_student;

const RECENT_LIMIT: u64 = 5;

/// Assemble the registration summary from live aggregation queries.
pub async fn get_stats() -> anyhow::Result<DashboardStats> {
    let week_ago = Utc::now() - Duration::days(7);

    let total_students = repository::total_students().await?;
    let total_cards = repository::total_cards().await?;
    let new_registrations = repository::registrations_since(week_ago).await?;
    let course_count = repository::course_count().await?;

    let course_distribution = repository::course_distribution()
        .await?
        .into_iter()
        .map(|r| CourseCount {
            course: r.course,
            count: r.cnt,
        })
        .collect();

    let yearly_registration = repository::yearly_registration()
        .await?
        .into_iter()
        .map(|r| YearCount {
            year: r.year,
            count: r.cnt,
        })
        .collect();

    let recent_students = a001_student::repository::recent(RECENT_LIMIT)
        .await?
        .into_iter()
        .map(|s| RecentStudent {
            id: s.base.id.as_string(),
            full_name: s.full_name,
            prn_number: s.prn_number,
            course_name: s.course_name,
            created_at: s.base.metadata.created_at,
        })
        .collect();

    Ok(DashboardStats {
        total_students,
        total_cards,
        new_registrations,
        course_count,
        course_distribution,
        yearly_registration,
        recent_students,
    })
}
