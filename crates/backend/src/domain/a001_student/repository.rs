use chrono::Utc;
use contracts::domain::a001_student::aggregate::{Student, StudentId};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_student")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub photo_url: Option<String>,
    pub full_name: String,
    pub address: String,
    pub date_of_birth: chrono::NaiveDate,
    pub mobile_number: String,
    pub prn_number: String,
    pub roll_number: String,
    pub year_of_joining: i32,
    pub course_name: String,
    pub qr_code: Option<String>,
    pub card_validity: Option<chrono::NaiveDate>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Student {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            version: m.version,
        };
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        Student {
            base: BaseAggregate::with_metadata(StudentId(uuid), m.code, metadata),
            photo_url: m.photo_url,
            full_name: m.full_name,
            address: m.address,
            date_of_birth: m.date_of_birth,
            mobile_number: m.mobile_number,
            prn_number: m.prn_number,
            roll_number: m.roll_number,
            year_of_joining: m.year_of_joining,
            course_name: m.course_name,
            qr_code: m.qr_code,
            card_validity: m.card_validity,
        }
    }
}

fn to_active_model(aggregate: &Student) -> ActiveModel {
    ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        photo_url: Set(aggregate.photo_url.clone()),
        full_name: Set(aggregate.full_name.clone()),
        address: Set(aggregate.address.clone()),
        date_of_birth: Set(aggregate.date_of_birth),
        mobile_number: Set(aggregate.mobile_number.clone()),
        prn_number: Set(aggregate.prn_number.clone()),
        roll_number: Set(aggregate.roll_number.clone()),
        year_of_joining: Set(aggregate.year_of_joining),
        course_name: Set(aggregate.course_name.clone()),
        qr_code: Set(aggregate.qr_code.clone()),
        card_validity: Set(aggregate.card_validity),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

/// All students, newest registrations first
pub async fn list_all() -> anyhow::Result<Vec<Student>> {
    let items = Entity::find()
        .order_by_desc(Column::CreatedAt)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Student>> {
    let result = Entity::find_by_id(id.to_string()).one(conn()).await?;
    Ok(result.map(Into::into))
}

pub async fn find_by_prn(prn: &str) -> anyhow::Result<Option<Student>> {
    let result = Entity::find()
        .filter(Column::PrnNumber.eq(prn))
        .one(conn())
        .await?;
    Ok(result.map(Into::into))
}

pub async fn find_by_ids(ids: &[Uuid]) -> anyhow::Result<Vec<Student>> {
    let id_strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    let items = Entity::find()
        .filter(Column::Id.is_in(id_strings))
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn insert(aggregate: &Student) -> anyhow::Result<Uuid> {
    let uuid = aggregate.base.id.value();
    to_active_model(aggregate).insert(conn()).await?;
    Ok(uuid)
}

pub async fn update(aggregate: &Student) -> anyhow::Result<()> {
    let mut active = to_active_model(aggregate);
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(conn()).await?;
    Ok(())
}

/// Hard delete; the caller is responsible for removing associated files.
pub async fn delete(id: Uuid) -> anyhow::Result<bool> {
    let result = Entity::delete_by_id(id.to_string()).exec(conn()).await?;
    Ok(result.rows_affected > 0)
}

pub async fn recent(limit: u64) -> anyhow::Result<Vec<Student>> {
    let items = Entity::find()
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(conn())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}
