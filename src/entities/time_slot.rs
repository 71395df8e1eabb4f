use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};

/// The fixed two-hour bands every area's weekly grid is built from.
pub const SLOT_BANDS: [&str; 6] = [
    "08:00-10:00",
    "10:00-12:00",
    "12:00-14:00",
    "14:00-16:00",
    "16:00-18:00",
    "18:00-20:00",
];

/// Days of week, 0 = Monday through 6 = Sunday.
pub const DAYS_OF_WEEK: [(i32, &str); 7] = [
    (0, "Monday"),
    (1, "Tuesday"),
    (2, "Wednesday"),
    (3, "Thursday"),
    (4, "Friday"),
    (5, "Saturday"),
    (6, "Sunday"),
];

/// Rows auto-created per area: one per (day, band) pair.
pub const WEEKLY_SLOT_COUNT: usize = DAYS_OF_WEEK.len() * SLOT_BANDS.len();

/// Display name for a day index, `None` outside 0..=6.
pub fn day_name(day: i32) -> Option<&'static str> {
    DAYS_OF_WEEK
        .iter()
        .find(|(index, _)| *index == day)
        .map(|(_, name)| *name)
}

/// Weekly pickup/delivery slot entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "time_slots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub area_id: i32,

    /// 0 = Monday through 6 = Sunday
    pub day_of_week: i32,

    /// One of [`SLOT_BANDS`]
    pub slot: String,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::area::Entity",
        from = "Column::AreaId",
        to = "super::area::Column::Id",
        on_delete = "Cascade"
    )]
    Area,
}

impl Related<super::area::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Area.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if insert {
            active_model.created_at = Set(Utc::now());
        }
        active_model.updated_at = Set(Utc::now());
        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekly_grid_covers_every_day_and_band() {
        assert_eq!(WEEKLY_SLOT_COUNT, 42);
    }

    #[test]
    fn day_names_resolve_in_range_only() {
        assert_eq!(day_name(0), Some("Monday"));
        assert_eq!(day_name(6), Some("Sunday"));
        assert_eq!(day_name(7), None);
        assert_eq!(day_name(-1), None);
    }
}
