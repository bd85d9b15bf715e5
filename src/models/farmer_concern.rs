//! Farmer concern entity model
//!
//! A concern is a support ticket raised by a farmer and threaded with
//! messages from admins and the farmer.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "farmer_concerns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Farmer who raised the concern
    pub farmer_id: Uuid,

    pub subject: String,

    /// `OPEN` | `RESOLVED`
    pub status: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::farmer::Entity",
        from = "Column::FarmerId",
        to = "super::farmer::Column::Id",
        on_delete = "Cascade"
    )]
    Farmer,
    #[sea_orm(has_many = "super::concern_message::Entity")]
    ConcernMessage,
}

impl Related<super::farmer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Farmer.def()
    }
}

impl Related<super::concern_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConcernMessage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
