//! Concern message entity model

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "concern_messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub concern_id: Uuid,

    /// `ADMIN` | `FARMER` | `ORGANIC_FARMER`
    pub sender_type: String,

    /// Admin or farmer id, depending on `sender_type`
    pub sender_id: Uuid,

    pub body: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::farmer_concern::Entity",
        from = "Column::ConcernId",
        to = "super::farmer_concern::Column::Id",
        on_delete = "Cascade"
    )]
    FarmerConcern,
}

impl Related<super::farmer_concern::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FarmerConcern.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
