//! Foreign keys and cascades with enforcement switched on.

use chrono::Utc;
use farmer_registry::{
    models::{
        ConcernMessage, FarmDetail, Farmer, FarmerConcern, FarmerKind, HouseHead, SenderType,
        concern_message, farm_detail, farmer_concern, house_head,
    },
    repositories::{
        ConcernRepository, FarmerRepository,
        concern::Sender,
        farmer::{FarmerFields, HouseholdInput, NewFarmDetail, NewFarmer},
    },
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::setup_test_db_with_foreign_keys;

fn farm(location: &str) -> NewFarmDetail {
    NewFarmDetail {
        location: location.to_string(),
        area_hectares: 1.5,
        commodity: "Rice".to_string(),
        tenure: Some("Owner".to_string()),
    }
}

#[tokio::test]
async fn deleting_a_farmer_removes_dependent_rows() -> anyhow::Result<()> {
    let db = setup_test_db_with_foreign_keys().await?;
    let profile = FarmerRepository::new(&db)
        .register(NewFarmer {
            kind: FarmerKind::Organic,
            fields: FarmerFields {
                first_name: "Maria".to_string(),
                last_name: "Santos".to_string(),
                ..Default::default()
            },
            password_hash: None,
            farms: vec![farm("Sitio Uno"), farm("Sitio Dos")],
            household: Some(HouseholdInput {
                name: "Maria Santos".to_string(),
                relationship: "Self".to_string(),
                household_members: 5,
            }),
        })
        .await?;
    let farmer_id = profile.farmer.id;
    assert_eq!(profile.farms.len(), 2);
    assert!(profile.household.is_some());

    let concerns = ConcernRepository::new(&db);
    let thread = concerns
        .open(farmer_id, SenderType::Farmer, "Seedlings", "When is distribution?")
        .await?;
    concerns
        .add_message(
            thread.concern.clone(),
            Sender {
                sender_type: SenderType::Farmer,
                sender_id: farmer_id,
            },
            "Following up.",
        )
        .await?;
    let kept = concerns
        .open(farmer_id, SenderType::Farmer, "Fertilizer", "Is there a subsidy?")
        .await?;

    FarmerConcern::delete_by_id(thread.concern.id).exec(&db).await?;
    let orphaned = ConcernMessage::find()
        .filter(concern_message::Column::ConcernId.eq(thread.concern.id))
        .count(&db)
        .await?;
    assert_eq!(orphaned, 0);
    let surviving = ConcernMessage::find()
        .filter(concern_message::Column::ConcernId.eq(kept.concern.id))
        .count(&db)
        .await?;
    assert_eq!(surviving, 1);

    Farmer::delete_by_id(farmer_id).exec(&db).await?;

    let farms = FarmDetail::find()
        .filter(farm_detail::Column::FarmerId.eq(farmer_id))
        .count(&db)
        .await?;
    let households = HouseHead::find()
        .filter(house_head::Column::FarmerId.eq(farmer_id))
        .count(&db)
        .await?;
    let concerns_left = FarmerConcern::find()
        .filter(farmer_concern::Column::FarmerId.eq(farmer_id))
        .count(&db)
        .await?;
    let messages_left = ConcernMessage::find().count(&db).await?;

    assert_eq!(farms, 0);
    assert_eq!(households, 0);
    assert_eq!(concerns_left, 0);
    assert_eq!(messages_left, 0);
    Ok(())
}

#[tokio::test]
async fn farm_for_unknown_farmer_is_rejected() -> anyhow::Result<()> {
    let db = setup_test_db_with_foreign_keys().await?;

    let result = farm_detail::ActiveModel {
        id: Set(Uuid::new_v4()),
        farmer_id: Set(Uuid::new_v4()),
        location: Set("Nowhere".to_string()),
        area_hectares: Set(2.0),
        commodity: Set("Corn".to_string()),
        tenure: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(&db)
    .await;

    assert!(result.is_err());
    assert_eq!(FarmDetail::find().count(&db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn concern_for_unknown_farmer_is_rejected() -> anyhow::Result<()> {
    let db = setup_test_db_with_foreign_keys().await?;

    let result = ConcernRepository::new(&db)
        .open(Uuid::new_v4(), SenderType::Farmer, "Hello", "Anyone there?")
        .await;

    assert!(result.is_err());
    assert_eq!(FarmerConcern::find().count(&db).await?, 0);
    assert_eq!(ConcernMessage::find().count(&db).await?, 0);
    Ok(())
}
