//! Demo farmer seeding for local development

use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::auth::password::hash_in_background;
use crate::models::farmer;
use crate::models::{ApplicantStatus, Farmer, FarmerKind};
use crate::repositories::FarmerRepository;
use crate::repositories::farmer::{FarmerFields, HouseholdInput, NewFarmDetail, NewFarmer};

/// Password shared by every demo farmer
pub const DEMO_PASSWORD: &str = "demo-farmer";

fn demo_email(kind: FarmerKind, status: ApplicantStatus) -> String {
    format!(
        "demo+{}-{}@example.org",
        kind.as_str(),
        status.as_str().to_ascii_lowercase().replace('_', "-")
    )
}

/// Insert one demo farmer for every (kind, status) pair.
///
/// Pairs that already have their demo record are skipped, so the command can
/// be re-run. Returns the number of farmers created.
pub async fn seed_demo(db: &DatabaseConnection) -> Result<usize> {
    let repo = FarmerRepository::new(db);
    let password_hash = hash_in_background(DEMO_PASSWORD.to_string())
        .await
        .context("Failed to hash demo password")?;
    let mut created = 0;

    for (kind_index, kind) in FarmerKind::ALL.into_iter().enumerate() {
        for (status_index, status) in ApplicantStatus::ALL.into_iter().enumerate() {
            let email = demo_email(kind, status);
            let exists = Farmer::find()
                .filter(farmer::Column::Email.eq(email.as_str()))
                .one(db)
                .await?
                .is_some();
            if exists {
                log::info!("Demo farmer '{}' already exists, skipping", email);
                continue;
            }

            let profile = repo
                .register(NewFarmer {
                    kind,
                    fields: FarmerFields {
                        first_name: "Demo".to_string(),
                        last_name: format!("{} {}", kind, status.label()),
                        email: Some(email.clone()),
                        phone: Some(format!("091700000{}{}", kind_index, status_index)),
                        barangay: Some("Poblacion".to_string()),
                        municipality: Some("Tanauan".to_string()),
                        province: Some("Batangas".to_string()),
                        organic_certification: (kind == FarmerKind::Organic)
                            .then(|| "PGS-DEMO".to_string()),
                        ..Default::default()
                    },
                    password_hash: Some(password_hash.clone()),
                    farms: vec![NewFarmDetail {
                        location: "Sitio Centro".to_string(),
                        area_hectares: 1.0 + status_index as f64 * 0.5,
                        commodity: match kind {
                            FarmerKind::Regular => "Rice".to_string(),
                            FarmerKind::Organic => "Vegetables".to_string(),
                        },
                        tenure: Some("Owner".to_string()),
                    }],
                    household: Some(HouseholdInput {
                        name: "Demo".to_string(),
                        relationship: "Self".to_string(),
                        household_members: 4,
                    }),
                })
                .await
                .with_context(|| format!("Failed to register demo farmer {email}"))?;

            if status != ApplicantStatus::Applicants {
                let reason = (status == ApplicantStatus::NotQualified)
                    .then(|| "Demo record: incomplete documents".to_string());
                repo.set_status(profile.farmer.id, status, reason).await?;
            }

            log::info!(
                "Created demo farmer {} ({}, {})",
                profile.farmer.registry_code,
                kind,
                status
            );
            created += 1;
        }
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::PageRequest;
    use crate::repositories::farmer::FarmerFilter;
    use crate::test_support::test_db;

    #[tokio::test]
    async fn covers_every_kind_and_status_once() {
        let db = test_db().await;

        let expected = FarmerKind::ALL.len() * ApplicantStatus::ALL.len();
        assert_eq!(seed_demo(&db).await.unwrap(), expected);
        assert_eq!(seed_demo(&db).await.unwrap(), 0);

        let repo = FarmerRepository::new(&db);
        for kind in FarmerKind::ALL {
            for status in ApplicantStatus::ALL {
                let page = repo
                    .list(
                        &FarmerFilter {
                            kind: Some(kind),
                            status: Some(status),
                            ..Default::default()
                        },
                        PageRequest::default(),
                    )
                    .await
                    .unwrap();
                assert_eq!(page.total, 1, "{kind} {status}");
            }
        }
    }
}
