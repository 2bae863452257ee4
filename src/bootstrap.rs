use anyhow::{Context, Result};
use mongodb::{Client, Database};

use crate::config::BootstrapConfig;
use crate::db_mongo::{
    self,
    models::{AppCredential, Coordinates, Place, READ_WRITE_ROLE},
    queries::{self, CredentialAction},
};
use crate::error::InitError;
use crate::geo;
use crate::sample_data;
use crate::verification::{self, VerificationReport};

/// Outcome of one bootstrap run
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    pub credential: CredentialAction,
    pub collection_created: bool,
    pub inserted: usize,
    pub skipped: usize,
    pub verification: VerificationReport,
}

/// Create or reconcile the application user so it holds exactly the scoped
/// `readWrite` grant. An existing password is never changed.
pub async fn ensure_app_credential(
    db: &Database,
    credential: &AppCredential,
) -> Result<CredentialAction> {
    let user = queries::find_app_user(db, &credential.username).await?;
    let action = queries::credential_action(user.as_ref(), credential);

    match action {
        CredentialAction::Create => queries::create_app_user(db, credential).await?,
        CredentialAction::ReplaceRoles => {
            tracing::warn!(
                "User '{}' has roles beyond '{}' on '{}', resetting",
                credential.username,
                READ_WRITE_ROLE,
                db.name()
            );
            queries::update_app_user_roles(db, credential).await?
        }
        CredentialAction::UpToDate => {}
    }

    tracing::info!("Application user '{}': {}", credential.username, action);
    Ok(action)
}

/// Returns true when the collection had to be created
pub async fn ensure_places_collection(db: &Database, name: &str) -> Result<bool> {
    if queries::collection_exists(db, name).await? {
        tracing::info!("Collection '{}' already exists, reusing it", name);
        return Ok(false);
    }

    let created = queries::create_places_collection(db, name).await?;
    if created {
        tracing::info!("Created collection '{}'", name);
    }
    Ok(created)
}

/// Insert every sample place that is not stored yet.
/// Returns the places written by this call and how many were skipped.
pub async fn seed_places(
    db: &Database,
    collection: &str,
    places: &[Place],
) -> Result<(Vec<Place>, usize)> {
    let existing = queries::count_places(db, collection).await?;
    tracing::info!(
        "Seeding {} sample places into '{}' ({} documents already present)",
        places.len(),
        collection,
        existing
    );

    let mut inserted = Vec::new();
    let mut skipped = 0;

    for place in places {
        if queries::upsert_place(db, collection, place).await? {
            tracing::debug!("Inserted '{}' ({})", place.name, place.city);
            inserted.push(place.clone());
        } else {
            tracing::debug!("'{}' ({}) already stored, skipping", place.name, place.city);
            skipped += 1;
        }
    }

    tracing::info!("✓ Sample places: {} inserted, {} skipped", inserted.len(), skipped);
    Ok((inserted, skipped))
}

/// Check the collection after seeding. Problems with what this run wrote fail
/// it; changes the application made to earlier samples are only logged.
pub fn check_seeded(
    stored: &[Place],
    expected: &[Place],
    inserted: &[Place],
) -> Result<VerificationReport, InitError> {
    let report = verification::verify_places(stored, expected, inserted);

    for notice in &report.notices {
        tracing::warn!("Stored sample '{}' changed since seeding: {}", notice.place, notice.problem);
    }

    if !report.is_clean() {
        tracing::warn!("Stored places do not match the sample set: {}", report);
        return Err(InitError::VerificationFailed(report.to_string()));
    }

    Ok(report)
}

fn log_extent(places: &[Place]) {
    let points: Vec<Coordinates> = places.iter().map(|p| p.coordinates).collect();

    if let Some(stats) = geo::statistics(&points) {
        let spread_km = points
            .iter()
            .map(|p| geo::haversine_km(&stats.centroid, p))
            .fold(0.0, f64::max);

        tracing::info!(
            count = stats.count,
            centroid_lat = stats.centroid.latitude,
            centroid_lon = stats.centroid.longitude,
            spread_km,
            "Places span lat [{:.5}, {:.5}] lon [{:.5}, {:.5}]",
            stats.lat_min,
            stats.lat_max,
            stats.lon_min,
            stats.lon_max
        );
    }
}

/// Run the whole procedure: bind the database, provision the application
/// credential, create and populate the places collection, then check what
/// ended up stored.
///
/// Safe to run again on an initialized database: nothing is duplicated,
/// nothing already stored is modified, and places the application has since
/// soft-deleted or imported again do not fail the run.
pub async fn run_bootstrap(client: &Client, config: &BootstrapConfig) -> Result<BootstrapReport> {
    let places = sample_data::load_sample_places(config.sample_places_path.as_deref())?;

    tracing::info!("Initializing database '{}'", config.database);
    let db = db_mongo::get_database(client, &config.database);

    let credential =
        AppCredential::scoped_to(&config.app_user, &config.app_password, &config.database);
    let credential_action = ensure_app_credential(&db, &credential)
        .await
        .context("Failed to provision application credential")?;

    let collection_created = ensure_places_collection(&db, &config.collection)
        .await
        .context("Failed to prepare places collection")?;

    let (inserted, skipped) = seed_places(&db, &config.collection, &places)
        .await
        .context("Failed to seed sample places")?;

    let stored = queries::list_places(&db, &config.collection)
        .await
        .context("Failed to read back places")?;
    let verification = check_seeded(&stored, &places, &inserted)?;

    log_extent(&stored);

    Ok(BootstrapReport {
        credential: credential_action,
        collection_created,
        inserted: inserted.len(),
        skipped,
        verification,
    })
}
