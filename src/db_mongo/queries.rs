use anyhow::{Context, Result};
use mongodb::{
    Database,
    bson::{self, Bson, Document, doc},
    error::ErrorKind,
};
use std::fmt;

use super::models::*;
use crate::error::InitError;

// Server error code for "collection already exists".
const NAMESPACE_EXISTS: i32 = 48;

/// What has to happen to bring the application user in line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialAction {
    Create,
    ReplaceRoles,
    UpToDate,
}

impl fmt::Display for CredentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CredentialAction::Create => "created",
            CredentialAction::ReplaceRoles => "roles replaced",
            CredentialAction::UpToDate => "already up to date",
        };
        f.write_str(label)
    }
}

/// Pick `username` out of a `usersInfo` reply
pub fn app_user_from_reply(
    users_info: &Document,
    username: &str,
) -> Result<Option<Document>, InitError> {
    let users = users_info
        .get_array("users")
        .map_err(|e| InitError::UnexpectedReply {
            command: "usersInfo",
            detail: e.to_string(),
        })?;

    Ok(users.iter().find_map(|u| match u {
        Bson::Document(d) if d.get_str("user").ok() == Some(username) => Some(d.clone()),
        _ => None,
    }))
}

/// Decide whether the user must be created or its roles reset. Role order
/// does not matter; any grant outside the desired set (a global role,
/// another database) forces a replace.
pub fn credential_action(user: Option<&Document>, credential: &AppCredential) -> CredentialAction {
    let Some(user) = user else {
        return CredentialAction::Create;
    };

    let mut current: Vec<RoleGrant> = match user.get_array("roles") {
        Ok(roles) => roles
            .iter()
            .filter_map(|r| bson::from_bson::<RoleGrant>(r.clone()).ok())
            .collect(),
        Err(_) => Vec::new(),
    };
    let mut desired = credential.roles.clone();

    current.sort_by(|a, b| (&a.db, &a.role).cmp(&(&b.db, &b.role)));
    current.dedup();
    desired.sort_by(|a, b| (&a.db, &a.role).cmp(&(&b.db, &b.role)));

    if current == desired {
        CredentialAction::UpToDate
    } else {
        CredentialAction::ReplaceRoles
    }
}

/// The user document as `usersInfo` reports it, or `None` when absent
pub async fn find_app_user(db: &Database, username: &str) -> Result<Option<Document>> {
    let reply = db
        .run_command(doc! {
            "usersInfo": { "user": username, "db": db.name() }
        })
        .await
        .with_context(|| format!("Failed to look up user '{}'", username))?;

    Ok(app_user_from_reply(&reply, username)?)
}

pub async fn create_app_user(db: &Database, credential: &AppCredential) -> Result<()> {
    db.run_command(doc! {
        "createUser": credential.username.as_str(),
        "pwd": credential.password.as_str(),
        "roles": credential.roles_bson(),
    })
    .await
    .with_context(|| format!("Failed to create user '{}'", credential.username))?;

    Ok(())
}

/// Replace the user's roles. The password is left alone.
pub async fn update_app_user_roles(db: &Database, credential: &AppCredential) -> Result<()> {
    db.run_command(doc! {
        "updateUser": credential.username.as_str(),
        "roles": credential.roles_bson(),
    })
    .await
    .with_context(|| format!("Failed to update roles of user '{}'", credential.username))?;

    Ok(())
}

pub async fn collection_exists(db: &Database, name: &str) -> Result<bool> {
    let names = db
        .list_collection_names()
        .filter(doc! { "name": name })
        .await
        .context("Failed to list collections")?;

    Ok(names.iter().any(|n| n == name))
}

/// Create the collection. Returns false when it turned out to exist already.
pub async fn create_places_collection(db: &Database, name: &str) -> Result<bool> {
    match db.create_collection(name).await {
        Ok(()) => Ok(true),
        Err(e) => {
            let already_exists = matches!(
                *e.kind,
                ErrorKind::Command(ref command_error) if command_error.code == NAMESPACE_EXISTS
            );
            if already_exists {
                tracing::debug!("Collection '{}' created concurrently", name);
                return Ok(false);
            }
            Err(e).with_context(|| format!("Failed to create collection '{}'", name))
        }
    }
}

/// Insert `place` unless a document with the same name and city exists.
/// Existing documents are never modified. Returns true when inserted.
pub async fn upsert_place(db: &Database, collection: &str, place: &Place) -> Result<bool> {
    let collection = db.collection::<Document>(collection);

    let document = bson::to_document(place)
        .with_context(|| format!("Failed to encode place '{}'", place.name))?;

    let result = collection
        .update_one(place.identity_filter(), doc! { "$setOnInsert": document })
        .upsert(true)
        .await
        .with_context(|| format!("Failed to insert place '{}'", place.name))?;

    Ok(result.upserted_id.is_some())
}

pub async fn list_places(db: &Database, collection: &str) -> Result<Vec<Place>> {
    let collection = db.collection::<Place>(collection);

    let mut cursor = collection
        .find(doc! {})
        .sort(doc! { "data_cadastro": 1 })
        .await?;

    let mut places = Vec::new();
    while cursor.advance().await? {
        places.push(cursor.deserialize_current()?);
    }

    Ok(places)
}

pub async fn count_places(db: &Database, collection: &str) -> Result<u64> {
    let count = db
        .collection::<Document>(collection)
        .count_documents(doc! {})
        .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> AppCredential {
        AppCredential::scoped_to("app_user", "app_password", "geolocalizacao")
    }

    fn action_for(reply: Document) -> CredentialAction {
        let user = app_user_from_reply(&reply, "app_user").unwrap();
        credential_action(user.as_ref(), &credential())
    }

    #[test]
    fn test_missing_user_is_created() {
        let reply = doc! { "users": [], "ok": 1.0 };
        assert!(app_user_from_reply(&reply, "app_user").unwrap().is_none());
        assert_eq!(action_for(reply), CredentialAction::Create);
    }

    #[test]
    fn test_other_user_is_not_picked() {
        let reply = doc! {
            "users": [{ "user": "admin_user", "roles": [] }],
            "ok": 1.0,
        };
        assert!(app_user_from_reply(&reply, "app_user").unwrap().is_none());
    }

    #[test]
    fn test_scoped_user_is_up_to_date() {
        let reply = doc! {
            "users": [{
                "_id": "geolocalizacao.app_user",
                "user": "app_user",
                "db": "geolocalizacao",
                "roles": [{ "role": "readWrite", "db": "geolocalizacao" }],
            }],
            "ok": 1.0,
        };

        let user = app_user_from_reply(&reply, "app_user").unwrap().unwrap();
        assert_eq!(user.get_str("_id").unwrap(), "geolocalizacao.app_user");
        assert_eq!(action_for(reply), CredentialAction::UpToDate);
    }

    #[test]
    fn test_global_role_forces_replace() {
        let reply = doc! {
            "users": [{
                "user": "app_user",
                "db": "geolocalizacao",
                "roles": [
                    { "role": "readWrite", "db": "geolocalizacao" },
                    { "role": "readWriteAnyDatabase", "db": "admin" },
                ],
            }],
            "ok": 1.0,
        };
        assert_eq!(action_for(reply), CredentialAction::ReplaceRoles);
    }

    #[test]
    fn test_role_on_other_database_forces_replace() {
        let reply = doc! {
            "users": [{
                "user": "app_user",
                "roles": [{ "role": "readWrite", "db": "outro" }],
            }],
            "ok": 1.0,
        };
        assert_eq!(action_for(reply), CredentialAction::ReplaceRoles);
    }

    #[test]
    fn test_malformed_reply_is_an_error() {
        let reply = doc! { "ok": 1.0 };
        assert!(matches!(
            app_user_from_reply(&reply, "app_user"),
            Err(InitError::UnexpectedReply { command: "usersInfo", .. })
        ));
    }
}
