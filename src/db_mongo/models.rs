use serde::{Deserialize, Serialize};
use mongodb::bson::{doc, oid::ObjectId, Document};

pub const READ_WRITE_ROLE: &str = "readWrite";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A point of interest as stored in the places collection.
///
/// Field names on the wire are the ones the application reads
/// (`nome_local`, `cidade`, ...), not the Rust names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "nome_local")]
    pub name: String,
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "coordenadas")]
    pub coordinates: Coordinates,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(rename = "categoria", default)]
    pub category: String,
    #[serde(rename = "endereco", default)]
    pub address: String,
    #[serde(rename = "data_cadastro")]
    pub registered_at: mongodb::bson::DateTime,
    #[serde(rename = "ativo")]
    pub active: bool,
}

impl Place {
    pub fn new(
        name: String,
        city: String,
        coordinates: Coordinates,
        description: String,
        category: String,
        address: String,
    ) -> Self {
        Self {
            id: None,
            name,
            city,
            coordinates,
            description,
            category,
            address,
            registered_at: mongodb::bson::DateTime::now(),
            active: true,
        }
    }

    /// Filter identifying this place on re-runs
    pub fn identity_filter(&self) -> Document {
        doc! { "nome_local": self.name.as_str(), "cidade": self.city.as_str() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: String,
    pub db: String,
}

impl RoleGrant {
    pub fn read_write(db: &str) -> Self {
        Self {
            role: READ_WRITE_ROLE.to_string(),
            db: db.to_string(),
        }
    }
}

/// Least-privilege user the application connects with
#[derive(Debug, Clone)]
pub struct AppCredential {
    pub username: String,
    pub password: String,
    pub roles: Vec<RoleGrant>,
}

impl AppCredential {
    /// Credential holding `readWrite` on `database` and nothing else
    pub fn scoped_to(username: &str, password: &str, database: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            roles: vec![RoleGrant::read_write(database)],
        }
    }

    pub fn roles_bson(&self) -> Vec<Document> {
        self.roles
            .iter()
            .map(|r| doc! { "role": r.role.as_str(), "db": r.db.as_str() })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    #[test]
    fn test_place_wire_names() {
        let place = Place::new(
            "Centro Dragão do Mar".to_string(),
            "Fortaleza".to_string(),
            Coordinates { latitude: -3.73111, longitude: -38.5264 },
            "Centro cultural e de arte de Fortaleza.".to_string(),
            "Cultura".to_string(),
            "Praia de Iracema, Fortaleza - CE".to_string(),
        );

        let document = bson::to_document(&place).unwrap();
        assert!(!document.contains_key("_id"));
        assert_eq!(document.get_str("nome_local").unwrap(), "Centro Dragão do Mar");
        assert_eq!(document.get_str("cidade").unwrap(), "Fortaleza");
        assert_eq!(document.get_str("categoria").unwrap(), "Cultura");
        assert!(document.get_bool("ativo").unwrap());
        assert!(document.get_datetime("data_cadastro").is_ok());

        let coordinates = document.get_document("coordenadas").unwrap();
        assert_eq!(coordinates.get_f64("latitude").unwrap(), -3.73111);
        assert_eq!(coordinates.get_f64("longitude").unwrap(), -38.5264);
    }

    #[test]
    fn test_identity_filter() {
        let place = Place::new(
            "Praça do Marco Zero".to_string(),
            "Recife".to_string(),
            Coordinates { latitude: -8.04756, longitude: -34.8770 },
            String::new(),
            "Ponto Turístico".to_string(),
            String::new(),
        );

        assert_eq!(
            place.identity_filter(),
            doc! { "nome_local": "Praça do Marco Zero", "cidade": "Recife" }
        );
    }

    #[test]
    fn test_credential_scoped_to_single_database() {
        let credential = AppCredential::scoped_to("app_user", "app_password", "geolocalizacao");

        assert_eq!(credential.roles.len(), 1);
        assert_eq!(
            credential.roles_bson(),
            vec![doc! { "role": "readWrite", "db": "geolocalizacao" }]
        );
    }
}
