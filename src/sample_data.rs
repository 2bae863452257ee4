use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::db_mongo::models::{Coordinates, Place};
use crate::error::InitError;
use crate::geo;

const EMBEDDED_DATASET: &str = include_str!("../data/sample_places.json");

/// One entry of a sample dataset file. Registration time and the active flag
/// are not part of the file; they are stamped when the place is built.
#[derive(Debug, Clone, Deserialize)]
pub struct SamplePlace {
    pub nome_local: String,
    pub cidade: String,
    pub coordenadas: Coordinates,
    #[serde(default)]
    pub descricao: String,
    #[serde(default)]
    pub categoria: String,
    #[serde(default)]
    pub endereco: String,
}

impl SamplePlace {
    fn check(&self) -> Result<(), InitError> {
        let reason = if self.nome_local.trim().is_empty() {
            Some("name is empty".to_string())
        } else if self.cidade.trim().is_empty() {
            Some("city is empty".to_string())
        } else if self.categoria.trim().is_empty() {
            Some("category is empty".to_string())
        } else if !geo::validate_coordinates(self.coordenadas.latitude, self.coordenadas.longitude) {
            Some(format!(
                "coordinates ({}, {}) out of range",
                self.coordenadas.latitude, self.coordenadas.longitude
            ))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(InitError::InvalidSample {
                name: self.nome_local.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }

    pub fn into_place(self) -> Place {
        Place::new(
            self.nome_local,
            self.cidade,
            self.coordenadas,
            self.descricao,
            self.categoria,
            self.endereco,
        )
    }
}

pub fn parse_dataset(json: &str) -> Result<Vec<SamplePlace>> {
    let samples: Vec<SamplePlace> =
        serde_json::from_str(json).context("Failed to parse sample places dataset")?;

    for sample in &samples {
        sample.check()?;
    }

    Ok(samples)
}

/// The four places every fresh environment starts with
pub fn sample_places() -> Result<Vec<Place>> {
    let samples = parse_dataset(EMBEDDED_DATASET)?;
    Ok(samples.into_iter().map(SamplePlace::into_place).collect())
}

/// Load places from `path`, or the embedded dataset when no path is given
pub fn load_sample_places(path: Option<&Path>) -> Result<Vec<Place>> {
    let Some(path) = path else {
        return sample_places();
    };

    tracing::info!("Loading sample places from {:?}", path);

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sample places from {:?}", path))?;
    let samples = parse_dataset(&json)?;

    Ok(samples.into_iter().map(SamplePlace::into_place).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(places: &'a [Place], name: &str) -> &'a Place {
        places
            .iter()
            .find(|p| p.name == name)
            .unwrap_or_else(|| panic!("missing sample place {}", name))
    }

    #[test]
    fn test_embedded_dataset_has_four_places() {
        let places = sample_places().unwrap();
        assert_eq!(places.len(), 4);

        for place in &places {
            assert!(!place.name.is_empty());
            assert!(!place.city.is_empty());
            assert!(!place.category.is_empty());
            assert!(geo::validate_coordinates(
                place.coordinates.latitude,
                place.coordinates.longitude
            ));
            assert!(place.active);
            assert!(place.id.is_none());
        }
    }

    #[test]
    fn test_praca_da_independencia() {
        let places = sample_places().unwrap();
        let place = find(&places, "Praça da Independência");

        assert_eq!(place.city, "João Pessoa");
        assert_eq!(place.coordinates.latitude, -7.11532);
        assert_eq!(place.coordinates.longitude, -34.861);
        assert_eq!(place.category, "Praça");
        assert_eq!(place.address, "Centro, João Pessoa - PB");
    }

    #[test]
    fn test_centro_dragao_do_mar() {
        let places = sample_places().unwrap();
        let place = find(&places, "Centro Dragão do Mar");

        assert_eq!(place.city, "Fortaleza");
        assert_eq!(place.coordinates.latitude, -3.73111);
        assert_eq!(place.coordinates.longitude, -38.5264);
        assert_eq!(place.category, "Cultura");
    }

    #[test]
    fn test_remaining_places() {
        let places = sample_places().unwrap();

        let cabo_branco = find(&places, "Estação Cabo Branco");
        assert_eq!(cabo_branco.city, "João Pessoa");
        assert_eq!(cabo_branco.category, "Ponto Turístico");

        let marco_zero = find(&places, "Praça do Marco Zero");
        assert_eq!(marco_zero.city, "Recife");
        assert_eq!(marco_zero.coordinates.longitude, -34.877);
    }

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        let json = r#"[{
            "nome_local": "Fora do mapa",
            "cidade": "Recife",
            "coordenadas": { "latitude": -91.0, "longitude": -34.9 },
            "categoria": "Praia"
        }]"#;

        let err = parse_dataset(json).unwrap_err();
        assert!(err.to_string().contains("out of range"), "got {}", err);
    }

    #[test]
    fn test_rejects_missing_category() {
        let json = r#"[{
            "nome_local": "Sem categoria",
            "cidade": "Recife",
            "coordenadas": { "latitude": -8.0, "longitude": -34.9 }
        }]"#;

        assert!(parse_dataset(json).is_err());
    }

    #[test]
    fn test_missing_override_file_is_an_error() {
        let result = load_sample_places(Some(Path::new("/nonexistent/places.json")));
        assert!(result.is_err());
    }
}
