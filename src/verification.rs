use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::db_mongo::models::Place;
use crate::geo;

/// A stored document that breaks one of the place rules
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub place: String,
    pub problem: String,
}

/// Result of reading the collection back after seeding.
///
/// `missing`, `duplicated` and `violations` only ever concern documents this
/// run inserted and make the run fail. State that was already stored belongs
/// to the application (soft deletes, repeated sample imports) and only shows
/// up in `notices`.
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub total: usize,
    pub missing: Vec<String>,
    pub duplicated: Vec<String>,
    pub violations: Vec<Violation>,
    pub notices: Vec<Violation>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.duplicated.is_empty() && self.violations.is_empty()
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stored", self.total)?;
        if !self.missing.is_empty() {
            write!(f, ", missing: {}", self.missing.join(", "))?;
        }
        if !self.duplicated.is_empty() {
            write!(f, ", duplicated: {}", self.duplicated.join(", "))?;
        }
        for v in &self.violations {
            write!(f, ", '{}': {}", v.place, v.problem)?;
        }
        Ok(())
    }
}

fn check_place(place: &Place) -> Vec<String> {
    let mut problems = Vec::new();

    if place.name.trim().is_empty() {
        problems.push("empty name".to_string());
    }
    if place.city.trim().is_empty() {
        problems.push("empty city".to_string());
    }
    if place.category.trim().is_empty() {
        problems.push("empty category".to_string());
    }
    if !geo::validate_coordinates(place.coordinates.latitude, place.coordinates.longitude) {
        problems.push(format!(
            "coordinates ({}, {}) out of range",
            place.coordinates.latitude, place.coordinates.longitude
        ));
    }
    if !place.active {
        problems.push("not active".to_string());
    }

    problems
}

fn key(place: &Place) -> (&str, &str) {
    (place.name.as_str(), place.city.as_str())
}

/// Compare what is stored against the sample places.
///
/// `inserted` are the places this run wrote. Only those are held to the place
/// rules and to being stored exactly once; every sample place must be present
/// in some form. Documents the application added or changed are reported as
/// notices.
pub fn verify_places(stored: &[Place], expected: &[Place], inserted: &[Place]) -> VerificationReport {
    let mut report = VerificationReport {
        total: stored.len(),
        ..Default::default()
    };

    let ours: HashSet<(&str, &str)> = inserted.iter().map(key).collect();
    let samples: HashSet<(&str, &str)> = expected.iter().map(key).collect();

    let mut occurrences: HashMap<(&str, &str), usize> = HashMap::new();
    for place in stored {
        let k = key(place);
        *occurrences.entry(k).or_default() += 1;

        // Documents outside the sample set are none of our business.
        if !samples.contains(&k) {
            continue;
        }

        for problem in check_place(place) {
            let entry = Violation {
                place: place.name.clone(),
                problem,
            };
            if ours.contains(&k) {
                report.violations.push(entry);
            } else {
                report.notices.push(entry);
            }
        }
    }

    for place in expected {
        let k = key(place);
        match occurrences.get(&k) {
            None => report.missing.push(place.name.clone()),
            Some(n) if *n > 1 && ours.contains(&k) => report.duplicated.push(place.name.clone()),
            Some(n) if *n > 1 => report.notices.push(Violation {
                place: place.name.clone(),
                problem: format!("stored {} times", n),
            }),
            Some(_) => {}
        }
    }

    report
}
