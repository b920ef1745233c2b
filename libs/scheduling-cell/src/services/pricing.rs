// libs/scheduling-cell/src/services/pricing.rs
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_database::store::StoreClient;

use crate::models::{SchedulingError, Specialty};

/// Fallback price applied when a specialty has no dedicated entry, in
/// euro cents.
pub const DEFAULT_PRICE_CENTS: i64 = 10_000;

/// Visit prices by specialty name, in euro cents.
const PRICE_TABLE: &[(&str, i64)] = &[
    ("Cardiologia", 13_000),
    ("Ortopedia", 12_000),
    ("Dermatologia", 11_000),
    ("Neurologia", 14_000),
    ("Pediatria", 10_000),
    ("Oculistica", 9_000),
    ("Ginecologia", 12_000),
    ("Psichiatria", 15_000),
];

/// Price for a visit of the named specialty.
pub fn price_for_specialty(name: &str) -> i64 {
    PRICE_TABLE
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, cents)| *cents)
        .unwrap_or(DEFAULT_PRICE_CENTS)
}

pub struct PricingService {
    store: Arc<StoreClient>,
}

impl PricingService {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    /// Resolve a specialty id to its record, or fail with
    /// [`SchedulingError::SpecialtyNotFound`].
    pub async fn get_specialty(
        &self,
        specialty_id: Uuid,
        auth_token: &str,
    ) -> Result<Specialty, SchedulingError> {
        debug!("Looking up specialty {}", specialty_id);

        let path = format!("/rest/v1/specialties?id=eq.{}", specialty_id);
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let record = result
            .into_iter()
            .next()
            .ok_or(SchedulingError::SpecialtyNotFound)?;

        serde_json::from_value(record)
            .map_err(|e| SchedulingError::Dependency(format!("Failed to parse specialty: {}", e)))
    }

    /// Price a booking for the given optional specialty. Bookings without
    /// a specialty get the default price.
    pub async fn price_for_booking(
        &self,
        specialty_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<i64, SchedulingError> {
        match specialty_id {
            Some(id) => {
                let specialty = self.get_specialty(id, auth_token).await?;
                Ok(price_for_specialty(&specialty.name))
            }
            None => Ok(DEFAULT_PRICE_CENTS),
        }
    }
}
