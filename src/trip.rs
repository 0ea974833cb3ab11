/// Trip request fields and prompt synthesis

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{PlannerError, Result};

/// One of the four required form fields, in form order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TripField {
    Origin,
    Destination,
    StartDate,
    EndDate,
}

impl TripField {
    pub fn label(&self) -> &'static str {
        match self {
            TripField::Origin => "Origin City",
            TripField::Destination => "Destination City",
            TripField::StartDate => "Start Date",
            TripField::EndDate => "End Date",
        }
    }
}

/// Raw trip request as submitted by the form or the JSON API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripRequest {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub end_date: Option<NaiveDate>,
}

/// Trip request with every field present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTrip {
    pub origin: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl TripRequest {
    /// Check that all four fields are filled in.
    /// Reports every missing field, not just the first.
    pub fn validate(&self) -> Result<ValidTrip> {
        let origin = self.origin.trim();
        let destination = self.destination.trim();

        let mut missing = Vec::new();
        if origin.is_empty() {
            missing.push(TripField::Origin);
        }
        if destination.is_empty() {
            missing.push(TripField::Destination);
        }
        if self.start_date.is_none() {
            missing.push(TripField::StartDate);
        }
        if self.end_date.is_none() {
            missing.push(TripField::EndDate);
        }

        match (self.start_date, self.end_date) {
            (Some(start_date), Some(end_date)) if missing.is_empty() => {
                if end_date < start_date {
                    tracing::warn!(%start_date, %end_date, "end date precedes start date");
                }
                Ok(ValidTrip {
                    origin: origin.to_string(),
                    destination: destination.to_string(),
                    start_date,
                    end_date,
                })
            }
            _ => Err(PlannerError::MissingFields(missing)),
        }
    }
}

impl ValidTrip {
    /// Natural-language instruction sent as the first user message
    pub fn prompt(&self) -> String {
        format!(
            "I want to travel from {} to {} between {} and {}. \
             Generate a detailed travel itinerary with flights, hotels, attractions, and restaurants.",
            self.origin,
            self.destination,
            self.start_date.format("%Y-%m-%d"),
            self.end_date.format("%Y-%m-%d"),
        )
    }
}

// HTML date inputs submit "" when left blank
fn empty_date_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
