use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{ParkingSpot, SpotStatus, SpotType};
use crate::interfaces::http::common::ApiError;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpotDto {
    pub id: String,
    pub number: String,
    pub location: String,
    pub is_occupied: bool,
    pub current_session_id: Option<String>,
    /// regular, disabled or electric
    pub spot_type: String,
    /// available, occupied, maintenance or reserved
    pub status: String,
    pub last_updated: DateTime<Utc>,
}

impl From<ParkingSpot> for SpotDto {
    fn from(s: ParkingSpot) -> Self {
        Self {
            id: s.id,
            number: s.number,
            location: s.location,
            is_occupied: s.is_occupied,
            current_session_id: s.current_session_id,
            spot_type: s.spot_type.as_str().to_string(),
            status: s.status.as_str().to_string(),
            last_updated: s.last_updated,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSpotRequest {
    #[validate(length(min = 1, max = 20))]
    pub number: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    pub spot_type: Option<String>,
}

impl CreateSpotRequest {
    pub fn spot_type(&self) -> Result<SpotType, ApiError> {
        match self.spot_type.as_deref() {
            None => Ok(SpotType::default()),
            Some(t) => SpotType::from_str(t)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown spot type '{}'", t))),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetSpotStatusRequest {
    /// available, maintenance or reserved
    pub status: String,
}

impl SetSpotStatusRequest {
    pub fn status(&self) -> Result<SpotStatus, ApiError> {
        SpotStatus::from_str(&self.status)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown spot status '{}'", self.status)))
    }
}
