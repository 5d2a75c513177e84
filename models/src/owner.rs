// models/src/owner.rs

use serde::{Deserialize, Serialize};

/// A pet's guardian. Owners are created by receptionists or through the
/// public website intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}
