// models/src/pet.rs

use serde::{Deserialize, Serialize};

/// A pet, owned by exactly one `Owner`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<i32>,
}
