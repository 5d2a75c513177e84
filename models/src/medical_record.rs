// models/src/medical_record.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One clinical record per completed appointment, authored by the doctor
/// who serviced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: i64,
    pub appointment_id: i64,
    pub doctor_id: i64,
    pub diagnosis: String,
    pub symptoms: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A medical record joined with its appointment, pet, owner and doctor
/// context for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicalRecordView {
    #[serde(flatten)]
    pub record: MedicalRecord,
    pub appointment_date: Option<NaiveDate>,
    pub pet_id: Option<i64>,
    pub pet_name: Option<String>,
    pub species: Option<String>,
    pub owner_id: Option<i64>,
    pub owner_name: Option<String>,
    pub doctor_name: Option<String>,
}
