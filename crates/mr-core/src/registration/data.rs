//! Registrant form payload.
//!
//! 注册表单数据：从会话创建起即完整存在，字段默认为空。

use std::fmt;

use serde::{Deserialize, Serialize};

/// Schedule preferences chosen by the professional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulePreferences {
    /// Weekday names, e.g. `"monday"`.
    pub available_days: Vec<String>,
    /// `HH:MM`, local time.
    pub start_time: String,
    /// `HH:MM`, local time.
    pub end_time: String,
    pub consultation_minutes: u32,
    pub accepts_telemedicine: bool,
}

/// The registrant's in-progress form payload.
///
/// A single flat record; every field starts empty and is filled through
/// [`RegistrationDataPatch::apply`].
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationData {
    // Personal
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,

    // Professional
    /// Medical board registration number (CRM).
    pub document_number: String,
    pub university: String,
    pub graduation_year: String,
    pub medical_board: String,
    pub bio: String,

    // Specialty
    pub specialty_id: String,

    pub schedule: SchedulePreferences,
}

impl fmt::Debug for RegistrationData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationData")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .field("document_number", &self.document_number)
            .field("university", &self.university)
            .field("graduation_year", &self.graduation_year)
            .field("medical_board", &self.medical_board)
            .field("bio", &self.bio)
            .field("specialty_id", &self.specialty_id)
            .field("schedule", &self.schedule)
            .finish()
    }
}

/// Partial update of [`RegistrationData`].
///
/// Present fields overwrite, absent fields are left untouched (shallow
/// merge). `schedule` is replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationDataPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
    pub document_number: Option<String>,
    pub university: Option<String>,
    pub graduation_year: Option<String>,
    pub medical_board: Option<String>,
    pub bio: Option<String>,
    pub specialty_id: Option<String>,
    pub schedule: Option<SchedulePreferences>,
}

macro_rules! merge_fields {
    ($patch:expr, $data:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = $patch.$field {
                $data.$field = value;
            }
        )*
    };
}

impl RegistrationDataPatch {
    /// Merge the present fields into `data`.
    pub fn apply(self, data: &mut RegistrationData) {
        merge_fields!(
            self,
            data,
            [
                first_name,
                last_name,
                email,
                phone,
                password,
                confirm_password,
                document_number,
                university,
                graduation_year,
                medical_board,
                bio,
                specialty_id,
                schedule,
            ]
        );
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
