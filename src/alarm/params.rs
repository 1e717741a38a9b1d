//! Alarm request payload.

use serde::{Deserialize, Serialize};

use crate::validation::{Constrained, Field};

/// Body of `POST /alarms`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmParams {
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub token: String,
}

impl AlarmParams {
    /// Mail subject: `<service>:<category>`.
    pub fn subject(&self) -> String {
        format!("{}:{}", self.service, self.category)
    }
}

impl Constrained for AlarmParams {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("service", "runelength(1|30)", &self.service),
            Field::new("category", "runelength(1|30)", &self.category),
            Field::new("message", "runelength(1|500)", &self.message),
            Field::new("token", "runelength(1|30)", &self.token),
        ]
    }
}
