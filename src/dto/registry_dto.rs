use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::models::customer::NewCustomer;
use crate::models::professional::NewProfessional;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1))]
    pub name: String,
    pub note: Option<String>,
}

impl From<CreateCustomerPayload> for NewCustomer {
    fn from(p: CreateCustomerPayload) -> Self {
        Self {
            name: p.name,
            note: p.note,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfessionalPayload {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[validate(length(min = 1))]
    pub geographical_location: String,
    pub daily_rate: Decimal,
}

impl From<CreateProfessionalPayload> for NewProfessional {
    fn from(p: CreateProfessionalPayload) -> Self {
        Self {
            name: p.name,
            skills: p.skills,
            geographical_location: p.geographical_location,
            daily_rate: p.daily_rate,
        }
    }
}
