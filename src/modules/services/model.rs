use serde::{Deserialize, Serialize};

use crate::modules::records::{Record, record_ids};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MainService {
    pub id: u64,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub price: u32,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub theory_hours: u32,
    #[serde(default)]
    pub practice_hours: u32,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub popular: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalService {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: u32,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStage {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub percent: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSchedule {
    #[serde(default)]
    pub installments_available: bool,
    pub stages: Vec<PaymentStage>,
    #[serde(default)]
    pub note: String,
}

impl PaymentSchedule {
    pub fn total_percent(&self) -> u32 {
        self.stages.iter().map(|stage| u32::from(stage.percent)).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub percent: u8,
    #[serde(default)]
    pub conditions: String,
    #[serde(default = "enabled_by_default")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractInfo {
    pub organization_name: String,
    pub inn: String,
    pub ogrn: String,
    pub legal_address: String,
    #[serde(default)]
    pub bank_details: String,
    #[serde(default)]
    pub contract_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServicesCatalog {
    pub main_services: Vec<MainService>,
    pub additional_services: Vec<AdditionalService>,
    pub payment_methods: Vec<PaymentMethod>,
    pub payment_schedule: PaymentSchedule,
    pub discounts: Vec<Discount>,
    pub contract_info: ContractInfo,
}

fn enabled_by_default() -> bool {
    true
}

record_ids!(MainService, AdditionalService);

impl Record for Discount {
    fn id(&self) -> u64 {
        self.id
    }

    fn validate(&self) -> Result<(), String> {
        if self.percent > 100 {
            return Err(format!("скидка не может превышать 100%, получено {}%", self.percent));
        }
        Ok(())
    }
}
