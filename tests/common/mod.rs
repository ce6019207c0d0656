#![allow(dead_code)]

use bigdecimal::BigDecimal;
use std::str::FromStr;
use std::sync::Arc;

use franchise_hub_core::adapters::InMemoryStore;
use franchise_hub_core::config::PaymentSettings;
use franchise_hub_core::domain::{
    Address, ApplicationDraft, BusinessInfo, FinancialInfo, Franchise, FranchiseStatus,
    PersonalInfo, User, UserRole,
};
use franchise_hub_core::ports::{FranchiseRepository, Repositories, UserRepository};
use franchise_hub_core::services::Services;

pub struct TestHub {
    pub store: Arc<InMemoryStore>,
    pub repos: Repositories,
    pub services: Services,
    pub settings: PaymentSettings,
}

impl TestHub {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let repos = Repositories::from_store(store.clone());
        Self::with_repos(store, repos)
    }

    /// Build over `repos`, which may wrap some of `store`'s ports.
    pub fn with_repos(store: Arc<InMemoryStore>, repos: Repositories) -> Self {
        let settings = PaymentSettings {
            gateway_signing_secret: "test-secret".to_string(),
            ..PaymentSettings::default()
        };
        let services = Services::new(&repos, &settings);
        Self {
            store,
            repos,
            services,
            settings,
        }
    }

    pub async fn user(&self, email: &str, role: UserRole) -> User {
        let (first, last) = email
            .split_once('@')
            .map(|(local, _)| (local.to_string(), "Tester".to_string()))
            .unwrap_or_else(|| ("Test".to_string(), "User".to_string()));
        let user = User::new(email, first, last, role);
        self.repos.users.insert(&user).await.unwrap()
    }

    pub async fn franchise(&self, owner: &User, status: FranchiseStatus) -> Franchise {
        let franchise = Franchise::new("Chai Point", owner.id, status, dec("250000"));
        self.repos.franchises.insert(&franchise).await.unwrap()
    }
}

pub fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

pub fn address(city: &str) -> Address {
    Address {
        street: Some("12 MG Road".to_string()),
        city: Some(city.to_string()),
        state: Some("MH".to_string()),
        zip_code: Some("411001".to_string()),
        country: Some("IN".to_string()),
    }
}

/// A draft that passes the submission completeness check.
pub fn complete_draft() -> ApplicationDraft {
    ApplicationDraft {
        personal_info: Some(PersonalInfo {
            first_name: Some("Priya".to_string()),
            last_name: Some("Shah".to_string()),
            address: Some(address("Pune")),
            ..PersonalInfo::default()
        }),
        financial_info: Some(FinancialInfo {
            net_worth: Some(dec("5000000")),
            liquid_assets: Some(dec("1500000")),
            credit_score: Some(760),
            ..FinancialInfo::default()
        }),
        business_info: Some(BusinessInfo {
            preferred_location: Some(address("Mumbai")),
            preferred_states: Some(vec!["MH".to_string()]),
            timeline_to_open: Some("6 months".to_string()),
            full_time_commitment: Some(true),
            ..BusinessInfo::default()
        }),
        motivation: Some("Love tea".to_string()),
        ..ApplicationDraft::default()
    }
}
