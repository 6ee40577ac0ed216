//! The built-in migration catalog.
//!
//! To add a migration, create `mNNN_description.rs` with a struct implementing
//! [`Migration`], then list it in [`catalog`]. Released names never change and
//! are never renumbered.

mod m001_create_app_usage_events;
mod m002_create_service_usage_events;
mod m003_create_pricing_plans;
mod m004_create_pricing_plan_components;
mod m005_create_vat_rates;
mod m006_create_currency_rates;
mod m049_add_number_of_nodes_to_pricing_plans;
mod m050_add_mb_fields_to_pricing_plans;
mod m051_create_resource_durations;
pub mod schema;

pub use m001_create_app_usage_events::CreateAppUsageEvents;
pub use m002_create_service_usage_events::CreateServiceUsageEvents;
pub use m003_create_pricing_plans::CreatePricingPlans;
pub use m004_create_pricing_plan_components::CreatePricingPlanComponents;
pub use m005_create_vat_rates::CreateVatRates;
pub use m006_create_currency_rates::CreateCurrencyRates;
pub use m049_add_number_of_nodes_to_pricing_plans::AddNumberOfNodesToPricingPlans;
pub use m050_add_mb_fields_to_pricing_plans::AddMbFieldsToPricingPlans;
pub use m051_create_resource_durations::CreateResourceDurations;

use crate::migrate::{Catalog, Migration, MigrationError};

pub fn catalog() -> Result<Catalog, MigrationError> {
    let migrations: Vec<Box<dyn Migration>> = vec![
        Box::new(CreateAppUsageEvents),
        Box::new(CreateServiceUsageEvents),
        Box::new(CreatePricingPlans),
        Box::new(CreatePricingPlanComponents),
        Box::new(CreateVatRates),
        Box::new(CreateCurrencyRates),
        Box::new(AddNumberOfNodesToPricingPlans),
        Box::new(AddMbFieldsToPricingPlans),
        Box::new(CreateResourceDurations),
    ];
    Catalog::new(migrations)
}

/// Every built-in migration name, ascending.
pub fn sequence() -> Result<Vec<String>, MigrationError> {
    Ok(catalog()?.sequence())
}

/// Built-in names strictly before `boundary`.
pub fn sequence_before(boundary: &str) -> Result<Vec<String>, MigrationError> {
    catalog()?.sequence_before(boundary)
}

/// Built-in names up to and including `boundary`.
pub fn sequence_through(boundary: &str) -> Result<Vec<String>, MigrationError> {
    catalog()?.sequence_through(boundary)
}
