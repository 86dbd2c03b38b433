pub use sea_orm_migration::prelude::*;

mod m20250301_000001_reference;
mod m20250301_000002_transactions;
mod m20250301_000003_ledgers;
mod m20250301_000004_productions;
mod m20250315_000005_prior_costs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_reference::Migration),
            Box::new(m20250301_000002_transactions::Migration),
            Box::new(m20250301_000003_ledgers::Migration),
            Box::new(m20250301_000004_productions::Migration),
            Box::new(m20250315_000005_prior_costs::Migration),
        ]
    }
}
