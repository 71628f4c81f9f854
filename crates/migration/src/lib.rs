pub use sea_orm_migration::prelude::*;

mod m20250701_000000_init;
mod m20250815_000000_budget_original;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250701_000000_init::Migration),
            Box::new(m20250815_000000_budget_original::Migration),
        ]
    }
}
