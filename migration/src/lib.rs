pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20260301_000001_users_and_products;
mod m20260301_000002_settings;
mod m20260302_000001_mailing_list;
mod m20260303_000001_tracking;
mod m20260305_000001_otp_codes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_users_and_products::Migration),
            Box::new(m20260301_000002_settings::Migration),
            Box::new(m20260302_000001_mailing_list::Migration),
            Box::new(m20260303_000001_tracking::Migration),
            Box::new(m20260305_000001_otp_codes::Migration),
        ]
    }
}
