/// Startup seeding
///
/// Makes sure a fresh database has an administrator to log in with and the
/// protected system company. Safe to run on every start.

use std::sync::Arc;

use tracing::info;

use crate::db::{Repository, Store};
use crate::models::company::{Company, CreateCompany, SYSTEM_COMPANY_NAME, SYSTEM_COMPANY_TIPO};
use crate::models::entity::Entity;
use crate::service::user::{CreateAccount, UserService};
use crate::service::{EntityService, ServiceError};

/// Seed administrator account
#[derive(Debug, Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Outcome of a seeding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub system_company_created: bool,
}

/// Creates the seed admin and the system company when missing
pub async fn ensure_seed_data(
    store: Arc<dyn Store>,
    admin: &SeedAdmin,
) -> Result<SeedReport, ServiceError> {
    let mut report = SeedReport::default();

    if store.find_user_by_email(&admin.email).await?.is_none() {
        UserService::new(store.clone())
            .create_account(CreateAccount {
                name: Some(admin.name.clone()),
                email: Some(admin.email.clone()),
                password: Some(admin.password.clone()),
                role: Some("admin".to_string()),
            })
            .await?;
        info!(email = %admin.email, "Seed administrator created");
        report.admin_created = true;
    }

    let companies = Repository::<Company>::list(store.as_ref()).await?;
    if !companies.iter().any(|c| c.is_protected()) {
        EntityService::<Company>::new(store)
            .create(CreateCompany {
                name: Some(SYSTEM_COMPANY_NAME.to_string()),
                tipo: Some(SYSTEM_COMPANY_TIPO.to_string()),
                nit: Some("000000000-0".to_string()),
                email: Some(admin.email.clone()),
                usuario: Some("sistema".to_string()),
                contrasena: Some("-".to_string()),
                servidor_correo: Some("-".to_string()),
                ..Default::default()
            })
            .await?;
        info!("System company created");
        report.system_company_created = true;
    }

    Ok(report)
}
