/// Company-specific operations

use uuid::Uuid;

use super::entity::EntityService;
use super::ServiceError;
use crate::models::company::Company;
use crate::models::entity::EntityKind;

pub type CompanyService = EntityService<Company>;

impl EntityService<Company> {
    /// Whether a NIT is already registered (case-insensitive)
    ///
    /// `exclude` skips the company being edited.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `nit` is blank
    pub async fn nit_exists(&self, nit: &str, exclude: Option<Uuid>) -> Result<bool, ServiceError> {
        if nit.trim().is_empty() {
            return Err(ServiceError::InvalidArgument {
                message: "El parámetro nit es requerido".to_string(),
                fields: vec!["nit"],
            });
        }

        Ok(self
            .store()
            .value_taken(EntityKind::Company, "nit", nit, exclude)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::company::{CompanyPatch, CreateCompany, SYSTEM_COMPANY_NAME};
    use crate::models::patch::Patch;
    use crate::service::ConflictCode;
    use std::sync::Arc;

    fn service() -> CompanyService {
        CompanyService::new(Arc::new(MemoryStore::new()))
    }

    fn input(name: &str, nit: &str, email: &str) -> CreateCompany {
        CreateCompany {
            name: Some(name.to_string()),
            nit: Some(nit.to_string()),
            email: Some(email.to_string()),
            usuario: Some("contador".to_string()),
            contrasena: Some("secreta".to_string()),
            servidor_correo: Some("smtp.acme.com".to_string()),
            cedula: Some("1020304050".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_rejects_missing_credentials() {
        let err = service()
            .create(CreateCompany {
                name: Some("Acme".to_string()),
                nit: Some("900.1-1".to_string()),
                email: Some("a@acme.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();

        match err {
            ServiceError::InvalidArgument { fields, .. } => {
                assert_eq!(fields, vec!["usuario", "contraseña", "servidorCorreo"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_nit_is_conflict() {
        let companies = service();
        companies.create(input("Acme", "900.1-1", "a@acme.com")).await.unwrap();

        let err = companies
            .create(input("Acme 2", "900.1-1", "b@acme.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Conflict {
                code: ConflictCode::Duplicate,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_nit_exists_excludes_edited_row() {
        let companies = service();
        let acme = companies.create(input("Acme", "NIT-9", "a@acme.com")).await.unwrap();

        assert!(companies.nit_exists("nit-9", None).await.unwrap());
        assert!(!companies.nit_exists("NIT-9", Some(acme.id)).await.unwrap());
        assert!(!companies.nit_exists("other", None).await.unwrap());
        assert!(companies.nit_exists("  ", None).await.is_err());
    }

    #[tokio::test]
    async fn test_partial_update_presence_semantics() {
        let companies = service();
        let acme = companies.create(input("Acme", "900", "a@acme.com")).await.unwrap();

        let updated = companies
            .update(
                acme.id,
                CompanyPatch {
                    cedula: Patch::Present(Some(String::new())),
                    active: Patch::Present(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.cedula.as_deref(), Some(""));
        assert!(!updated.active);
        assert_eq!(updated.name, "Acme");
        assert_eq!(updated.usuario, "contador");
        assert!(updated.updated_at >= acme.updated_at);

        let stored = companies.get(acme.id).await.unwrap();
        assert_eq!(stored.cedula.as_deref(), Some(""));
        assert_eq!(stored.servidor_correo, "smtp.acme.com");
    }

    #[tokio::test]
    async fn test_padded_nit_update_still_blocks_duplicates() {
        let companies = service();
        let acme = companies.create(input("Acme", "900", "a@acme.com")).await.unwrap();

        let updated = companies
            .update(
                acme.id,
                CompanyPatch {
                    nit: Patch::Present("  901  ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.nit, "901");
        assert!(companies.nit_exists("901", None).await.unwrap());

        let err = companies
            .create(input("Otra", "901", "otra@acme.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Conflict {
                code: ConflictCode::Duplicate,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_system_company_is_protected() {
        let companies = service();
        let system = companies
            .create(input(SYSTEM_COMPANY_NAME, "000", "sistema@rios.com"))
            .await
            .unwrap();

        let err = companies
            .update(
                system.id,
                CompanyPatch {
                    name: Patch::Present("Otra".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = companies.delete(system.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert!(companies.get(system.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_missing_company() {
        let err = service()
            .update(Uuid::new_v4(), CompanyPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::NotFound("Empresa no encontrada".to_string()));
    }
}
