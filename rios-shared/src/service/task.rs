/// Task-specific operations

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::entity::{not_found, EntityService};
use super::ServiceError;
use crate::auth::authorization::authorize_task_status;
use crate::auth::middleware::AuthContext;
use crate::db::{Repository, StoreError};
use crate::models::entity::Entity;
use crate::models::patch::Patch;
use crate::models::task::{Task, TaskPatch, TaskStatus};

pub type TaskService = EntityService<Task>;

impl EntityService<Task> {
    /// Tasks assigned to a user, earliest due first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Task>, ServiceError> {
        Ok(self.store().list_tasks_for_user(user_id).await?)
    }

    /// Closes a task on behalf of its assignee or an administrator
    ///
    /// Only `terminada` may be set through this path.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for any other status, checked first
    /// - `NotFound` if the task does not exist
    /// - `Forbidden` if a `user` does not own the task
    pub async fn update_status(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        status: &str,
    ) -> Result<Task, ServiceError> {
        match status.parse::<TaskStatus>() {
            Ok(TaskStatus::Terminada) => {}
            _ => {
                return Err(ServiceError::InvalidArgument {
                    message: "Solo se permite cambiar el estado a 'terminada'".to_string(),
                    fields: vec!["status"],
                })
            }
        }

        let mut task = self.get(id).await?;
        authorize_task_status(ctx, &task)?;

        let changes = task.merge(TaskPatch {
            status: Patch::Present(TaskStatus::Terminada.to_string()),
            ..Default::default()
        })?;
        task.touch(Utc::now());

        let updated = Repository::<Task>::update(self.store(), &task, &changes)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => not_found(Task::KIND),
                other => other.into(),
            })?;

        info!(task_id = %id, user_id = %ctx.user_id, "Task closed");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, Store};
    use crate::models::area::{Area, CreateArea};
    use crate::models::company::{Company, CreateCompany};
    use crate::models::task::CreateTask;
    use crate::models::user::{CreateUser, Role, User};
    use crate::service::ConflictCode;
    use std::sync::Arc;

    struct Fixture {
        store: Arc<dyn Store>,
        company: Company,
        area: Area,
        owner: User,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

        let company = EntityService::<Company>::new(store.clone())
            .create(CreateCompany {
                name: Some("Acme".to_string()),
                nit: Some("900".to_string()),
                email: Some("a@acme.com".to_string()),
                usuario: Some("u".to_string()),
                contrasena: Some("p".to_string()),
                servidor_correo: Some("smtp".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let area = EntityService::<Area>::new(store.clone())
            .create(CreateArea {
                name: Some("Contabilidad".to_string()),
                active: None,
            })
            .await
            .unwrap();
        let owner = EntityService::<User>::new(store.clone())
            .create(CreateUser {
                name: Some("Ana".to_string()),
                email: Some("ana@rios.com".to_string()),
                password_hash: "hash".to_string(),
                role: Role::User,
            })
            .await
            .unwrap();

        Fixture {
            store,
            company,
            area,
            owner,
        }
    }

    fn task_input(f: &Fixture) -> CreateTask {
        CreateTask {
            name: Some("Declaración".to_string()),
            description: Some("IVA bimestral".to_string()),
            company_id: Some(f.company.id),
            area_id: Some(f.area.id),
            user_id: Some(f.owner.id),
            due_date: Some("2025-05-15".to_string()),
            status: Some("pendiente".to_string()),
        }
    }

    fn ctx(user_id: Uuid, role: Role) -> AuthContext {
        AuthContext {
            user_id,
            email: "x@rios.com".to_string(),
            role,
            name: None,
        }
    }

    #[tokio::test]
    async fn test_create_with_missing_reference_writes_nothing() {
        let f = fixture().await;
        let tasks = TaskService::new(f.store.clone());

        let mut input = task_input(&f);
        input.area_id = Some(Uuid::new_v4());

        let err = tasks.create(input).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(tasks.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_owner_closes_task() {
        let f = fixture().await;
        let tasks = TaskService::new(f.store.clone());
        let task = tasks.create(task_input(&f)).await.unwrap();

        let closed = tasks
            .update_status(&ctx(f.owner.id, Role::User), task.id, "terminada")
            .await
            .unwrap();
        assert_eq!(closed.status, TaskStatus::Terminada);
        assert_eq!(tasks.list_for_user(f.owner.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_other_user_is_forbidden_admin_is_not() {
        let f = fixture().await;
        let tasks = TaskService::new(f.store.clone());
        let task = tasks.create(task_input(&f)).await.unwrap();

        let err = tasks
            .update_status(&ctx(Uuid::new_v4(), Role::User), task.id, "terminada")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        assert!(tasks
            .update_status(&ctx(Uuid::new_v4(), Role::Admin), task.id, "terminada")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_only_terminada_accepted() {
        let f = fixture().await;
        let tasks = TaskService::new(f.store.clone());
        let task = tasks.create(task_input(&f)).await.unwrap();

        for status in ["en_progreso", "pendiente", "cerrada"] {
            let err = tasks
                .update_status(&ctx(f.owner.id, Role::User), task.id, status)
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidArgument { .. }));
        }

        let err = tasks
            .update_status(&ctx(f.owner.id, Role::User), Uuid::new_v4(), "en_progreso")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_referenced_area_cannot_be_deleted() {
        let f = fixture().await;
        TaskService::new(f.store.clone())
            .create(task_input(&f))
            .await
            .unwrap();

        let areas = EntityService::<Area>::new(f.store.clone());
        let err = areas.delete(f.area.id).await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Conflict {
                code: ConflictCode::HasReferences,
                ..
            }
        ));
        assert!(areas.get(f.area.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_rechecks_changed_references() {
        let f = fixture().await;
        let tasks = TaskService::new(f.store.clone());
        let task = tasks.create(task_input(&f)).await.unwrap();

        let err = tasks
            .update(
                task.id,
                TaskPatch {
                    company_id: Patch::Present(Uuid::new_v4()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(tasks.get(task.id).await.unwrap().company_id, f.company.id);
    }
}
