/// Role-based access policy
///
/// Roles are not a ladder: `superadmin` may edit and delete but not create or
/// list, and regular users may close their own tasks. Each protected
/// operation therefore names its allow-set explicitly.
///
/// ```text
/// Action                                   Roles
/// list/create company, area, task, user    admin
/// update/delete company, area, task        admin, superadmin
/// delete user, delete custom filter        admin, superadmin
/// update task status                       user (own tasks), admin
/// my tasks, me                             any authenticated
/// ```

use super::middleware::AuthContext;
use crate::models::task::Task;
use crate::models::user::Role;

const ADMIN: &[Role] = &[Role::Admin];
const ADMIN_OR_SUPERADMIN: &[Role] = &[Role::Admin, Role::Superadmin];
const USER_OR_ADMIN: &[Role] = &[Role::User, Role::Admin];
const ANY: &[Role] = &[Role::User, Role::Admin, Role::Superadmin];

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Role not in the action's allow-set
    #[error("No tiene permisos para esta operación")]
    RoleNotAllowed { role: Role, action: Action },

    /// A `user` acting on someone else's task
    #[error("Solo puede modificar sus propias tareas")]
    NotOwner,
}

/// Protected operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ListCompanies,
    CreateCompany,
    UpdateCompany,
    DeleteCompany,
    ListAreas,
    CreateArea,
    UpdateArea,
    DeleteArea,
    ListTasks,
    CreateTask,
    UpdateTask,
    DeleteTask,
    UpdateTaskStatus,
    ListMyTasks,
    ListUsers,
    CreateUser,
    DeleteUser,
    DeleteCustomFilter,
    ViewSession,
}

impl Action {
    /// Roles permitted to perform this action
    pub fn allowed_roles(&self) -> &'static [Role] {
        use Action::*;

        match self {
            ListCompanies | CreateCompany | ListAreas | CreateArea | ListTasks | CreateTask
            | ListUsers | CreateUser => ADMIN,
            UpdateCompany | DeleteCompany | UpdateArea | DeleteArea | UpdateTask | DeleteTask
            | DeleteUser | DeleteCustomFilter => ADMIN_OR_SUPERADMIN,
            UpdateTaskStatus => USER_OR_ADMIN,
            ListMyTasks | ViewSession => ANY,
        }
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }
}

/// Checks the caller's role against the action's allow-set
pub fn authorize(ctx: &AuthContext, action: Action) -> Result<(), AuthzError> {
    if action.allows(ctx.role) {
        Ok(())
    } else {
        tracing::debug!(user_id = %ctx.user_id, role = %ctx.role, ?action, "Role not allowed");
        Err(AuthzError::RoleNotAllowed {
            role: ctx.role,
            action,
        })
    }
}

/// Checks a status change on `task`: `user` only on own tasks, `admin` on any
pub fn authorize_task_status(ctx: &AuthContext, task: &Task) -> Result<(), AuthzError> {
    authorize(ctx, Action::UpdateTaskStatus)?;

    match ctx.role {
        Role::User if task.user_id != ctx.user_id => Err(AuthzError::NotOwner),
        _ => Ok(()),
    }
}
