//! Role-based access checks.
//!
//! Administrators may do anything. Everyone else may only read and create their own driver
//! application and read their own permission.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    errors::{Error, Result},
    types::{Operation, Permission, Resource},
};

/// Whether `user` may perform `operation` on `resource`
pub fn has_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> bool {
    if user.is_admin {
        return true;
    }

    matches!(
        (resource, operation),
        (Resource::DriverSurveys, Operation::ReadOwn | Operation::CreateOwn) | (Resource::DriverPermissions, Operation::ReadOwn)
    )
}

/// Fail with `InsufficientPermissions` unless `user` may perform `operation` on `resource`
pub fn require_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> Result<()> {
    if has_permission(user, resource, operation) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: Permission::Allow(resource, operation),
            action: operation,
            resource: resource.to_string(),
        })
    }
}

pub trait ResourceKind: Send + Sync {
    const RESOURCE: Resource;
}

pub trait OperationKind: Send + Sync {
    const OPERATION: Operation;
}

pub mod resource {
    use super::ResourceKind;
    use crate::types::Resource;

    pub struct DriverSurveys;
    pub struct DriverPermissions;

    impl ResourceKind for DriverSurveys {
        const RESOURCE: Resource = Resource::DriverSurveys;
    }

    impl ResourceKind for DriverPermissions {
        const RESOURCE: Resource = Resource::DriverPermissions;
    }
}

pub mod operation {
    use super::OperationKind;
    use crate::types::Operation;

    pub struct ReadAll;
    pub struct ReadOwn;
    pub struct CreateOwn;
    pub struct UpdateAll;

    impl OperationKind for ReadAll {
        const OPERATION: Operation = Operation::ReadAll;
    }

    impl OperationKind for ReadOwn {
        const OPERATION: Operation = Operation::ReadOwn;
    }

    impl OperationKind for CreateOwn {
        const OPERATION: Operation = Operation::CreateOwn;
    }

    impl OperationKind for UpdateAll {
        const OPERATION: Operation = Operation::UpdateAll;
    }
}

/// Extractor guard: rejects the request unless the caller holds the permission
pub struct RequiresPermission<R, O>(PhantomData<(R, O)>);

impl<R: ResourceKind, O: OperationKind> FromRequestParts<AppState> for RequiresPermission<R, O> {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        require_permission(&user, R::RESOURCE, O::OPERATION)?;
        Ok(Self(PhantomData))
    }
}
