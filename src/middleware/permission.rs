use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::database::models::Identity;
use crate::error::ApiError;

/// Set of (resource, action) pairs; holding any one of them grants access
#[derive(Clone, Debug)]
pub struct RequiredPermission {
    pairs: Arc<[(String, String)]>,
}

impl RequiredPermission {
    pub fn one(resource: &str, action: &str) -> Self {
        Self::any(&[(resource, action)])
    }

    pub fn any(pairs: &[(&str, &str)]) -> Self {
        Self {
            pairs: pairs
                .iter()
                .map(|(r, a)| (r.to_string(), a.to_string()))
                .collect(),
        }
    }

    pub fn is_satisfied_by(&self, identity: &Identity) -> bool {
        self.pairs
            .iter()
            .any(|(resource, action)| identity.has_permission(resource, action))
    }
}

/// Permission gate; use with `middleware::from_fn_with_state(RequiredPermission::one(..), require_permission)`
pub async fn require_permission(
    State(required): State<RequiredPermission>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .ok_or_else(|| ApiError::unauthorized("User not authenticated"))?;

    if identity.group.is_none() {
        return Err(ApiError::forbidden("Access denied: No group assigned"));
    }

    if !required.is_satisfied_by(identity) {
        tracing::warn!("Permission denied for {} ({:?})", identity.email, required.pairs);
        return Err(ApiError::forbidden("Access denied: Insufficient permissions"));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::seeder::demo_identities;
    use chrono::Utc;

    #[test]
    fn any_of_semantics() {
        let identities = demo_identities(Utc::now());
        let john = identities.iter().find(|i| i.email == "john@example.com").unwrap();

        assert!(RequiredPermission::one("profile", "read").is_satisfied_by(john));
        assert!(!RequiredPermission::one("access", "manage").is_satisfied_by(john));
        assert!(RequiredPermission::any(&[("access", "manage"), ("profile", "read")]).is_satisfied_by(john));
        assert!(!RequiredPermission::any(&[]).is_satisfied_by(john));
    }
}
