#[cfg(test)]
use crate::features::auth::model::AuthenticatedUser;

#[cfg(test)]
use axum::{extract::Request, middleware::Next, response::Response, Router};

#[cfg(test)]
pub fn create_user(sub: &str, roles: &[&str]) -> AuthenticatedUser {
    AuthenticatedUser {
        sub: sub.to_string(),
        name: None,
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

/// Wrap a router so every request is made as the given user, skipping token validation.
#[cfg(test)]
pub fn with_user(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                let response: Response = next.run(request).await;
                response
            }
        },
    ))
}
