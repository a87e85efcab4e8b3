use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::verify_token;
use crate::config;
use crate::error::ApiError;
use crate::models::user::{Role, User, UserStore};
use crate::AppState;

/// Authenticated identity attached to the request after token verification
/// and the user lookup. The role comes from the database row, not the token,
/// so role changes take effect on the next request.
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

/// Authentication stage: verify the bearer token, load the user it was
/// issued for, and attach the identity to the request.
///
/// A token for a user deleted after issuance fails the lookup and is
/// rejected even though the token itself has not expired.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?;

    let secret = &config::config().security.jwt_secret;
    let claims = verify_token(&token, secret)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token. Please login again."))?;

    let user = UserStore::new(&state.db)
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found. Token is invalid."))?;

    request.extensions_mut().insert(AuthUser(user));
    Ok(next.run(request).await)
}

/// Authorization stage: admin-only endpoints. Runs after `require_auth`;
/// a missing identity means the layers were misordered and is rejected
/// with 401 rather than granting access.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    authorize(&request, &[Role::Admin])?;
    Ok(next.run(request).await)
}

fn authorize(request: &Request, allowed: &[Role]) -> Result<(), ApiError> {
    let AuthUser(user) = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if user.role.is_member(allowed) {
        Ok(())
    } else {
        let roles = allowed
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(" or ");
        Err(ApiError::forbidden(format!(
            "Insufficient permissions. {} access required.",
            roles
        )))
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| {
            ApiError::unauthorized("Authentication required. Please provide a valid token.")
        })?
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(ApiError::unauthorized(
            "Authentication required. Please provide a valid token.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let headers = HeaderMap::new();
        assert!(matches!(
            extract_bearer_token(&headers),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcg=="));
        assert!(extract_bearer_token(&headers).is_err());

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert!(extract_bearer_token(&headers).is_err());
    }
}
