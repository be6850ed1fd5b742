// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::AdminUser,
};

// O middleware em si: exige "Authorization: Bearer <token>"
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;

    let admin = app_state
        .auth_service
        .validate_token(token)
        .map_err(|e| e.to_api_error(&locale))?;

    // Insere o administrador nos "extensions" da requisição
    request.extensions_mut().insert(admin);
    Ok(next.run(request).await)
}

// Extrator para obter o administrador autenticado diretamente nos handlers
pub struct AuthenticatedUser(pub AdminUser);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminUser>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidToken)
    }
}
