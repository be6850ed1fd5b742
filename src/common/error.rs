use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::middleware::i18n::Locale;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Cliente não encontrado")]
    ClientNotFound,

    #[error("Assinatura não encontrada")]
    SubscriptionNotFound,

    #[error("Pagamento não encontrado")]
    PaymentNotFound,

    #[error("Transição inválida: {0}")]
    InvalidTransition(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro ao gerar documento: {0}")]
    DocumentError(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// O erro que efetivamente vai para o cliente HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::ClientNotFound | AppError::SubscriptionNotFound | AppError::PaymentNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Traduz o erro para a resposta pública, no idioma pedido.
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let en = locale.is_english();
        let status = self.status_code();

        let (error, details) = match self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let codes = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), codes);
                }
                let msg = if en { "One or more fields are invalid." } else { "Um ou mais campos são inválidos." };
                (msg.to_string(), Some(json!(details)))
            }
            AppError::BadRequest(reason) => {
                let msg = if en { "Invalid request." } else { "Requisição inválida." };
                (msg.to_string(), Some(json!({ "reason": reason })))
            }
            AppError::InvalidCredentials => {
                let msg = if en { "Invalid e-mail or password." } else { "E-mail ou senha inválidos." };
                (msg.to_string(), None)
            }
            AppError::InvalidToken => {
                let msg = if en {
                    "Missing or invalid authentication token."
                } else {
                    "Token de autenticação inválido ou ausente."
                };
                (msg.to_string(), None)
            }
            AppError::ClientNotFound => {
                let msg = if en { "Client not found." } else { "Cliente não encontrado." };
                (msg.to_string(), None)
            }
            AppError::SubscriptionNotFound => {
                let msg = if en { "Subscription not found." } else { "Assinatura não encontrada." };
                (msg.to_string(), None)
            }
            AppError::PaymentNotFound => {
                let msg = if en { "Payment not found." } else { "Pagamento não encontrado." };
                (msg.to_string(), None)
            }
            AppError::InvalidTransition(reason) => {
                let msg = if en {
                    "This operation is not allowed in the current status."
                } else {
                    "Operação não permitida no status atual."
                };
                (msg.to_string(), Some(json!({ "reason": reason })))
            }
            // Todo o resto vira 500. O detalhe fica só no log.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                let msg = if en { "An unexpected error occurred." } else { "Ocorreu um erro inesperado." };
                (msg.to_string(), None)
            }
        };

        ApiError { status, error, details }
    }
}

// Usado por extratores e middlewares que não têm acesso ao idioma
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_errors_map_to_404_in_both_languages() {
        let pt = AppError::SubscriptionNotFound.to_api_error(&Locale("pt".into()));
        let en = AppError::SubscriptionNotFound.to_api_error(&Locale("en".into()));

        assert_eq!(pt.status, StatusCode::NOT_FOUND);
        assert_eq!(pt.error, "Assinatura não encontrada.");
        assert_eq!(en.error, "Subscription not found.");
    }

    #[test]
    fn invalid_transition_is_a_conflict_with_reason() {
        let api = AppError::InvalidTransition("already_paid".into()).to_api_error(&Locale::default());

        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.details, Some(json!({ "reason": "already_paid" })));
    }

    #[test]
    fn internal_errors_hide_details() {
        let api = AppError::DocumentError("font glyph missing".into()).to_api_error(&Locale::default());

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "Ocorreu um erro inesperado.");
        assert!(api.details.is_none());
    }
}
