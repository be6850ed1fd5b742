// src/services/credential_migration.rs

//! Converte o pacote único de credenciais (formato antigo) para a lista por número.
//! Roda uma vez na inicialização e pode ser repetida sem efeito.

use serde::Deserialize;
use serde_json::Value;

use crate::{
    common::error::AppError,
    db::ClientRepository,
    models::client::{CredentialSection, NumberCredentials},
};

pub const CREDENTIALS_VERSION: i32 = 2;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyBundle {
    number: Option<String>,
    meta: Option<LegacyMeta>,
    hosting: Option<LegacyHosting>,
    platform: Option<LegacyPlatform>,
    email: Option<LegacyEmail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyMeta {
    business_manager_id: Option<String>,
    app_id: Option<String>,
    phone_number_id: Option<String>,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyHosting {
    provider: Option<String>,
    host: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyPlatform {
    url: Option<String>,
    login: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyEmail {
    address: Option<String>,
    password: Option<String>,
}

/// Pacote antigo -> um único `NumberCredentials`. Seções vazias são descartadas.
/// Erro quando não há número no pacote nem telefone no cliente.
pub fn upgrade_legacy_bundle(
    legacy: &Value,
    fallback_number: Option<&str>,
) -> Result<NumberCredentials, AppError> {
    let bundle: LegacyBundle = serde_json::from_value(legacy.clone())
        .map_err(|e| AppError::BadRequest(format!("legacy credentials: {}", e)))?;

    let mut sections = Vec::new();
    if let Some(m) = bundle.meta {
        sections.push(CredentialSection::MetaBusiness {
            business_manager_id: m.business_manager_id,
            app_id: m.app_id,
            phone_number_id: m.phone_number_id,
            access_token: m.access_token,
        });
    }
    if let Some(h) = bundle.hosting {
        sections.push(CredentialSection::Hosting {
            provider_name: h.provider,
            host: h.host,
            username: h.username,
            password: h.password,
        });
    }
    if let Some(p) = bundle.platform {
        sections.push(CredentialSection::Platform { url: p.url, login: p.login, password: p.password });
    }
    if let Some(e) = bundle.email {
        sections.push(CredentialSection::Email { address: e.address, password: e.password });
    }
    sections.retain(|s| !s.is_empty());

    // Sem número nem telefone o registro não passaria na validação; fica como está
    let number = bundle
        .number
        .filter(|n| !n.trim().is_empty())
        .or_else(|| fallback_number.filter(|p| !p.trim().is_empty()).map(str::to_owned))
        .ok_or_else(|| AppError::BadRequest("legacy credentials without a number".into()))?;

    Ok(NumberCredentials { number, label: None, sections })
}

pub struct CredentialMigration {
    repo: ClientRepository,
}

impl CredentialMigration {
    pub fn new(repo: ClientRepository) -> Self {
        Self { repo }
    }

    /// Retorna quantos clientes foram convertidos.
    pub async fn run(&self) -> Result<usize, AppError> {
        let rows = self.repo.list_pending_credential_migrations(CREDENTIALS_VERSION).await?;
        let mut migrated = 0;

        for row in rows {
            // Quem já tem números só precisa do carimbo de versão
            let numbers = if !row.numbers.0.is_empty() {
                row.numbers.0
            } else {
                match row.credentials.as_ref().map(|c| &c.0) {
                    None | Some(Value::Null) => Vec::new(),
                    Some(legacy) => match upgrade_legacy_bundle(legacy, row.phone.as_deref()) {
                        Ok(number) => vec![number],
                        Err(e) => {
                            tracing::warn!(
                                "⚠️ Credenciais do cliente {} não convertidas, ficam no formato antigo: {}",
                                row.id,
                                e
                            );
                            continue;
                        }
                    },
                }
            };

            self.repo
                .complete_credential_migration(row.id, &numbers, CREDENTIALS_VERSION)
                .await?;
            migrated += 1;
        }

        if migrated > 0 {
            tracing::info!("🔐 {} clientes migrados para credenciais por número.", migrated);
        }
        Ok(migrated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_bundle_becomes_one_number() {
        let legacy = json!({
            "number": "+55 11 98888-7777",
            "meta": { "appId": "123", "accessToken": "EAAG" },
            "hosting": { "provider": "Hostinger", "host": "vps.cliente.com" },
            "email": {}
        });

        let upgraded = upgrade_legacy_bundle(&legacy, Some("(11) 0000-0000")).unwrap();

        assert_eq!(upgraded.number, "+55 11 98888-7777");
        assert_eq!(
            upgraded.sections,
            vec![
                CredentialSection::MetaBusiness {
                    business_manager_id: None,
                    app_id: Some("123".into()),
                    phone_number_id: None,
                    access_token: Some("EAAG".into()),
                },
                CredentialSection::Hosting {
                    provider_name: Some("Hostinger".into()),
                    host: Some("vps.cliente.com".into()),
                    username: None,
                    password: None,
                },
            ]
        );
    }

    #[test]
    fn missing_number_falls_back_to_client_phone() {
        let upgraded = upgrade_legacy_bundle(&json!({ "platform": { "url": "https://app" } }), Some("(11) 5555-0000"))
            .unwrap();

        assert_eq!(upgraded.number, "(11) 5555-0000");
        assert_eq!(upgraded.sections.len(), 1);
    }

    #[test]
    fn bundle_without_any_number_is_left_behind() {
        let legacy = json!({ "hosting": { "host": "vps.cliente.com" } });

        assert!(matches!(upgrade_legacy_bundle(&legacy, None), Err(AppError::BadRequest(_))));
        assert!(matches!(upgrade_legacy_bundle(&legacy, Some("   ")), Err(AppError::BadRequest(_))));
        assert!(upgrade_legacy_bundle(&json!({ "number": "" }), None).is_err());
    }

    #[test]
    fn malformed_bundle_is_an_error() {
        assert!(upgrade_legacy_bundle(&json!({ "meta": "not an object" }), None).is_err());
        assert!(upgrade_legacy_bundle(&json!([1, 2]), None).is_err());
    }
}
