// src/models/client.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- ENUMS ---

// Mapeia o CREATE TYPE client_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "client_status")]
pub enum ClientStatus {
    Lead,
    Ativo,
    Pausado,
    Encerrado,
}

// --- CLIENTE ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,

    #[schema(example = "Clínica Sorriso")]
    pub name: String,
    #[schema(example = "contato@sorriso.com.br")]
    pub email: Option<String>,
    #[schema(example = "(11) 99999-8888")]
    pub phone: Option<String>,

    pub company_name: Option<String>,
    #[schema(example = "12.345.678/0001-99")]
    pub document: Option<String>,
    #[schema(example = "Saúde")]
    pub segment: Option<String>,
    pub notes: Option<String>,

    pub status: ClientStatus,

    // JSONB no Postgres, lista tipada no Rust
    #[schema(value_type = Vec<NumberCredentials>)]
    pub numbers: Json<Vec<NumberCredentials>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- CREDENCIAIS POR NÚMERO ---

/// Pacote de credenciais de um número de WhatsApp atendido pela agência.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NumberCredentials {
    #[schema(example = "+55 11 99999-8888")]
    pub number: String,
    #[schema(example = "Atendimento")]
    pub label: Option<String>,
    #[serde(default)]
    pub sections: Vec<CredentialSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum CredentialSection {
    #[serde(rename_all = "camelCase")]
    MetaBusiness {
        #[serde(default)]
        business_manager_id: Option<String>,
        #[serde(default)]
        app_id: Option<String>,
        #[serde(default)]
        phone_number_id: Option<String>,
        #[serde(default)]
        access_token: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Hosting {
        #[serde(default)]
        provider_name: Option<String>,
        #[serde(default)]
        host: Option<String>,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Platform {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        login: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Email {
        #[serde(default)]
        address: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum MetaBusinessField {
    BusinessManagerId,
    AppId,
    PhoneNumberId,
    AccessToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum HostingField {
    ProviderName,
    Host,
    Username,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum PlatformField {
    Url,
    Login,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum EmailField {
    Address,
    Password,
}

/// Edição de um único campo de credencial.
/// Ex: `{ "provider": "meta_business", "field": "accessToken", "value": "EAAG..." }`
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum CredentialUpdate {
    MetaBusiness { field: MetaBusinessField, value: Option<String> },
    Hosting { field: HostingField, value: Option<String> },
    Platform { field: PlatformField, value: Option<String> },
    Email { field: EmailField, value: Option<String> },
}

impl CredentialSection {
    fn empty_meta_business() -> Self {
        CredentialSection::MetaBusiness {
            business_manager_id: None,
            app_id: None,
            phone_number_id: None,
            access_token: None,
        }
    }

    fn empty_hosting() -> Self {
        CredentialSection::Hosting { provider_name: None, host: None, username: None, password: None }
    }

    fn empty_platform() -> Self {
        CredentialSection::Platform { url: None, login: None, password: None }
    }

    fn empty_email() -> Self {
        CredentialSection::Email { address: None, password: None }
    }

    fn same_provider(&self, other: &CredentialSection) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CredentialSection::MetaBusiness { business_manager_id, app_id, phone_number_id, access_token } => {
                business_manager_id.is_none() && app_id.is_none() && phone_number_id.is_none() && access_token.is_none()
            }
            CredentialSection::Hosting { provider_name, host, username, password } => {
                provider_name.is_none() && host.is_none() && username.is_none() && password.is_none()
            }
            CredentialSection::Platform { url, login, password } => {
                url.is_none() && login.is_none() && password.is_none()
            }
            CredentialSection::Email { address, password } => address.is_none() && password.is_none(),
        }
    }
}

impl NumberCredentials {
    /// Seção do mesmo provedor do molde; inclui o molde se ainda não existir.
    fn section_for(&mut self, template: CredentialSection) -> &mut CredentialSection {
        let index = match self.sections.iter().position(|s| s.same_provider(&template)) {
            Some(index) => index,
            None => {
                self.sections.push(template);
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    /// Aplica a edição, criando a seção do provedor se ainda não existir.
    pub fn apply(&mut self, update: CredentialUpdate) {
        match update {
            CredentialUpdate::MetaBusiness { field, value } => {
                if let CredentialSection::MetaBusiness { business_manager_id, app_id, phone_number_id, access_token } =
                    self.section_for(CredentialSection::empty_meta_business())
                {
                    match field {
                        MetaBusinessField::BusinessManagerId => *business_manager_id = value,
                        MetaBusinessField::AppId => *app_id = value,
                        MetaBusinessField::PhoneNumberId => *phone_number_id = value,
                        MetaBusinessField::AccessToken => *access_token = value,
                    }
                }
            }
            CredentialUpdate::Hosting { field, value } => {
                if let CredentialSection::Hosting { provider_name, host, username, password } =
                    self.section_for(CredentialSection::empty_hosting())
                {
                    match field {
                        HostingField::ProviderName => *provider_name = value,
                        HostingField::Host => *host = value,
                        HostingField::Username => *username = value,
                        HostingField::Password => *password = value,
                    }
                }
            }
            CredentialUpdate::Platform { field, value } => {
                if let CredentialSection::Platform { url, login, password } =
                    self.section_for(CredentialSection::empty_platform())
                {
                    match field {
                        PlatformField::Url => *url = value,
                        PlatformField::Login => *login = value,
                        PlatformField::Password => *password = value,
                    }
                }
            }
            CredentialUpdate::Email { field, value } => {
                if let CredentialSection::Email { address, password } = self.section_for(CredentialSection::empty_email()) {
                    match field {
                        EmailField::Address => *address = value,
                        EmailField::Password => *password = value,
                    }
                }
            }
        }
    }
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Clínica Sorriso")]
    pub name: String,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub document: Option<String>,
    pub segment: Option<String>,
    pub notes: Option<String>,

    /// Padrão: Lead.
    pub status: Option<ClientStatus>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceNumbersPayload {
    #[validate(custom(function = "validate_numbers"))]
    pub numbers: Vec<NumberCredentials>,
}

fn validate_numbers(numbers: &[NumberCredentials]) -> Result<(), validator::ValidationError> {
    if numbers.iter().any(|n| n.number.trim().is_empty()) {
        return Err(validator::ValidationError::new("number_required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn apply_creates_missing_section() {
        let mut number = NumberCredentials { number: "+5511999998888".into(), ..Default::default() };

        number.apply(CredentialUpdate::MetaBusiness {
            field: MetaBusinessField::AccessToken,
            value: Some("EAAG123".into()),
        });

        assert_eq!(number.sections.len(), 1);
        assert_eq!(
            number.sections[0],
            CredentialSection::MetaBusiness {
                business_manager_id: None,
                app_id: None,
                phone_number_id: None,
                access_token: Some("EAAG123".into()),
            }
        );
    }

    #[test]
    fn apply_updates_existing_section_in_place() {
        let mut number = NumberCredentials {
            number: "+5511999998888".into(),
            label: None,
            sections: vec![
                CredentialSection::Email { address: Some("a@b.com".into()), password: None },
                CredentialSection::Platform { url: Some("https://painel".into()), login: None, password: None },
            ],
        };

        number.apply(CredentialUpdate::Platform { field: PlatformField::Login, value: Some("admin".into()) });
        number.apply(CredentialUpdate::Email { field: EmailField::Address, value: None });

        assert_eq!(number.sections.len(), 2);
        assert_eq!(
            number.sections[1],
            CredentialSection::Platform {
                url: Some("https://painel".into()),
                login: Some("admin".into()),
                password: None,
            }
        );
        assert!(number.sections[0].is_empty());
    }

    #[test]
    fn each_provider_edit_touches_only_its_own_section() {
        let hosting = CredentialSection::Hosting {
            provider_name: Some("Hostinger".into()),
            host: Some("srv1".into()),
            username: None,
            password: None,
        };
        let mut number = NumberCredentials {
            number: "+5511999998888".into(),
            label: None,
            sections: vec![hosting.clone()],
        };

        number.apply(CredentialUpdate::MetaBusiness { field: MetaBusinessField::AppId, value: Some("42".into()) });
        number.apply(CredentialUpdate::Platform { field: PlatformField::Url, value: Some("https://crm".into()) });
        number.apply(CredentialUpdate::Email { field: EmailField::Password, value: Some("s3nha".into()) });
        number.apply(CredentialUpdate::MetaBusiness { field: MetaBusinessField::AppId, value: Some("43".into()) });

        assert_eq!(number.sections.len(), 4);
        assert_eq!(number.sections[0], hosting);
        assert!(matches!(
            &number.sections[1],
            CredentialSection::MetaBusiness { app_id: Some(id), access_token: None, .. } if id == "43"
        ));
        assert!(matches!(&number.sections[2], CredentialSection::Platform { url: Some(_), login: None, .. }));
        assert!(matches!(&number.sections[3], CredentialSection::Email { address: None, password: Some(_) }));

        number.apply(CredentialUpdate::Hosting { field: HostingField::Password, value: Some("root".into()) });
        assert_eq!(number.sections.len(), 4);
        assert!(matches!(
            &number.sections[0],
            CredentialSection::Hosting { host: Some(h), password: Some(p), .. } if h == "srv1" && p == "root"
        ));
    }

    #[test]
    fn update_payload_is_tagged_by_provider() {
        let update: CredentialUpdate = serde_json::from_value(json!({
            "provider": "hosting",
            "field": "host",
            "value": "vps.flowtech.dev"
        }))
        .unwrap();

        assert_eq!(
            update,
            CredentialUpdate::Hosting { field: HostingField::Host, value: Some("vps.flowtech.dev".into()) }
        );

        let unknown = serde_json::from_value::<CredentialUpdate>(json!({
            "provider": "hosting",
            "field": "accessToken",
            "value": "x"
        }));
        assert!(unknown.is_err());
    }

    #[test]
    fn sections_serialize_with_camel_case_fields() {
        let section = CredentialSection::MetaBusiness {
            business_manager_id: Some("bm-1".into()),
            app_id: None,
            phone_number_id: None,
            access_token: None,
        };

        let value = serde_json::to_value(&section).unwrap();
        assert_eq!(value["provider"], "meta_business");
        assert_eq!(value["businessManagerId"], "bm-1");
    }
}
