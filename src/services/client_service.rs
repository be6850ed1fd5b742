// src/services/client_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ClientRepository,
    models::client::{Client, ClientPayload, CredentialUpdate, NumberCredentials},
};

#[derive(Clone)]
pub struct ClientService {
    repo: ClientRepository,
}

impl ClientService {
    pub fn new(repo: ClientRepository) -> Self {
        Self { repo }
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        self.repo.list_clients().await
    }

    pub async fn get_client(&self, id: Uuid) -> Result<Client, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::ClientNotFound)
    }

    pub async fn create_client(&self, payload: &ClientPayload) -> Result<Client, AppError> {
        let client = self.repo.create_client(payload).await?;
        tracing::info!("👤 Cliente criado: {} ({})", client.name, client.id);
        Ok(client)
    }

    pub async fn update_client(&self, id: Uuid, payload: &ClientPayload) -> Result<Client, AppError> {
        self.repo.update_client(id, payload).await?.ok_or(AppError::ClientNotFound)
    }

    /// Apaga o cliente. As assinaturas e o histórico vão junto (cascade).
    pub async fn delete_client(&self, id: Uuid) -> Result<(), AppError> {
        if self.repo.delete_client(id).await? == 0 {
            return Err(AppError::ClientNotFound);
        }
        tracing::info!("🗑️ Cliente {} removido com suas assinaturas.", id);
        Ok(())
    }

    pub async fn replace_numbers(&self, id: Uuid, numbers: &[NumberCredentials]) -> Result<Client, AppError> {
        self.repo.update_numbers(id, numbers).await?.ok_or(AppError::ClientNotFound)
    }

    /// Edita um campo de credencial do número na posição `index`.
    pub async fn update_credential(
        &self,
        id: Uuid,
        index: usize,
        update: CredentialUpdate,
    ) -> Result<Client, AppError> {
        let client = self.get_client(id).await?;
        let numbers = apply_credential_update(client.numbers.0, index, update)?;
        self.replace_numbers(id, &numbers).await
    }
}

fn apply_credential_update(
    mut numbers: Vec<NumberCredentials>,
    index: usize,
    update: CredentialUpdate,
) -> Result<Vec<NumberCredentials>, AppError> {
    let number = numbers
        .get_mut(index)
        .ok_or_else(|| AppError::BadRequest(format!("number index {} out of range", index)))?;
    number.apply(update);
    Ok(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::client::{CredentialSection, HostingField};

    #[test]
    fn credential_update_touches_only_the_selected_number() {
        let numbers = vec![
            NumberCredentials { number: "+55 11 90000-0001".into(), ..Default::default() },
            NumberCredentials { number: "+55 11 90000-0002".into(), ..Default::default() },
        ];

        let updated = apply_credential_update(
            numbers,
            1,
            CredentialUpdate::Hosting { field: HostingField::Host, value: Some("vps.flowtech.dev".into()) },
        )
        .unwrap();

        assert!(updated[0].sections.is_empty());
        assert_eq!(
            updated[1].sections,
            vec![CredentialSection::Hosting {
                provider_name: None,
                host: Some("vps.flowtech.dev".into()),
                username: None,
                password: None,
            }]
        );
    }

    #[test]
    fn out_of_range_index_is_a_bad_request() {
        let result = apply_credential_update(
            Vec::new(),
            0,
            CredentialUpdate::Hosting { field: HostingField::Host, value: None },
        );

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
