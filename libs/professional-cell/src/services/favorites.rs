use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{Favorite, FavoriteWithProfessional, ProfessionalError};
use crate::store::{FavoriteStore, ProfessionalDirectory};

pub struct FavoriteService {
    favorites: Arc<dyn FavoriteStore>,
    directory: Arc<dyn ProfessionalDirectory>,
}

impl FavoriteService {
    pub fn new(favorites: Arc<dyn FavoriteStore>, directory: Arc<dyn ProfessionalDirectory>) -> Self {
        Self { favorites, directory }
    }

    #[instrument(skip(self))]
    pub async fn add_favorite(&self, client_id: Uuid, professional_id: Uuid) -> Result<Favorite, ProfessionalError> {
        if self.directory.get_professional(professional_id).await?.is_none() {
            return Err(ProfessionalError::NotFound);
        }
        if self.favorites.find_favorite(client_id, professional_id).await?.is_some() {
            return Err(ProfessionalError::FavoriteExists);
        }

        let favorite = self
            .favorites
            .save_favorite(Favorite {
                id: Uuid::new_v4(),
                client_id,
                professional_id,
                created_at: Utc::now(),
            })
            .await?;

        info!("Client {} added professional {} to favorites", client_id, professional_id);
        Ok(favorite)
    }

    #[instrument(skip(self))]
    pub async fn remove_favorite(&self, client_id: Uuid, professional_id: Uuid) -> Result<(), ProfessionalError> {
        let favorite = self
            .favorites
            .find_favorite(client_id, professional_id)
            .await?
            .ok_or(ProfessionalError::FavoriteNotFound)?;

        self.favorites.delete_favorite(favorite.id).await?;
        info!("Client {} removed professional {} from favorites", client_id, professional_id);
        Ok(())
    }

    pub async fn is_favorite(&self, client_id: Uuid, professional_id: Uuid) -> Result<bool, ProfessionalError> {
        Ok(self.favorites.find_favorite(client_id, professional_id).await?.is_some())
    }

    pub async fn list_favorites(&self, client_id: Uuid) -> Result<Vec<FavoriteWithProfessional>, ProfessionalError> {
        let favorites = self.favorites.list_favorites(client_id).await?;

        try_join_all(favorites.into_iter().map(|favorite| async move {
            let professional = self.directory.get_professional(favorite.professional_id).await?;
            Ok::<_, ProfessionalError>(FavoriteWithProfessional { favorite, professional })
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Professional;
    use crate::store::{InMemoryFavoriteStore, InMemoryProfessionalDirectory};
    use assert_matches::assert_matches;

    async fn setup() -> (FavoriteService, Uuid) {
        let directory = Arc::new(InMemoryProfessionalDirectory::new());
        let pro_id = Uuid::new_v4();
        directory
            .save_professional(Professional {
                id: pro_id,
                full_name: "Ana Ruiz".into(),
                specialty: "Psicología".into(),
                description: None,
                experience_years: None,
                consultation_price: None,
                address: None,
                city: None,
                photo_url: None,
                rating: 0.0,
                review_count: 0,
                license: None,
                languages: vec![],
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        (FavoriteService::new(Arc::new(InMemoryFavoriteStore::new()), directory), pro_id)
    }

    #[tokio::test]
    async fn add_list_remove_favorite() {
        let (service, pro_id) = setup().await;
        let client = Uuid::new_v4();

        tokio_test::assert_ok!(service.add_favorite(client, pro_id).await);
        assert!(service.is_favorite(client, pro_id).await.unwrap());

        let listed = service.list_favorites(client).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].professional.as_ref().map(|p| p.id), Some(pro_id));

        service.remove_favorite(client, pro_id).await.unwrap();
        assert!(service.list_favorites(client).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_duplicates_and_unknown_professionals() {
        let (service, pro_id) = setup().await;
        let client = Uuid::new_v4();

        service.add_favorite(client, pro_id).await.unwrap();
        assert_matches!(service.add_favorite(client, pro_id).await, Err(ProfessionalError::FavoriteExists));
        assert_matches!(service.add_favorite(client, Uuid::new_v4()).await, Err(ProfessionalError::NotFound));
        assert_matches!(
            service.remove_favorite(Uuid::new_v4(), pro_id).await,
            Err(ProfessionalError::FavoriteNotFound)
        );
    }
}
