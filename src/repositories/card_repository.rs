use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::payment_card::Entity as PaymentCard;
use crate::errors::ServiceError;
use crate::repositories::{BaseRepository, Repository};

/// Read-only lookup for payment cards. Contribution amounts come from the
/// caller, so existence is the only fact the settlement core needs.
#[derive(Debug, Clone)]
pub struct CardRepository {
    base: BaseRepository,
}

impl CardRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, ServiceError> {
        let count = PaymentCard::find_by_id(id)
            .count(self.base.get_db())
            .await?;
        Ok(count > 0)
    }
}
