use async_trait::async_trait;
use sea_orm::{ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::{
    domain::{
        error::RepositoryError,
        models::{account::AccountId, security_key::SecurityKey},
        repositories::security_key_repository::SecurityKeyRepository,
    },
    infrastructure::{account_repository::map_db_err, entity::security_keys},
};

#[derive(Clone)]
pub struct MySqlSecurityKeyRepository {
    db: DatabaseConnection,
}

impl MySqlSecurityKeyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn into_security_key(model: security_keys::Model) -> SecurityKey {
    SecurityKey::reconstruct(
        AccountId::from_uuid(model.account_id),
        model.secret_key,
        model.created_at.naive_utc().and_utc(),
    )
}

#[async_trait]
impl SecurityKeyRepository for MySqlSecurityKeyRepository {
    async fn find_by_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<SecurityKey>, RepositoryError> {
        let model = security_keys::Entity::find_by_id(*account_id.as_uuid())
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(model.map(into_security_key))
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<SecurityKey>, RepositoryError> {
        let model = security_keys::Entity::find()
            .filter(security_keys::Column::SecretKey.eq(key))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(model.map(into_security_key))
    }

    async fn save(&self, key: &SecurityKey) -> Result<(), RepositoryError> {
        let model = security_keys::ActiveModel {
            account_id: Set(*key.account_id().as_uuid()),
            secret_key: Set(key.key().to_string()),
            created_at: Set(key.created_at().fixed_offset()),
        };
        security_keys::Entity::insert(model)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn delete_for_account(&self, account_id: &AccountId) -> Result<(), RepositoryError> {
        security_keys::Entity::delete_many()
            .filter(security_keys::Column::AccountId.eq(*account_id.as_uuid()))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn consume(&self, key: &str) -> Result<bool, RepositoryError> {
        let result = security_keys::Entity::delete_many()
            .filter(security_keys::Column::SecretKey.eq(key))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected == 1)
    }
}
