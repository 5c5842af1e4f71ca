use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, SqlErr,
    sea_query::Expr,
};

use crate::{
    domain::{
        error::RepositoryError,
        models::{
            account::{Account, AccountId, Email, OrganizationId, Role},
            credential::{Credential, HashedPassword},
        },
        repositories::account_repository::AccountRepository,
    },
    infrastructure::entity::accounts,
};

#[derive(Clone)]
pub struct MySqlAccountRepository {
    db: DatabaseConnection,
}

impl MySqlAccountRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

pub(crate) fn map_db_err(e: DbErr) -> RepositoryError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => RepositoryError::Conflict,
        _ => RepositoryError::DatabaseError(e.to_string()),
    }
}

fn into_account(model: accounts::Model) -> Result<Account, RepositoryError> {
    let hashed_password = model
        .hashed_password
        .map(HashedPassword::parse)
        .transpose()
        .map_err(RepositoryError::corrupt)?;
    let updated_at = hashed_password
        .as_ref()
        .map(|_| model.updated_at.naive_utc().and_utc());

    let email = Email::new(&model.email).map_err(RepositoryError::corrupt)?;
    let role = Role::try_from(model.role).map_err(RepositoryError::corrupt)?;

    Account::reconstruct(
        AccountId::from_uuid(model.id),
        OrganizationId::from_uuid(model.organization_id),
        model.first_name,
        model.last_name,
        email,
        role,
        Credential::reconstruct(hashed_password, updated_at),
    )
    .map_err(RepositoryError::corrupt)
}

#[async_trait]
impl AccountRepository for MySqlAccountRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email.as_str()))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(into_account)
            .transpose()
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        accounts::Entity::find_by_id(*id.as_uuid())
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(into_account)
            .transpose()
    }

    async fn create(&self, account: &Account) -> Result<(), RepositoryError> {
        let now = Utc::now().fixed_offset();
        let model = accounts::ActiveModel {
            id: Set(*account.id().as_uuid()),
            organization_id: Set(*account.organization_id().as_uuid()),
            first_name: Set(account.first_name().to_string()),
            last_name: Set(account.last_name().to_string()),
            email: Set(account.email().as_str().to_string()),
            role: Set(account.role().as_i32()),
            hashed_password: Set(account
                .credential()
                .hashed_secret()
                .map(|hash| hash.as_str().to_string())),
            created_at: Set(now),
            updated_at: Set(now),
        };

        accounts::Entity::insert(model)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn update_hashed_password(
        &self,
        id: &AccountId,
        hashed_password: Option<&HashedPassword>,
    ) -> Result<(), RepositoryError> {
        let hashed_password = hashed_password.map(|hash| hash.as_str().to_string());

        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::HashedPassword, Expr::value(hashed_password))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
            .filter(accounts::Column::Id.eq(*id.as_uuid()))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn replace_hashed_password(
        &self,
        id: &AccountId,
        expected: &HashedPassword,
        replacement: &HashedPassword,
    ) -> Result<bool, RepositoryError> {
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::HashedPassword,
                Expr::value(replacement.as_str().to_string()),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
            .filter(accounts::Column::Id.eq(*id.as_uuid()))
            .filter(accounts::Column::HashedPassword.eq(expected.as_str()))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected == 1)
    }
}
