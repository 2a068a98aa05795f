use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use crate::entities::user;

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("An account with this email already exists")]
    EmailTaken,
}

/// Public view of an account. The password hash never leaves the entity
/// layer except through `find_credentials_by_email`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl User {
    pub(crate) fn from_model(model: user::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            email: model.email,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub(crate) async fn find_by_row_id<C: ConnectionTrait>(
        db: &C,
        id: i64,
    ) -> Result<Option<Self>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Id.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    /// Login lookup; returns the stored password hash alongside the public
    /// view so the caller can verify the presented credential.
    pub async fn find_credentials_by_email<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<Option<(Self, String)>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(db)
            .await?;
        Ok(record.map(|model| {
            let hash = model.password_hash.clone();
            (Self::from_model(model), hash)
        }))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateUser,
        password_hash: String,
        user_id: Uuid,
    ) -> Result<Self, UserError> {
        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(data.email.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(UserError::EmailTaken);
        }

        let now = Utc::now();
        let active = user::ActiveModel {
            uuid: Set(user_id),
            name: Set(data.name.clone()),
            email: Set(data.email.clone()),
            password_hash: Set(password_hash),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn new_user(name: &str, email: &str) -> CreateUser {
        CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_find_roundtrip() {
        let db = setup_db().await;

        let id = Uuid::new_v4();
        let user = User::create(&db, &new_user("Ada", "ada@example.com"), "hash".into(), id)
            .await
            .unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email, "ada@example.com");

        let found = User::find_by_id(&db, id).await.unwrap().expect("user");
        assert_eq!(found.name, "Ada");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = setup_db().await;

        User::create(
            &db,
            &new_user("Ada", "ada@example.com"),
            "hash".into(),
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let err = User::create(
            &db,
            &new_user("Imposter", "ada@example.com"),
            "hash".into(),
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UserError::EmailTaken));
    }

    #[tokio::test]
    async fn credentials_lookup_returns_stored_hash() {
        let db = setup_db().await;

        User::create(
            &db,
            &new_user("Ada", "ada@example.com"),
            "stored-hash".into(),
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let (user, hash) = User::find_credentials_by_email(&db, "ada@example.com")
            .await
            .unwrap()
            .expect("credentials");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(hash, "stored-hash");

        assert!(
            User::find_credentials_by_email(&db, "nobody@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }
}
