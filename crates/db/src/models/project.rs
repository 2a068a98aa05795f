use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::user::User;
use crate::{
    entities::{project, project_member, task},
    models::ids,
};

pub const DEFAULT_PROJECT_COLOR: &str = "#3b82f6";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Project not found")]
    ProjectNotFound,
}

/// Populated project view: `owner` and `members` are resolved to their
/// public user records on every read. The owner always appears in
/// `members`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub color: String,
    pub owner: User,
    pub members: Vec<User>,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl Project {
    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.members.iter().any(|member| member.id == user_id)
    }

    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner.id == user_id
    }

    async fn from_model<C: ConnectionTrait>(db: &C, model: project::Model) -> Result<Self, DbErr> {
        let owner = User::find_by_row_id(db, model.owner_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let member_rows = project_member::Entity::find()
            .filter(project_member::Column::ProjectId.eq(model.id))
            .order_by_asc(project_member::Column::Id)
            .all(db)
            .await?;

        let mut members = Vec::with_capacity(member_rows.len());
        for row in member_rows {
            let member = User::find_by_row_id(db, row.user_id)
                .await?
                .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
            members.push(member);
        }

        Ok(Self {
            id: model.uuid,
            name: model.name,
            description: model.description,
            color: model.color,
            owner,
            members,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = project::Entity::find()
            .filter(project::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    /// Projects the given user belongs to, newest first.
    pub async fn find_for_member<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let user_row_id = ids::user_id_by_uuid(db, user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let project_row_ids: Vec<i64> = project_member::Entity::find()
            .select_only()
            .column(project_member::Column::ProjectId)
            .filter(project_member::Column::UserId.eq(user_row_id))
            .into_tuple()
            .all(db)
            .await?;

        if project_row_ids.is_empty() {
            return Ok(Vec::new());
        }

        let records = project::Entity::find()
            .filter(project::Column::Id.is_in(project_row_ids))
            .order_by_desc(project::Column::CreatedAt)
            .all(db)
            .await?;

        let mut projects = Vec::with_capacity(records.len());
        for model in records {
            projects.push(Self::from_model(db, model).await?);
        }
        Ok(projects)
    }

    /// The creator becomes owner and sole initial member.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateProject,
        project_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Self, DbErr> {
        let owner_row_id = ids::user_id_by_uuid(db, owner_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let now = Utc::now();
        let active = project::ActiveModel {
            uuid: Set(project_id),
            name: Set(data.name.clone()),
            description: Set(data.description.clone().unwrap_or_default()),
            color: Set(data
                .color
                .clone()
                .filter(|color| !color.is_empty())
                .unwrap_or_else(|| DEFAULT_PROJECT_COLOR.to_string())),
            owner_id: Set(owner_row_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;

        let membership = project_member::ActiveModel {
            project_id: Set(model.id),
            user_id: Set(owner_row_id),
            created_at: Set(now.into()),
            ..Default::default()
        };
        membership.insert(db).await?;

        Self::from_model(db, model).await
    }

    /// Partial update with the coalescing rule: empty `name`/`color` keep
    /// the previous value, while `description` is overwritten whenever the
    /// field is present, empty string included.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        payload: &UpdateProject,
    ) -> Result<Self, DbErr> {
        let record = project::Entity::find()
            .filter(project::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let mut active: project::ActiveModel = record.into();
        if let Some(name) = payload.name.clone().filter(|name| !name.is_empty()) {
            active.name = Set(name);
        }
        if let Some(description) = payload.description.clone() {
            active.description = Set(description);
        }
        if let Some(color) = payload.color.clone().filter(|color| !color.is_empty()) {
            active.color = Set(color);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Self::from_model(db, updated).await
    }

    /// Deletes the project together with its tasks and member rows. Callers
    /// run this inside a transaction so no orphaned task can survive a
    /// partial failure.
    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let record = project::Entity::find()
            .filter(project::Column::Uuid.eq(id))
            .one(db)
            .await?;

        let Some(record) = record else {
            return Ok(0);
        };

        task::Entity::delete_many()
            .filter(task::Column::ProjectId.eq(record.id))
            .exec(db)
            .await?;

        project_member::Entity::delete_many()
            .filter(project_member::Column::ProjectId.eq(record.id))
            .exec(db)
            .await?;

        let result = project::Entity::delete_many()
            .filter(project::Column::Uuid.eq(id))
            .exec(db)
            .await?;

        Ok(result.rows_affected)
    }

}
