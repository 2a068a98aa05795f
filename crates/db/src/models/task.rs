use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::user::User;
pub use crate::types::{Subtask, TaskPriority, TaskStatus};
use crate::{entities::task, models::ids};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Task not found")]
    TaskNotFound,
}

/// Populated task view: `assigned_to` and `created_by` resolve to public
/// user records; the parent project stays a uuid reference.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[ts(type = "Date | null")]
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<User>,
    pub created_by: User,
    pub subtasks: Vec<Subtask>,
    pub position: i32,
    #[ts(type = "Date")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "Date")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub title: String,
    /// Uuid of the parent project; immutable after creation.
    pub project: Uuid,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[ts(type = "Date | null")]
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
    pub subtasks: Option<Vec<Subtask>>,
}

/// Presence-sensitive partial update. A missing field keeps the stored
/// value; for the nullable fields an explicit JSON `null` clears it, which
/// is why `due_date` and `assigned_to` are double-wrapped.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "double_option")]
    #[ts(type = "Date | null")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,
    pub subtasks: Option<Vec<Subtask>>,
    pub position: Option<i32>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Aggregated per-project counters; computed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
    pub overdue: usize,
    pub high_priority: usize,
}

fn subtasks_to_json(subtasks: &[Subtask]) -> Result<serde_json::Value, DbErr> {
    serde_json::to_value(subtasks).map_err(|err| DbErr::Custom(err.to_string()))
}

fn subtasks_from_json(value: serde_json::Value) -> Vec<Subtask> {
    serde_json::from_value(value).unwrap_or_default()
}

impl Task {
    async fn from_model<C: ConnectionTrait>(db: &C, model: task::Model) -> Result<Self, DbErr> {
        let project_id = ids::project_uuid_by_id(db, model.project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
        let assigned_to = match model.assigned_to {
            Some(id) => User::find_by_row_id(db, id)
                .await?
                .ok_or(DbErr::RecordNotFound("User not found".to_string()))
                .map(Some)?,
            None => None,
        };
        let created_by = User::find_by_row_id(db, model.created_by)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        Ok(Self {
            id: model.uuid,
            project_id,
            title: model.title,
            description: model.description,
            status: model.status,
            priority: model.priority,
            due_date: model.due_date.map(Into::into),
            assigned_to,
            created_by,
            subtasks: subtasks_from_json(model.subtasks),
            position: model.position,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    /// Board listing order: position ascending, then newest first among
    /// equal positions.
    pub async fn find_by_project_id<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let project_row_id = ids::project_id_by_uuid(db, project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let models = task::Entity::find()
            .filter(task::Column::ProjectId.eq(project_row_id))
            .order_by_asc(task::Column::Position)
            .order_by_desc(task::Column::CreatedAt)
            .all(db)
            .await?;

        let mut tasks = Vec::with_capacity(models.len());
        for model in models {
            tasks.push(Self::from_model(db, model).await?);
        }
        Ok(tasks)
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTask,
        created_by: Uuid,
        task_id: Uuid,
    ) -> Result<Self, DbErr> {
        let project_row_id = ids::project_id_by_uuid(db, data.project)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
        let creator_row_id = ids::user_id_by_uuid(db, created_by)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
        let assigned_row_id = match data.assigned_to {
            Some(id) => ids::user_id_by_uuid(db, id)
                .await?
                .ok_or(DbErr::RecordNotFound("User not found".to_string()))
                .map(Some)?,
            None => None,
        };

        let now = Utc::now();
        let active = task::ActiveModel {
            uuid: Set(task_id),
            project_id: Set(project_row_id),
            title: Set(data.title.clone()),
            description: Set(data.description.clone().unwrap_or_default()),
            status: Set(data.status.unwrap_or_default()),
            priority: Set(data.priority.unwrap_or_default()),
            due_date: Set(data.due_date.map(Into::into)),
            assigned_to: Set(assigned_row_id),
            created_by: Set(creator_row_id),
            subtasks: Set(subtasks_to_json(data.subtasks.as_deref().unwrap_or_default())?),
            position: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        Self::from_model(db, model).await
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        payload: &UpdateTask,
    ) -> Result<Self, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;

        let mut active: task::ActiveModel = record.into();
        if let Some(title) = payload.title.clone() {
            active.title = Set(title);
        }
        if let Some(description) = payload.description.clone() {
            active.description = Set(description);
        }
        if let Some(status) = payload.status {
            active.status = Set(status);
        }
        if let Some(priority) = payload.priority {
            active.priority = Set(priority);
        }
        if let Some(due_date) = payload.due_date {
            active.due_date = Set(due_date.map(Into::into));
        }
        if let Some(assigned_to) = payload.assigned_to {
            let assigned_row_id = match assigned_to {
                Some(user_id) => ids::user_id_by_uuid(db, user_id)
                    .await?
                    .ok_or(DbErr::RecordNotFound("User not found".to_string()))
                    .map(Some)?,
                None => None,
            };
            active.assigned_to = Set(assigned_row_id);
        }
        if let Some(subtasks) = payload.subtasks.as_deref() {
            active.subtasks = Set(subtasks_to_json(subtasks)?);
        }
        if let Some(position) = payload.position {
            active.position = Set(position);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Self::from_model(db, updated).await
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = task::Entity::delete_many()
            .filter(task::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn count_by_project_id<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
    ) -> Result<u64, DbErr> {
        let Some(project_row_id) = ids::project_id_by_uuid(db, project_id).await? else {
            return Ok(0);
        };
        task::Entity::find()
            .filter(task::Column::ProjectId.eq(project_row_id))
            .count(db)
            .await
    }

    /// Overdue means the due date is in the past and the task is not done.
    pub async fn stats_for_project<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
    ) -> Result<TaskStats, DbErr> {
        let project_row_id = ids::project_id_by_uuid(db, project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let models = task::Entity::find()
            .filter(task::Column::ProjectId.eq(project_row_id))
            .all(db)
            .await?;

        let now = Utc::now();
        let mut stats = TaskStats {
            total: models.len(),
            todo: 0,
            in_progress: 0,
            done: 0,
            overdue: 0,
            high_priority: 0,
        };
        for model in &models {
            match model.status {
                TaskStatus::Todo => stats.todo += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Done => stats.done += 1,
            }
            if let Some(due) = model.due_date
                && DateTime::<Utc>::from(due) < now
                && model.status != TaskStatus::Done
            {
                stats.overdue += 1;
            }
            if model.priority.is_high() {
                stats.high_priority += 1;
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::{
        project::{CreateProject, Project},
        user::CreateUser,
    };

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn seed_user<C: ConnectionTrait>(db: &C, email: &str) -> User {
        User::create(
            db,
            &CreateUser {
                name: "Ada".to_string(),
                email: email.to_string(),
                password: "hunter2".to_string(),
            },
            "hash".to_string(),
            Uuid::new_v4(),
        )
        .await
        .unwrap()
    }

    async fn seed_project<C: ConnectionTrait>(db: &C, owner: &User) -> Project {
        Project::create(
            db,
            &CreateProject {
                name: "Apollo".to_string(),
                description: None,
                color: None,
            },
            Uuid::new_v4(),
            owner.id,
        )
        .await
        .unwrap()
    }

    fn new_task(project: Uuid, title: &str) -> CreateTask {
        CreateTask {
            title: title.to_string(),
            project,
            description: None,
            status: None,
            priority: None,
            due_date: None,
            assigned_to: None,
            subtasks: None,
        }
    }

    #[tokio::test]
    async fn create_applies_documented_defaults() {
        let db = setup_db().await;
        let user = seed_user(&db, "ada@example.com").await;
        let project = seed_project(&db, &user).await;

        let task = Task::create(&db, &new_task(project.id, "First"), user.id, Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(task.assigned_to.is_none());
        assert!(task.subtasks.is_empty());
        assert_eq!(task.position, 0);
        assert_eq!(task.created_by.id, user.id);
        assert_eq!(task.project_id, project.id);
    }

    #[tokio::test]
    async fn listing_sorts_by_position_then_newest() {
        let db = setup_db().await;
        let user = seed_user(&db, "ada@example.com").await;
        let project = seed_project(&db, &user).await;

        let a = Task::create(&db, &new_task(project.id, "a"), user.id, Uuid::new_v4())
            .await
            .unwrap();
        Task::create(&db, &new_task(project.id, "b"), user.id, Uuid::new_v4())
            .await
            .unwrap();
        let c = Task::create(&db, &new_task(project.id, "c"), user.id, Uuid::new_v4())
            .await
            .unwrap();

        Task::update(
            &db,
            a.id,
            &UpdateTask {
                position: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        Task::update(
            &db,
            c.id,
            &UpdateTask {
                position: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let tasks = Task::find_by_project_id(&db, project.id).await.unwrap();
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        // b keeps position 0, then c at 1, then a at 2.
        assert_eq!(titles, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn update_distinguishes_omitted_from_null() {
        let db = setup_db().await;
        let user = seed_user(&db, "ada@example.com").await;
        let project = seed_project(&db, &user).await;

        let due = Utc::now() + Duration::days(3);
        let task = Task::create(
            &db,
            &CreateTask {
                due_date: Some(due),
                assigned_to: Some(user.id),
                ..new_task(project.id, "strict")
            },
            user.id,
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        // Field omitted entirely: nothing changes.
        let omitted: UpdateTask =
            serde_json::from_value(serde_json::json!({ "title": "renamed" })).unwrap();
        let updated = Task::update(&db, task.id, &omitted).await.unwrap();
        assert_eq!(updated.title, "renamed");
        assert!(updated.due_date.is_some());
        assert!(updated.assigned_to.is_some());

        // Explicit null: the field is cleared.
        let nulled: UpdateTask = serde_json::from_value(
            serde_json::json!({ "dueDate": null, "assignedTo": null }),
        )
        .unwrap();
        let cleared = Task::update(&db, task.id, &nulled).await.unwrap();
        assert!(cleared.due_date.is_none());
        assert!(cleared.assigned_to.is_none());
        assert_eq!(cleared.title, "renamed");
    }

    #[tokio::test]
    async fn update_replaces_subtasks_wholesale() {
        let db = setup_db().await;
        let user = seed_user(&db, "ada@example.com").await;
        let project = seed_project(&db, &user).await;
        let task = Task::create(&db, &new_task(project.id, "t"), user.id, Uuid::new_v4())
            .await
            .unwrap();

        let updated = Task::update(
            &db,
            task.id,
            &UpdateTask {
                subtasks: Some(vec![
                    Subtask {
                        title: "one".to_string(),
                        completed: true,
                    },
                    Subtask {
                        title: "two".to_string(),
                        completed: false,
                    },
                ]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.subtasks.len(), 2);
        assert!(updated.subtasks[0].completed);
        assert_eq!(updated.subtasks[1].title, "two");
    }

    #[tokio::test]
    async fn project_delete_cascades_to_tasks() {
        let db = setup_db().await;
        let user = seed_user(&db, "ada@example.com").await;
        let project = seed_project(&db, &user).await;
        let other = seed_project(&db, &user).await;

        Task::create(&db, &new_task(project.id, "one"), user.id, Uuid::new_v4())
            .await
            .unwrap();
        Task::create(&db, &new_task(project.id, "two"), user.id, Uuid::new_v4())
            .await
            .unwrap();
        let survivor = Task::create(&db, &new_task(other.id, "keep"), user.id, Uuid::new_v4())
            .await
            .unwrap();

        let rows = Project::delete(&db, project.id).await.unwrap();
        assert_eq!(rows, 1);

        assert_eq!(Task::count_by_project_id(&db, project.id).await.unwrap(), 0);
        assert!(Task::find_by_id(&db, survivor.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn stats_fixture_matches_expected_counts() {
        let db = setup_db().await;
        let user = seed_user(&db, "ada@example.com").await;
        let project = seed_project(&db, &user).await;

        let yesterday = Utc::now() - Duration::days(1);
        let tomorrow = Utc::now() + Duration::days(1);

        Task::create(
            &db,
            &CreateTask {
                status: Some(TaskStatus::Done),
                due_date: Some(yesterday),
                priority: Some(TaskPriority::Urgent),
                ..new_task(project.id, "shipped late")
            },
            user.id,
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        Task::create(
            &db,
            &CreateTask {
                due_date: Some(yesterday),
                priority: Some(TaskPriority::High),
                ..new_task(project.id, "slipping")
            },
            user.id,
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        Task::create(
            &db,
            &CreateTask {
                due_date: Some(tomorrow),
                ..new_task(project.id, "on track")
            },
            user.id,
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let stats = Task::stats_for_project(&db, project.id).await.unwrap();
        assert_eq!(
            stats,
            TaskStats {
                total: 3,
                todo: 2,
                in_progress: 0,
                done: 1,
                overdue: 1,
                high_priority: 2,
            }
        );
    }
}
