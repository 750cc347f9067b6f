use crate::{
    db::DbPool,
    entities::{
        property,
        task::{self, JobAllocated},
        task_image::{self, TaskImageType},
        tenant,
    },
    errors::ServiceError,
    services::{not_blank, remove_stored_file, today, UploadedFile},
    storage::{is_image_file_name, FileStorage, UploadArea},
};
use chrono::NaiveDate;
use metrics::counter;
use sea_orm::{
    sea_query::{NullOrdering, Order},
    ActiveModelTrait, EntityTrait, ModelTrait, QueryOrder, Select, Set,
};
use serde::Deserialize;
use slog::Logger;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const DUPLICATE_JOB_MESSAGE: &str = "A task with this job ID already exists.";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TaskInput {
    #[validate(length(min = 1, max = 50), custom = "not_blank")]
    pub job_id: String,
    pub property_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub date_issue_reported: NaiveDate,
    #[validate(custom = "not_blank")]
    pub description_of_issue: String,
    pub job_allocated: Option<JobAllocated>,
    pub date_completed: Option<NaiveDate>,
}

impl TaskInput {
    fn apply(self, model: &mut task::ActiveModel) {
        model.job_id = Set(self.job_id.trim().to_string());
        model.property_id = Set(self.property_id);
        model.tenant_id = Set(self.tenant_id);
        model.date_issue_reported = Set(self.date_issue_reported);
        model.description_of_issue = Set(self.description_of_issue);
        model.job_allocated = Set(self.job_allocated);
        model.date_completed = Set(self.date_completed);
    }
}

/// Orderings offered by the maintenance logbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogbookSort {
    /// Open jobs first, newest report first
    Pending,
    /// Most recently completed first, open jobs last
    NotPending,
    CompletedAsc,
    CompletedDesc,
    ReportedAsc,
    ReportedDesc,
    JobIdDesc,
    #[default]
    JobIdAsc,
}

impl LogbookSort {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("pending") => LogbookSort::Pending,
            Some("not_pending") => LogbookSort::NotPending,
            Some("completed_asc") => LogbookSort::CompletedAsc,
            Some("completed_desc") => LogbookSort::CompletedDesc,
            Some("reported_asc") => LogbookSort::ReportedAsc,
            Some("reported_desc") => LogbookSort::ReportedDesc,
            Some("job_id_desc") => LogbookSort::JobIdDesc,
            _ => LogbookSort::JobIdAsc,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            LogbookSort::Pending => "pending",
            LogbookSort::NotPending => "not_pending",
            LogbookSort::CompletedAsc => "completed_asc",
            LogbookSort::CompletedDesc => "completed_desc",
            LogbookSort::ReportedAsc => "reported_asc",
            LogbookSort::ReportedDesc => "reported_desc",
            LogbookSort::JobIdDesc => "job_id_desc",
            LogbookSort::JobIdAsc => "job_id_asc",
        }
    }

    fn apply(&self, query: Select<task::Entity>) -> Select<task::Entity> {
        use task::Column;
        match self {
            LogbookSort::Pending => query
                .order_by_with_nulls(Column::DateCompleted, Order::Asc, NullOrdering::First)
                .order_by_desc(Column::DateIssueReported),
            LogbookSort::NotPending => {
                query.order_by_with_nulls(Column::DateCompleted, Order::Desc, NullOrdering::Last)
            }
            LogbookSort::CompletedAsc => {
                query.order_by_with_nulls(Column::DateCompleted, Order::Asc, NullOrdering::Last)
            }
            LogbookSort::CompletedDesc => {
                query.order_by_with_nulls(Column::DateCompleted, Order::Desc, NullOrdering::First)
            }
            LogbookSort::ReportedAsc => query.order_by_asc(Column::DateIssueReported),
            LogbookSort::ReportedDesc => query.order_by_desc(Column::DateIssueReported),
            LogbookSort::JobIdDesc => query.order_by_desc(Column::JobId),
            LogbookSort::JobIdAsc => query.order_by_asc(Column::JobId),
        }
    }
}

/// A task with its property and photos grouped by job stage.
#[derive(Debug, Clone)]
pub struct TaskDetail {
    pub task: task::Model,
    pub property: Option<property::Model>,
    pub tenant: Option<tenant::Model>,
    pub pre_inspection: Vec<task_image::Model>,
    pub dominic: Vec<task_image::Model>,
    pub confirmation: Vec<task_image::Model>,
}

impl TaskDetail {
    fn group(
        task: task::Model,
        property: Option<property::Model>,
        tenant: Option<tenant::Model>,
        images: Vec<task_image::Model>,
    ) -> Self {
        let mut detail = TaskDetail {
            task,
            property,
            tenant,
            pre_inspection: Vec::new(),
            dominic: Vec::new(),
            confirmation: Vec::new(),
        };
        for image in images {
            match image.image_type {
                TaskImageType::PreInspection => detail.pre_inspection.push(image),
                TaskImageType::Dominic => detail.dominic.push(image),
                TaskImageType::Confirmation => detail.confirmation.push(image),
            }
        }
        detail
    }
}

pub type TaskRow = (task::Model, Option<property::Model>);

/// Service for maintenance tasks and their photos
#[derive(Clone)]
pub struct TaskService {
    db_pool: Arc<DbPool>,
    storage: Arc<dyn FileStorage>,
    logger: Logger,
}

impl TaskService {
    pub fn new(db_pool: Arc<DbPool>, storage: Arc<dyn FileStorage>, logger: Logger) -> Self {
        Self {
            db_pool,
            storage,
            logger,
        }
    }

    /// All tasks, most recently reported first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<TaskRow>, ServiceError> {
        Ok(task::Entity::find()
            .order_by_desc(task::Column::DateIssueReported)
            .find_also_related(property::Entity)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn logbook(&self, sort: LogbookSort) -> Result<Vec<TaskRow>, ServiceError> {
        Ok(sort
            .apply(task::Entity::find())
            .find_also_related(property::Entity)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<task::Model, ServiceError> {
        task::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Task {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn detail(&self, id: Uuid) -> Result<TaskDetail, ServiceError> {
        let db = &*self.db_pool;
        let task = self.get(id).await?;
        let property = task.find_related(property::Entity).one(db).await?;
        let tenant = match task.tenant_id {
            Some(_) => task.find_related(tenant::Entity).one(db).await?,
            None => None,
        };
        let images = task
            .find_related(task_image::Entity)
            .order_by_asc(task_image::Column::UploadedAt)
            .all(db)
            .await?;

        Ok(TaskDetail::group(task, property, tenant, images))
    }

    async fn check_references(&self, input: &TaskInput) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        if property::Entity::find_by_id(input.property_id)
            .one(db)
            .await?
            .is_none()
        {
            return Err(ServiceError::ValidationError(format!(
                "Property {} does not exist",
                input.property_id
            )));
        }
        if let Some(tenant_id) = input.tenant_id {
            if tenant::Entity::find_by_id(tenant_id).one(db).await?.is_none() {
                return Err(ServiceError::ValidationError(format!(
                    "Tenant {} does not exist",
                    tenant_id
                )));
            }
        }
        Ok(())
    }

    #[instrument(skip(self, input), fields(job_id = %input.job_id))]
    pub async fn create(&self, input: TaskInput) -> Result<task::Model, ServiceError> {
        input.validate()?;
        self.check_references(&input).await?;

        let mut model = task::ActiveModel {
            id: Set(Uuid::new_v4()),
            ..Default::default()
        };
        input.apply(&mut model);

        let created = model
            .insert(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::from_db_write(e, DUPLICATE_JOB_MESSAGE))?;
        counter!("pynnacle_tasks.created", 1);
        info!(task_id = %created.id, "task created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: TaskInput) -> Result<task::Model, ServiceError> {
        input.validate()?;
        let mut model: task::ActiveModel = self.get(id).await?.into();
        self.check_references(&input).await?;
        input.apply(&mut model);

        Ok(model
            .update(&*self.db_pool)
            .await
            .map_err(|e| ServiceError::from_db_write(e, DUPLICATE_JOB_MESSAGE))?)
    }

    /// Deletes a task after removing its stored photos.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<task::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing = self.get(id).await?;
        let images = existing.find_related(task_image::Entity).all(db).await?;

        for image in &images {
            remove_stored_file(self.storage.as_ref(), &self.logger, &image.image).await?;
        }

        task::Entity::delete_by_id(id).exec(db).await?;
        slog::info!(self.logger, "task deleted"; "task_id" => %id, "images" => images.len());
        Ok(existing)
    }

    #[instrument(skip(self, upload), fields(file = %upload.file_name))]
    pub async fn add_image(
        &self,
        task_id: Uuid,
        image_type: TaskImageType,
        upload: UploadedFile,
    ) -> Result<task_image::Model, ServiceError> {
        if !is_image_file_name(&upload.file_name) {
            return Err(ServiceError::ValidationError(format!(
                "'{}' is not an accepted image file",
                upload.file_name
            )));
        }
        let task = self.get(task_id).await?;

        let key = self
            .storage
            .save(UploadArea::TaskImages, today(), &upload.file_name, upload.bytes)
            .await?;

        let image = task_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            task_id: Set(task.id),
            image: Set(key),
            image_type: Set(image_type),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        counter!("pynnacle_task_images.uploaded", 1, "type" => image_type_label(image_type));
        Ok(image)
    }

    /// Deletes a task photo and its file. Returns the owning task id.
    #[instrument(skip(self))]
    pub async fn delete_image(&self, image_id: Uuid) -> Result<Uuid, ServiceError> {
        let db = &*self.db_pool;
        let image = task_image::Entity::find_by_id(image_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Task image {} not found", image_id)))?;

        remove_stored_file(self.storage.as_ref(), &self.logger, &image.image).await?;
        task_image::Entity::delete_by_id(image.id).exec(db).await?;
        Ok(image.task_id)
    }
}

fn image_type_label(image_type: TaskImageType) -> &'static str {
    match image_type {
        TaskImageType::PreInspection => "pre-inspection",
        TaskImageType::Dominic => "dominic",
        TaskImageType::Confirmation => "confirmation",
    }
}
