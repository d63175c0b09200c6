use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Advisory completion estimate returned to clients at submission.
pub const ESTIMATED_SECONDS: u32 = 60;

/// Art style used for the generated comic.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, EnumString, Display, AsRefStr, PartialEq, Eq,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ComicStyle {
    #[default]
    Cute,
    Comic,
    Emotional,
}

/// Status of a comic generation task.
///
/// `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, AsRefStr, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Processing)
                | (TaskStatus::Processing, TaskStatus::Completed)
                | (TaskStatus::Processing, TaskStatus::Failed)
        )
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("Invalid task transition from {from} to {to}")]
pub struct TransitionError {
    pub from: TaskStatus,
    pub to: TaskStatus,
}

/// In-flight comic generation task, kept in process memory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComicTask {
    pub id: Uuid,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub estimated_seconds: u32,
    pub error_message: Option<String>,
    /// Pipeline output, kept so completed tasks resolve without the database.
    pub result: Option<ComicRecord>,
}

impl ComicTask {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            estimated_seconds: ESTIMATED_SECONDS,
            error_message: None,
            result: None,
        }
    }

    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.advance(TaskStatus::Processing)
    }

    pub fn complete(&mut self, result: ComicRecord) -> Result<(), TransitionError> {
        self.advance(TaskStatus::Completed)?;
        let at = result.completed_at.unwrap_or_else(Utc::now);
        self.completed_at = Some(at.max(self.created_at));
        self.result = Some(result);
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        self.advance(TaskStatus::Failed)?;
        self.completed_at = Some(Utc::now().max(self.created_at));
        self.error_message = Some(message.into());
        Ok(())
    }

    fn advance(&mut self, next: TaskStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Durable representation of a generated comic, written once the pipeline succeeds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComicRecord {
    pub id: Uuid,
    pub diary_id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub style: ComicStyle,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Request to generate a four-panel comic from a diary entry.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateComicRequest {
    #[garde(length(chars, min = 1, max = 100))]
    pub diary_id: String,

    #[garde(length(chars, min = 1, max = 5000))]
    pub content: String,

    #[garde(length(chars, max = 200))]
    pub title: Option<String>,

    #[garde(length(chars, max = 50))]
    pub mood: Option<String>,

    #[garde(length(chars, max = 50))]
    pub weather: Option<String>,

    #[garde(length(chars, max = 50))]
    pub location: Option<String>,

    #[serde(default)]
    #[garde(skip)]
    pub style: ComicStyle,

    #[garde(length(chars, max = 100))]
    pub user_id: Option<String>,
}

/// Response after submitting a comic for generation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateComicResponse {
    pub comic_id: Uuid,
    pub status: TaskStatus,
    pub estimated_time_seconds: u32,
    pub message: String,
}

/// Status view combining the in-memory task with its durable record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComicStatusView {
    pub id: Uuid,
    pub diary_id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub style: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub estimated_time_seconds: u32,
    pub error_message: Option<String>,
}

impl ComicStatusView {
    /// Merge a task with its durable record. For completed tasks the durable
    /// record wins, then the task's own pipeline result.
    pub fn merge(task: Option<&ComicTask>, record: Option<&ComicRecord>) -> Option<Self> {
        match (task, record) {
            (Some(task), _) if task.status == TaskStatus::Completed => {
                let mut view = match record.or(task.result.as_ref()) {
                    Some(record) => Self::from_record(record),
                    None => Self::from_task(task),
                };
                view.estimated_time_seconds = task.estimated_seconds;
                Some(view)
            }
            (Some(task), _) => Some(Self::from_task(task)),
            (None, Some(record)) => Some(Self::from_record(record)),
            (None, None) => None,
        }
    }

    fn from_task(task: &ComicTask) -> Self {
        Self {
            id: task.id,
            diary_id: String::new(),
            user_id: None,
            title: String::new(),
            description: String::new(),
            image_url: String::new(),
            style: String::new(),
            status: task.status,
            created_at: task.created_at,
            completed_at: task.completed_at,
            estimated_time_seconds: task.estimated_seconds,
            error_message: task.error_message.clone(),
        }
    }

    fn from_record(record: &ComicRecord) -> Self {
        Self {
            id: record.id,
            diary_id: record.diary_id.clone(),
            user_id: record.user_id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            image_url: record.image_url.clone(),
            style: record.style.to_string(),
            status: record.status,
            created_at: record.created_at,
            completed_at: record.completed_at,
            estimated_time_seconds: ESTIMATED_SECONDS,
            error_message: None,
        }
    }
}
