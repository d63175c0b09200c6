use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::comic::ComicTask;

/// Mutation applied to a stored task by [`TaskStore::update`].
pub type TaskMutation = Box<dyn FnOnce(&mut ComicTask) + Send>;

/// Storage for in-flight comic tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn put(&self, task: ComicTask);

    async fn get(&self, id: Uuid) -> Option<ComicTask>;

    /// Apply `mutation` if the task exists; returns the updated snapshot.
    async fn update(&self, id: Uuid, mutation: TaskMutation) -> Option<ComicTask>;
}

/// Process-local task table. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, ComicTask>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn put(&self, task: ComicTask) {
        self.tasks.write().await.insert(task.id, task);
    }

    async fn get(&self, id: Uuid) -> Option<ComicTask> {
        self.tasks.read().await.get(&id).cloned()
    }

    async fn update(&self, id: Uuid, mutation: TaskMutation) -> Option<ComicTask> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id)?;
        mutation(task);
        Some(task.clone())
    }
}
