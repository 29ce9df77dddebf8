use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

use crate::error::AppError;

/// Shared handle to the process-wide todo list.
pub type SharedTodos = Arc<TodoStore>;

// ---------------------------------------------------------------------------
// Todo model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deleted {
    pub success: bool,
}

// ---------------------------------------------------------------------------
// In-memory store, lost on restart
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct TodoStore {
    todos: Mutex<Vec<Todo>>,
}

impl TodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all todos in insertion order.
    pub fn list(&self) -> Vec<Todo> {
        self.lock().clone()
    }

    pub fn create(&self, text: &str) -> Result<Todo, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::Validation("Todo text is required".into()));
        }
        let todo = Todo {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.to_string(),
            completed: false,
        };
        self.lock().push(todo.clone());
        info!(todo_id = %todo.id, "todo created");
        Ok(todo)
    }

    /// Flip `completed` in place and return the updated todo.
    pub fn toggle(&self, id: &str) -> Result<Todo, AppError> {
        let mut todos = self.lock();
        let todo = todos
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(AppError::NotFound("Todo"))?;
        todo.completed = !todo.completed;
        Ok(todo.clone())
    }

    pub fn delete(&self, id: &str) -> Result<Deleted, AppError> {
        let mut todos = self.lock();
        let index = todos
            .iter()
            .position(|t| t.id == id)
            .ok_or(AppError::NotFound("Todo"))?;
        todos.remove(index);
        info!(todo_id = %id, "todo deleted");
        Ok(Deleted { success: true })
    }

    // Mutations are single push/flip/remove steps; a poisoned list is still consistent.
    fn lock(&self) -> MutexGuard<'_, Vec<Todo>> {
        self.todos.lock().unwrap_or_else(|e| e.into_inner())
    }
}
