//! Local mirror of the server's list.
//!
//! Server-confirmed records are applied after a successful response. Moves
//! are applied immediately and hand back the id order to push.

use todo_core::Task;

#[derive(Debug, Default)]
pub struct TodoList {
    tasks: Vec<Task>,
}

impl TodoList {
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn replace(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    pub fn push(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Swaps in the server's copy of a task. Returns false if it is not cached.
    pub fn apply(&mut self, task: Task) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, task_id: i64) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == task_id)?;
        Some(self.tasks.remove(index))
    }

    pub fn ids(&self) -> Vec<i64> {
        self.tasks.iter().map(|t| t.id).collect()
    }

    /// Swaps the task at `index` with the one above it. Returns the new index.
    pub fn move_up(&mut self, index: usize) -> Option<usize> {
        if index == 0 || index >= self.tasks.len() {
            return None;
        }
        self.tasks.swap(index, index - 1);
        Some(index - 1)
    }

    /// Swaps the task at `index` with the one below it. Returns the new index.
    pub fn move_down(&mut self, index: usize) -> Option<usize> {
        if index + 1 >= self.tasks.len() {
            return None;
        }
        self.tasks.swap(index, index + 1);
        Some(index + 1)
    }
}

/// In-progress text edit. Nothing is sent until it is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub task_id: i64,
    pub text: String,
}

impl EditDraft {
    pub fn begin(task: &Task) -> Self {
        Self {
            task_id: task.id,
            text: task.text.clone(),
        }
    }

    /// Text to save, or `None` if the draft is blank.
    pub fn submission(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }
}
