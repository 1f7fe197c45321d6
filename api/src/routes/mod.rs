pub mod health;
pub mod index_tasks;
pub mod search_task;
