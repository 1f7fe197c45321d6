pub mod index_tasks_request;
pub mod index_tasks_route;
