pub mod search_task_request;
pub mod search_task_route;
