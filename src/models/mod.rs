pub mod api;
pub mod artifact;
pub mod job;
pub mod work_order;
