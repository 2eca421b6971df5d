// Milestone timeline endpoints.

pub mod handlers;
