// Quality issue management endpoints.

pub mod handlers;
