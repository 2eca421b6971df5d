pub mod health;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::issues::handlers as issue_handlers;
use crate::mentions::handlers as mention_handlers;
use crate::progress::handlers as progress_handlers;
use crate::projects::handlers as project_handlers;
use crate::state::AppState;
use crate::team::handlers as team_handlers;
use crate::timeline::handlers as timeline_handlers;
use crate::webhook::handlers as webhook_handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Provider webhook
        .route(
            "/webhooks/messages",
            get(webhook_handlers::handle_webhook_liveness)
                .post(webhook_handlers::handle_inbound_message),
        )
        .route(
            "/api/v1/messages/:id/reprocess",
            post(webhook_handlers::handle_reprocess),
        )
        // Team directory
        .route(
            "/api/v1/team",
            get(team_handlers::handle_list_team).post(team_handlers::handle_create_team_member),
        )
        .route("/api/v1/team/search", get(team_handlers::handle_search_team))
        .route(
            "/api/v1/team/:id",
            get(team_handlers::handle_get_team_member)
                .patch(team_handlers::handle_update_team_member)
                .delete(team_handlers::handle_delete_team_member),
        )
        // Issues and mentions
        .route("/api/v1/issues", post(issue_handlers::handle_create_issue))
        .route("/api/v1/issues/:id", get(issue_handlers::handle_get_issue))
        .route(
            "/api/v1/issues/:id/status",
            patch(issue_handlers::handle_update_issue_status),
        )
        .route(
            "/api/v1/issues/:id/mentions",
            get(mention_handlers::handle_list_mentions)
                .post(mention_handlers::handle_create_mentions),
        )
        .route(
            "/api/v1/issues/:id/mentions/:member_id",
            delete(mention_handlers::handle_delete_mention_pair),
        )
        .route(
            "/api/v1/mentions/:id",
            delete(mention_handlers::handle_delete_mention),
        )
        // Projects, timeline, progress
        .route(
            "/api/v1/projects",
            post(project_handlers::handle_create_project),
        )
        .route(
            "/api/v1/projects/:id",
            get(project_handlers::handle_get_project),
        )
        .route(
            "/api/v1/projects/:id/phase",
            put(project_handlers::handle_set_project_phase),
        )
        .route(
            "/api/v1/projects/:id/phone",
            post(project_handlers::handle_link_phone),
        )
        .route(
            "/api/v1/projects/:id/issues",
            get(issue_handlers::handle_list_project_issues),
        )
        .route(
            "/api/v1/projects/:id/timeline",
            get(timeline_handlers::handle_list_timeline)
                .post(timeline_handlers::handle_create_timeline_event),
        )
        .route(
            "/api/v1/projects/:id/progress",
            get(progress_handlers::handle_project_progress),
        )
        .route(
            "/api/v1/properties/:id/progress",
            get(progress_handlers::handle_property_progress),
        )
        .with_state(state)
}
