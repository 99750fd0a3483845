pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use crate::services::{
    action_log::ActionLogService, applications::ApplicationsService, listings::ListingsService,
    messages::MessagesService, notifications::NotificationsService, points::PointsService,
    status_history::StatusHistoryService, swipe::SwipeService, webhook::WebhookService,
};
use crate::store::{MemoryStore, SharedStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub points_service: PointsService,
    pub listings_service: ListingsService,
    pub action_log_service: ActionLogService,
    pub notifications_service: NotificationsService,
    pub messages_service: MessagesService,
    pub applications_service: ApplicationsService,
    pub swipe_service: SwipeService,
}

impl AppState {
    pub fn new(store: SharedStore) -> Self {
        let config = crate::config::get_config();

        let points_service = PointsService::new(store.clone(), config.welcome_grant_points);
        let listings_service = ListingsService::new(
            store.clone(),
            points_service.clone(),
            config.feature_listing_cost,
        );
        let action_log_service = ActionLogService::new(store.clone());
        let notifications_service = NotificationsService::new(store.clone());
        // Status history falls back to an in-memory store when the primary
        // one is down, so a failed write never blocks the status change.
        let status_history_service =
            StatusHistoryService::new(store.clone(), Arc::new(MemoryStore::new()));
        let webhook_service = WebhookService::new(
            config.submit_webhook_url.clone(),
            config.submit_webhook_secret.clone(),
        );
        let messages_service = MessagesService::new(store.clone());
        let applications_service = ApplicationsService::new(
            store.clone(),
            status_history_service,
            notifications_service.clone(),
            webhook_service,
        );
        let swipe_service = SwipeService::new(
            listings_service.clone(),
            action_log_service.clone(),
            points_service.clone(),
            applications_service.clone(),
            notifications_service.clone(),
        );

        Self {
            store,
            points_service,
            listings_service,
            action_log_service,
            notifications_service,
            messages_service,
            applications_service,
            swipe_service,
        }
    }
}
