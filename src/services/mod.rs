pub mod action_log;
pub mod applications;
pub mod filter;
pub mod listings;
pub mod messages;
pub mod notifications;
pub mod points;
pub mod status_history;
pub mod swipe;
pub mod webhook;
