pub mod action;
pub mod application;
pub mod listing;
pub mod message;
pub mod notification;
pub mod points;
