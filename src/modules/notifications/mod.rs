pub mod services;

pub use services::{
    HttpNotificationDispatcher, NotificationChannel, NotificationDispatcher, NotificationKind,
};
