pub mod dispatcher;

pub use dispatcher::{
    HttpNotificationDispatcher, NotificationChannel, NotificationDispatcher, NotificationKind,
};
