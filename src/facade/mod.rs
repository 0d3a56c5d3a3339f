pub mod dashboard;

pub use dashboard::{Dashboard, DashboardStats, INVALID_CREDENTIALS_MESSAGE, friendly_message};
