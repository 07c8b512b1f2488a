use std::sync::Arc;

use chrono_tz::Tz;
use tokio::sync::Mutex;
use tokio_postgres::Client;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Client>>,
    /// Civil time zone used to render reading timestamps, fixed at startup.
    pub timezone: Tz,
}
