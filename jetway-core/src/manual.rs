use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// The single help-manual document shown to administrators.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Manual {
    pub content: String,
    pub last_updated: Option<DateTime<Utc>>,
    pub updated_by: Option<Uuid>,
}
