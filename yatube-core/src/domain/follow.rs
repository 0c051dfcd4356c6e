use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directed edge: `user_id` sees `author_id`'s posts in their timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Follow {
    pub user_id: Uuid,
    pub author_id: Uuid,
}
