//! Activity categories.

use serde::Serialize;
use utoipa::ToSchema;

/// Category an activity can be filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

impl From<crate::entity::category::Model> for Category {
    fn from(m: crate::entity::category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
        }
    }
}
