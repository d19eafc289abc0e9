use serde::{Deserialize, Serialize};

use cartline_core::{CategoryId, TenantId};

/// Product category (only the fields a priced line carries).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub tenant_id: TenantId,
    pub title: String,
}
