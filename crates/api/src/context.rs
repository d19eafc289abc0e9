use cartline_core::{MemberId, TenantId};

/// Tenant context for a request.
///
/// This is immutable and must be present for all domain routes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TenantContext {
    tenant_id: TenantId,
}

impl TenantContext {
    pub fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Shopper behind the request; `None` for guest tokens.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemberContext {
    member_id: Option<MemberId>,
}

impl MemberContext {
    pub fn new(member_id: Option<MemberId>) -> Self {
        Self { member_id }
    }

    pub fn member_id(&self) -> Option<MemberId> {
        self.member_id
    }
}
