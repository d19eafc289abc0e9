use serde::{Deserialize, Serialize};

use cartline_catalog::SkuSelector;
use cartline_core::{CampaignId, IntentId, ProductId, UnixSeconds};
use cartline_infra::intent_store::{IntentStatus, PurchaseIntentRecord};
use cartline_pricing::{PromotionRef, Rejection, ResolvedLine};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseIntentRequest {
    pub product_id: String,
    pub quantity: i64,
    /// Comma-joined SKU tokens.
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub group_buy_id: Option<String>,
    #[serde(default)]
    pub flash_sale_id: Option<String>,
}

/// Request fields after parsing, before tenant/member are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPurchase {
    pub product_id: ProductId,
    pub quantity: u32,
    pub selector: SkuSelector,
    pub promotion: PromotionRef,
}

impl CreatePurchaseIntentRequest {
    pub fn parse(&self) -> Result<ParsedPurchase, Rejection> {
        let product_id = self
            .product_id
            .parse::<ProductId>()
            .map_err(|_| Rejection::invalid_request("product_id is not a valid id"))?;
        let quantity = u32::try_from(self.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| Rejection::invalid_request("quantity must be at least 1"))?;
        let group_buy = parse_campaign(self.group_buy_id.as_deref(), "group_buy_id")?;
        let flash_sale = parse_campaign(self.flash_sale_id.as_deref(), "flash_sale_id")?;
        Ok(ParsedPurchase {
            product_id,
            quantity,
            selector: SkuSelector::parse(self.sku.as_deref().unwrap_or_default()),
            promotion: PromotionRef::from_ids(group_buy, flash_sale)?,
        })
    }
}

/// Empty strings count as absent.
fn parse_campaign(raw: Option<&str>, field: &str) -> Result<Option<CampaignId>, Rejection> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<CampaignId>()
            .map(Some)
            .map_err(|_| Rejection::invalid_request(format!("{field} is not a valid id"))),
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct PurchaseIntentCreated {
    pub intent_id: IntentId,
    pub line: ResolvedLine,
}

#[derive(Debug, Serialize)]
pub struct PurchaseIntentView {
    pub id: IntentId,
    pub status: IntentStatus,
    pub client_ip: String,
    pub created_at: UnixSeconds,
    pub expires_at: UnixSeconds,
    pub line: ResolvedLine,
}

impl PurchaseIntentView {
    pub fn new(record: PurchaseIntentRecord, line: ResolvedLine) -> Self {
        Self {
            id: record.id,
            status: record.status,
            client_ip: record.client_ip,
            created_at: record.created_at,
            expires_at: record.expires_at,
            line,
        }
    }
}
