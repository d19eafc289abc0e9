//! Variant (SKU) rows and selector matching.
//!
//! A variant is identified by a set of attribute tokens stored comma-joined
//! (`"red,L"`). A caller's selector matches a row when every selector token is
//! present in the row's token set; the row may carry more tokens than asked
//! for. Rows are scanned in storage order and the first match wins.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cartline_core::{CampaignId, DomainError, DomainResult, ProductId, ValueObject, VariantId};

/// Order-independent set of attribute tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct SkuSelector(BTreeSet<String>);

impl ValueObject for SkuSelector {}

impl SkuSelector {
    /// Parse a comma-joined token list. Blank entries are skipped.
    pub fn parse(joined: &str) -> Self {
        Self(
            joined
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Build from individual tokens. A token may not contain a comma.
    pub fn from_tokens<I, S>(tokens: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for token in tokens {
            let token = token.as_ref().trim();
            if token.contains(',') {
                return Err(DomainError::validation(format!(
                    "sku token must not contain ',': {token:?}"
                )));
            }
            if !token.is_empty() {
                set.insert(token.to_string());
            }
        }
        Ok(Self(set))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when every token of `self` is in `row`.
    pub fn is_satisfied_by(&self, row: &SkuSelector) -> bool {
        self.0.is_subset(&row.0)
    }
}

impl core::fmt::Display for SkuSelector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for token in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(token)?;
            first = false;
        }
        Ok(())
    }
}

impl From<SkuSelector> for String {
    fn from(value: SkuSelector) -> Self {
        value.to_string()
    }
}

impl From<String> for SkuSelector {
    fn from(value: String) -> Self {
        SkuSelector::parse(&value)
    }
}

/// One SKU row. Rows with a `campaign_id` belong to that campaign's own
/// price table and are never used on the regular path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub campaign_id: Option<CampaignId>,
    pub tokens: SkuSelector,
    pub price: Decimal,
    pub stock: u32,
    pub image: Option<String>,
}

impl Variant {
    pub fn matches(&self, selector: &SkuSelector) -> bool {
        selector.is_satisfied_by(&self.tokens)
    }
}

/// First row (in slice order) scoped to `(product_id, campaign_id)` whose
/// tokens are a superset of `selector`.
///
/// An empty selector never matches: no selector means no override.
pub fn match_variant<'a>(
    rows: &'a [Variant],
    product_id: ProductId,
    campaign_id: Option<CampaignId>,
    selector: &SkuSelector,
) -> Option<&'a Variant> {
    if selector.is_empty() {
        return None;
    }
    rows.iter()
        .filter(|v| v.product_id == product_id && v.campaign_id == campaign_id)
        .find(|v| v.matches(selector))
}
