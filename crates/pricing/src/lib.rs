//! `cartline-pricing`: pure pricing and eligibility decisions for one cart
//! line.
//!
//! Nothing in this crate performs IO. Callers load the catalogue facts a
//! request needs and hand them to [`resolve`], which walks
//! `ProductLoaded -> {Regular | GroupBuy | FlashSale} -> Finalized` and either
//! returns a [`ResolvedLine`] or a typed [`Rejection`].

pub mod facts;
pub mod line;
pub mod promotion;
pub mod rejection;
pub mod request;
pub mod resolve;

pub use facts::{FlashSaleFacts, GroupBuyFacts, LineFacts, PathFacts};
pub use line::{PricingPath, ResolvedLine, UnitPricing};
pub use promotion::{FlashSaleValidator, GroupBuyValidator};
pub use rejection::{Rejection, RejectionKind};
pub use request::{PromotionRef, PurchaseRequest};
pub use resolve::{check_product, price_regular, resolve};
