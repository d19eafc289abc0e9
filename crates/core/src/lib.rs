//! `cartline-core`: shared building blocks for the pricing workspace.
//!
//! This crate contains **pure** primitives (no IO): identifiers, the domain
//! error model, optimistic-concurrency expectations, time and money helpers.

pub mod clock;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;
pub mod version;

pub use clock::{Clock, FixedClock, SystemClock, UnixSeconds};
pub use error::{DomainError, DomainResult};
pub use id::{CampaignId, CategoryId, IntentId, MemberId, ProductId, SeatId, TenantId, VariantId};
pub use value_object::ValueObject;
pub use version::ExpectedVersion;
