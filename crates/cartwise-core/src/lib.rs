//! # cartwise-core: Pure Discount Logic for Cartwise
//!
//! This crate decides which promotional discounts apply to a cart, in what
//! order they are evaluated, and how they combine into a final price. Every
//! function here is pure: the current instant is passed in, never read.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cartwise Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Request-handling layer (any transport)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             cartwise-service (DiscountService)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ cartwise-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐ ┌─────────────┐ ┌──────────┐ ┌─────────────┐  │   │
//! │  │   │   types   │ │ eligibility │ │ ranking  │ │ composition │  │   │
//! │  │   │ Discount  │ │ Predicate   │ │  rank    │ │  Reducer    │  │   │
//! │  │   │ Condition │ │ Query       │ │ compare  │ │  compose    │  │   │
//! │  │   └───────────┘ └─────────────┘ └──────────┘ └─────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            cartwise-db (Repository implementations)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Discount, Condition, CartContext, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Discount validation rules
//! - [`eligibility`] - Composable eligibility predicates
//! - [`ranking`] - Priority / stackability ordering
//! - [`composition`] - Cumulative discount application
//!
//! ## Example Usage
//!
//! ```rust
//! use cartwise_core::money::Money;
//!
//! let subtotal = Money::from_cents(20000); // $200.00
//! let discounted = subtotal.apply_percentage_discount(1000); // 10% off
//! assert_eq!(discounted.cents(), 18000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod composition;
pub mod eligibility;
pub mod error;
pub mod money;
pub mod ranking;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use composition::{
    apply, compose, compose_with, CompoundingReducer, Composition, CompositionStep,
    DiscountReducer, LineItems, LiteralReducer,
};
pub use eligibility::{find_eligible, EligibilityQuery, MembershipPolicy, Predicate};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use ranking::rank;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Highest precedence priority (applied first).
pub const PRIORITY_HIGH: i32 = 1;

/// Medium precedence priority.
pub const PRIORITY_MEDIUM: i32 = 2;

/// Lowest of the named priorities.
pub const PRIORITY_LOW: i32 = 3;

/// Maximum length of a discount display name.
pub const MAX_DISCOUNT_NAME_LEN: usize = 255;
