//! # cartwise-service: Discount Operations
//!
//! The surface a request-handling layer (HTTP handler, RPC, desktop IPC)
//! calls into. Transport lives outside this crate: handlers deserialize their
//! input into the types below, call [`DiscountService`], and serialize either
//! the result or an [`ApiError`].
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  get_available_discounts(ctx)                                          │
//! │       │                                                                 │
//! │       ├── EligibilityQuery::for_cart(ctx, membership policy, now)      │
//! │       ├── repository.find_eligible(query)                              │
//! │       └── rank(...)                                                     │
//! │                                                                         │
//! │  checkout(ctx, line)                                                   │
//! │       │                                                                 │
//! │       ├── get_available_discounts(ctx)                                 │
//! │       ├── compose_with(reducer, ranked, line)                          │
//! │       └── repository.record_usage(applied ids)  ← all or nothing       │
//! │                                                                         │
//! │  Errors: ServiceError ──► ApiError { code, message }                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use cartwise_service::{init_tracing, DiscountService, ServiceConfig};
//!
//! let config = ServiceConfig::load()?;
//! init_tracing(&config.log_filter);
//! let service = DiscountService::connect(&config).await?;
//! let discounts = service.get_available_discounts(&ctx).await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod service;

pub use config::{ConfigError, ServiceConfig};
pub use error::{ApiError, ErrorCode, ServiceError, ServiceResult};
pub use logging::init_tracing;
pub use service::{CheckoutLine, CheckoutReceipt, DiscountService};
