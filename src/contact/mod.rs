//! Lead capture.
//!
//! # Data Flow
//! ```text
//! POST /api/contact {name, email, phone?, message, subject?}
//!     → form.rs (sanitize, validate, build create_item)
//!     → gateway::execute_crm (CRM budget, retries)
//!     → 201 {id, name}
//!
//! GET /api/board/columns
//!     → boards(ids: [board]) { columns }
//!     → 200 {columns} or 404 when the board is missing
//! ```
//!
//! # Design Decisions
//! - The mutation is built server-side; callers only send form fields
//! - Validation failures never reach the upstream

pub mod form;
pub mod handlers;

pub use form::ContactForm;
pub use handlers::{board_columns, create_contact};
