//! Cross-document synchronization.
//!
//! Two kinds of check:
//! - field-level: an extracted document against the values prefilled from
//!   earlier documents (`CrossDocumentSync::compare_and_validate`)
//! - pair-level: date coherence of invitation vs ticket and hotel vs ticket

mod compare;
mod pairs;
mod types;

pub use compare::{
    find_matching_field, format_discrepancy_message, is_date_field, is_name_field, severity_for,
    CrossDocumentSync,
};
pub use pairs::{validate_hotel_vs_ticket, validate_invitation_vs_ticket};
pub use types::*;
