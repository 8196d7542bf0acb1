pub mod types;
pub mod mrz;
pub mod passport;
pub mod ticket;
pub mod hotel;
pub mod vaccination;
pub mod invitation;
pub mod payment;
pub mod verbal_note;
pub mod residence_card;
pub mod generic;
pub mod registry;

pub use types::*;
pub use mrz::*;
pub use passport::PassportExtractor;
pub use ticket::{FlightSegment, TicketExtractor};
pub use hotel::HotelExtractor;
pub use vaccination::VaccinationExtractor;
pub use invitation::InvitationExtractor;
pub use payment::PaymentExtractor;
pub use verbal_note::VerbalNoteExtractor;
pub use residence_card::ResidenceCardExtractor;
pub use generic::GenericExtractor;
pub use registry::ExtractorRegistry;
