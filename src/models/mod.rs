pub mod event;
pub mod guest;
pub mod rsvp;
pub mod table;

pub use event::Event;
pub use guest::{Guest, Honorific, InvitationMethod, ManualOverride, NewGuest};
pub use rsvp::{Rsvp, RsvpSubmission};
pub use table::{NewTable, Table, TableAssignment};
