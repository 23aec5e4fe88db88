//! Authentication: bearer-token issuing/validation and the gate that
//! enforces it in front of every handler.

pub mod clock;
pub mod gate;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use gate::AuthGate;
pub use token::{Identity, TokenAuthority};
