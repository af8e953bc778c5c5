pub mod pii;

pub mod models {
    pub mod flight;
    pub mod session;
}

pub use models::flight::{FlightDuration, FlightOffer, PollResult, PollStatus, Price};
pub use models::session::{SearchSession, SessionState, SessionToken};
pub use pii::Masked;
