pub mod api_responses;
pub mod envelope;
pub mod forecast;
pub mod observation;
pub mod station;

pub use envelope::*;
pub use forecast::*;
pub use observation::*;
pub use station::*;
