pub mod capture;
pub mod pipeline;
pub mod response;
pub mod shared;
pub mod targeting;
