pub mod clients;
pub mod farms;
pub mod movements;
pub mod observations;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod record;
