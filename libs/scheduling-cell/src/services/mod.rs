pub mod availability;
pub mod calendar;
pub mod gateway;
pub mod lifecycle;
pub mod notify;
pub mod pricing;
