mod calendar;
mod growth;
mod loans;
mod weather;

pub use calendar::CalendarSystem;
pub use growth::GrowthSystem;
pub use loans::{LoanInterestSystem, DAILY_INTEREST_RATE};
pub use weather::WeatherSystem;
