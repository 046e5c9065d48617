pub mod gas;
pub mod history;
pub mod holidays;
pub mod national;
pub mod weather;

pub use gas::GasProvider;
pub use history::{DEFAULT_MAX_EVENTS, HistoryProvider};
pub use holidays::HolidayProvider;
pub use national::{DEFAULT_MAX_HEADLINES, NationalNewsProvider};
pub use weather::WeatherProvider;
