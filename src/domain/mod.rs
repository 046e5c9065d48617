pub mod item;
pub mod report;

pub use item::{ContentItem, FeedSpec};
pub use report::{
    Digest, GasPrice, GasReport, Headline, HistoricalEvent, HistoryReport, HolidayReport,
    WeatherForecast, WeatherLocation,
};
