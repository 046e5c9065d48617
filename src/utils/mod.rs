pub mod dates;
pub mod text;
pub mod url;

pub use dates::{is_within_window, parse_flexible_date};
pub use text::{strip_html, truncate_text};
pub use url::{canonicalize_url, clean_image_url};
