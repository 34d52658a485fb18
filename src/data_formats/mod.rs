mod request;
mod response;
mod wrapper;

pub use request::*;
pub use response::*;
pub use wrapper::*;

use chrono::NaiveDate;
use serde::Deserialize;

/// `?page=` on every paginated page. Kept as text: bad numbers fall back
/// to the first page instead of rejecting the request.
#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct NextQuery {
    #[serde(default)]
    pub next: Option<String>,
}

/// Search and date filter of the admin post list.
#[derive(Deserialize, Debug, Default)]
pub struct AdminPostQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub pub_date: Option<NaiveDate>,
}
