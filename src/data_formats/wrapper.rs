use serde::{Deserialize, Serialize};

use super::response::AdminGroupResponse;

#[derive(Debug, Deserialize, Serialize)]
pub struct GroupWrapper {
    pub group: AdminGroupResponse,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MultipleResultsWrapper<T> {
    pub results: Vec<T>,
    #[serde(rename = "resultsCount")]
    pub results_count: usize,
}

impl<T> MultipleResultsWrapper<T> {
    pub fn wrap(results: Vec<T>) -> MultipleResultsWrapper<T> {
        MultipleResultsWrapper {
            results_count: results.len(),
            results,
        }
    }
}
