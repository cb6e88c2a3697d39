use serde::Serialize;

#[derive(Debug, Serialize, Default)]
pub struct APIResponse {
    pub status: String,
}

impl APIResponse {
    pub fn new_from_msg(msg: &str) -> Self {
        APIResponse {
            status: msg.to_owned(),
        }
    }
}
