use serde::{Deserialize, Serialize};

pub const CODE_SUCCESS: i32 = 0;
pub const CODE_FAILURE: i32 = -1;

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Result envelope carried by every JSON response: `code` is 0 on success
/// and -1 on failure, `msg` is human readable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub code: i32,
    pub msg: String,
}

impl Envelope {
    pub fn success() -> Self {
        Self { code: CODE_SUCCESS, msg: "success".to_string() }
    }

    pub fn failure(msg: impl Into<String>) -> Self {
        Self { code: CODE_FAILURE, msg: msg.into() }
    }
}

/// Body of a successful `GET /list`.
#[derive(Serialize, Deserialize, Debug)]
pub struct GroupListing {
    pub code: i32,
    pub msg: String,
    pub group: String,
    pub values: serde_json::Map<String, serde_json::Value>,
}

impl GroupListing {
    pub fn success(group: String, values: serde_json::Map<String, serde_json::Value>) -> Self {
        let Envelope { code, msg } = Envelope::success();
        Self { code, msg, group, values }
    }
}
