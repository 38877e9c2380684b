use std::str::{FromStr, Utf8Error};

use percent_encoding::percent_decode_str;

/// A user id taken from one URL path segment. warp hands segments over
/// still percent-encoded; this decodes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdSegment(String);

impl UserIdSegment {
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FromStr for UserIdSegment {
    type Err = Utf8Error;

    fn from_str(segment: &str) -> Result<Self, Self::Err> {
        let user_id = percent_decode_str(segment).decode_utf8()?;
        Ok(UserIdSegment(user_id.into_owned()))
    }
}
