//! The reserved response-code space. Domain codes live above this range and are allocated
//! by individual handlers.
use std::fmt;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ResponseCode(pub u16);

impl ResponseCode {
    pub const SUCCESS: ResponseCode = ResponseCode(0);
    pub const RETRY_LATER: ResponseCode = ResponseCode(1);
    pub const SERVER_ERROR: ResponseCode = ResponseCode(2);
    pub const INVALID_REQUEST_TYPE: ResponseCode = ResponseCode(3);
    pub const INVALID_PARAMETERS: ResponseCode = ResponseCode(4);
    pub const NO_RESPONSE: ResponseCode = ResponseCode(5);

    #[inline]
    pub fn is_success(self) -> bool {
        self == ResponseCode::SUCCESS
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
