//! Declarative validation constraints. Constraints are checked in declaration order; the
//! first non-success code aborts and is returned.
use crate::response::ResponseCode;

pub trait Constraint<T: ?Sized> {
    fn check(&self, value: &T) -> Result<(), ResponseCode>;
}

/// Passes when `value >= min`.
pub struct AtLeast {
    pub min: i64,
    pub code: ResponseCode,
}

impl Constraint<i32> for AtLeast {
    fn check(&self, value: &i32) -> Result<(), ResponseCode> {
        if i64::from(*value) >= self.min {
            Ok(())
        } else {
            Err(self.code)
        }
    }
}

impl Constraint<i64> for AtLeast {
    fn check(&self, value: &i64) -> Result<(), ResponseCode> {
        if *value >= self.min {
            Ok(())
        } else {
            Err(self.code)
        }
    }
}

/// Passes when `min <= value.len() <= max` (byte length).
pub struct StringLenRange {
    pub min: usize,
    pub max: usize,
    pub code: ResponseCode,
}

impl Constraint<String> for StringLenRange {
    fn check(&self, value: &String) -> Result<(), ResponseCode> {
        let len = value.len();
        if len >= self.min && len <= self.max {
            Ok(())
        } else {
            Err(self.code)
        }
    }
}

/// Passes when the string is non-empty.
pub struct NonEmptyString {
    pub code: ResponseCode,
}

impl Constraint<String> for NonEmptyString {
    fn check(&self, value: &String) -> Result<(), ResponseCode> {
        if value.is_empty() {
            Err(self.code)
        } else {
            Ok(())
        }
    }
}

impl Default for AtLeast {
    fn default() -> AtLeast {
        AtLeast {
            min: 0,
            code: ResponseCode::INVALID_PARAMETERS,
        }
    }
}

/// Runs each `(field, constraint)` pair in declaration order, short-circuiting on the first
/// failure and returning its code; returns `ResponseCode::SUCCESS` if every constraint passes.
#[macro_export]
macro_rules! validate_fields {
    ($($value:expr => $constraint:expr),+ $(,)?) => {{
        let mut __outcome = $crate::response::ResponseCode::SUCCESS;
        $(
            if __outcome == $crate::response::ResponseCode::SUCCESS {
                if let Err(code) = $crate::validation::Constraint::check(&$constraint, &$value) {
                    __outcome = code;
                }
            }
        )+
        __outcome
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_failure_aborts_and_is_returned() {
        let skip = -1i32;
        let name = String::new();

        let code = validate_fields! {
            skip => AtLeast { min: 0, code: ResponseCode(10) },
            name => NonEmptyString { code: ResponseCode(11) },
        };

        assert_eq!(code, ResponseCode(10));
    }

    #[test]
    fn all_constraints_passing_yields_success() {
        let skip = 0i32;
        let name = "ok".to_owned();

        let code = validate_fields! {
            skip => AtLeast { min: 0, code: ResponseCode(10) },
            name => NonEmptyString { code: ResponseCode(11) },
        };

        assert_eq!(code, ResponseCode::SUCCESS);
    }
}
