use thiserror::Error;

pub type LiiResult<T> = Result<T, LiiError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LiiError {
    /// A physical quantity outside its admissible range (NaN, infinite, not positive).
    #[error("Non-physical {what}: {value}")]
    NonPhysical { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
