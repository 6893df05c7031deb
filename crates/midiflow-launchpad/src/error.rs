use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{component} brightness {value} out of range (0-3)")]
    ColorOutOfRange { component: &'static str, value: u8 },

    #[error("Grid cell ({x}, {y}) out of range (0-7)")]
    CellOutOfRange { x: u8, y: u8 },

    #[error("Button {0} out of range (0-7)")]
    ButtonOutOfRange(u8),

    #[error("Duty cycle {numerator}/{denominator} out of range (1-16 / 3-18)")]
    InvalidDutyCycle { numerator: u8, denominator: u8 },
}

pub type Result<T> = std::result::Result<T, Error>;
