use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityError {
    /// Unparseable date input. Never silently coerced.
    InvalidDate(String),
    /// Proposed rental start is not strictly before its end.
    InvalidRange { start: NaiveDate, end: NaiveDate },
    /// A day inside a proposed range is already booked. Carries the
    /// earliest such day; surfaced verbatim to the user.
    Unavailable(NaiveDate),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for AvailabilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AvailabilityError::InvalidDate(input) => write!(f, "invalid date: {input:?}"),
            AvailabilityError::InvalidRange { start, end } => {
                write!(f, "invalid range: start {start} must be before end {end}")
            }
            AvailabilityError::Unavailable(day) => {
                write!(f, "unavailable on {day}, choose different dates")
            }
            AvailabilityError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for AvailabilityError {}
