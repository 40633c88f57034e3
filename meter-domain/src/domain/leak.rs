use time::Date;

/// A calendar day whose nightly over-threshold run met the configured
/// minimum length.
///
/// `run_length` is the longest count of consecutive 30-minute intervals in
/// that night's window whose consumption exceeded the flow threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeakDay {
    pub date: Date,
    pub run_length: u32,
}
