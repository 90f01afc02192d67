pub(crate) mod helper {
    #[cfg(not(test))]
    pub use super::get_utc_now;
    #[cfg(test)]
    pub use super::mock_chrono::get_utc_now;
    #[cfg(test)]
    pub use super::mock_chrono::set_utc_now;
}


#[cfg(not(test))]
pub fn get_utc_now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}

/// The UTC calendar day. Promotions check both their date window and their
/// weekday list against this one day, so a promotion flips at UTC midnight
/// whatever timezone the terminal runs in.
pub(crate) fn today() -> chrono::NaiveDate {
    helper::get_utc_now().date_naive()
}
