use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for branch keys, the prefix of every ticket key
    /// Must start with an uppercase letter followed by uppercase letters or digits
    /// - Valid: "DESK", "HR", "IT2"
    /// - Invalid: "desk", "2IT", "IT-2", ""
    pub static ref BRANCH_KEY_REGEX: Regex = Regex::new(r"^[A-Z][A-Z0-9]*$").unwrap();

    /// Regex for ticket keys: "{BRANCH_KEY}-{number}" with a positive number
    /// - Valid: "DESK-1", "IT2-1045"
    /// - Invalid: "DESK-0", "DESK-01", "DESK", "-12", "desk-1"
    pub static ref TICKET_KEY_REGEX: Regex =
        Regex::new(r"^([A-Z][A-Z0-9]*)-([1-9][0-9]*)$").unwrap();
}
