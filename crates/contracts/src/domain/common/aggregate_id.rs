/// String-convertible aggregate identifier.
///
/// Every aggregate ID is stored as its string form in the database, so the
/// round trip through `as_string`/`from_string` must be lossless.
pub trait AggregateId: Sized {
    fn as_string(&self) -> String;

    fn from_string(s: &str) -> Result<Self, String>;
}
