use std::fmt;

/// A credential holder (bot token, gateway client secret) whose `Display` and `Debug` output is
/// always the mask `****`, so a config struct can be logged or dumped without leaking it. The raw
/// value is only reachable through an explicit [`Secret::reveal`] call.
#[derive(Clone, Default)]
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn reveal(&self) -> &T {
        &self.inner
    }
}

impl<T> From<T> for Secret<T> {
    fn from(inner: T) -> Self {
        Self::new(inner)
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn formatting_never_leaks_the_value() {
        let token = Secret::new("7212345678:AAexample-token".to_string());
        assert_eq!(format!("{token}"), "****");
        assert_eq!(format!("{token:?}"), "****");
        assert_eq!(format!("{:?}", Some(&token)), "Some(****)");
        assert_eq!(token.reveal(), "7212345678:AAexample-token");
    }
}
