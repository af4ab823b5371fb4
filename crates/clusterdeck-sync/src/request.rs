/// Lifecycle of one logical request kind.
///
/// Starting a new request clears any previous error, so stale failure
/// text never lingers over a retry in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestStatus {
    pub loading: bool,
    pub loaded: bool,
    pub error: Option<String>,
}

impl RequestStatus {
    pub fn start(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn succeed(&mut self) {
        self.loading = false;
        self.loaded = true;
        self.error = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
