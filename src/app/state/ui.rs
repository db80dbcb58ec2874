/// The single shared popup surface for definitions, summaries, and their
/// loading/failure states.
#[derive(Debug, Clone, Default)]
pub struct PopupState {
    pub(in crate::app) visible: bool,
    pub(in crate::app) loading: bool,
    pub(in crate::app) title: String,
    pub(in crate::app) body: String,
}

impl PopupState {
    /// Open the popup synchronously in a loading state; the matching
    /// `LookupFinished` replaces the body later.
    pub(in crate::app) fn open_loading(&mut self, title: impl Into<String>, placeholder: &str) {
        self.visible = true;
        self.loading = true;
        self.title = title.into();
        self.body = placeholder.to_string();
    }

    pub(in crate::app) fn resolve(&mut self, title: String, body: String) {
        self.loading = false;
        self.title = title;
        self.body = body;
    }

    pub(in crate::app) fn close(&mut self) {
        self.visible = false;
        self.loading = false;
    }
}
