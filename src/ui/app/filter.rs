use super::App;

impl App {
    /// Start typing a sidebar search.
    pub fn start_search(&mut self) {
        self.sidebar.search_mode = true;
    }

    /// Append a printable ASCII character to the query.
    pub fn push_search_char(&mut self, c: char) {
        if !(' '..='~').contains(&c) {
            return;
        }
        self.sidebar.query.push(c);
        self.query_changed();
    }

    /// Drop the last character of the query.
    pub fn pop_search_char(&mut self) {
        if self.sidebar.query.pop().is_some() {
            self.query_changed();
        }
    }

    /// Leave search mode, keeping the query.
    pub fn accept_search(&mut self) {
        self.sidebar.search_mode = false;
    }

    /// Leave search mode and clear the query.
    pub fn cancel_search(&mut self) {
        self.sidebar.search_mode = false;
        if !self.sidebar.query.is_empty() {
            self.clear_query();
            self.refresh_rows();
        }
    }

    pub(super) fn clear_query(&mut self) {
        self.sidebar.search_mode = false;
        if !self.sidebar.query.is_empty() {
            self.sidebar.query.clear();
            self.reset_selection();
        }
    }

    fn query_changed(&mut self) {
        self.reset_selection();
        self.refresh_rows();
    }

    fn reset_selection(&mut self) {
        self.sidebar.selected_idx = 0;
        self.sidebar.scroll = 0;
        self.viewer.scroll = 0;
    }
}
