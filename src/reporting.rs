//! Types for standardized reports to the user about command operations.
//!
//! Commands return their value alongside a [`Report`] of advisory notes,
//! e.g. how many regions a size filter removed, so potentially fragile
//! operations surface what they did without failing.

/// The [`CommandOutput<U>`] type is generic over some data output from a
/// command, and a [`Report`] of information for the user.
pub struct CommandOutput<U> {
    pub value: U,
    pub report: Report,
}

impl<U> CommandOutput<U> {
    pub fn new(value: U, report: Report) -> Self {
        Self { value, report }
    }
}

/// A type to (semi) standardize reporting to the user.
#[derive(Default)]
pub struct Report {
    entries: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, message: String) {
        self.entries.push(message)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
