use crate::domain::SubscriberEmail;

/// Confirmed subscribers in insertion order, persisted one address per line.
///
/// The file may have been edited by hand, so entries are kept as raw strings: blank lines and
/// duplicates are dropped on load, invalid addresses are kept but never counted nor delivered to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriberList(Vec<String>);

impl SubscriberList {
    pub fn parse(contents: &str) -> Self {
        let mut entries: Vec<String> = Vec::new();
        for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !entries.iter().any(|e| e == line) {
                entries.push(line.to_owned());
            }
        }
        Self(entries)
    }

    pub fn to_file_contents(&self) -> String {
        self.0.iter().map(|e| format!("{e}\n")).collect()
    }

    pub fn contains(&self, email: &SubscriberEmail) -> bool {
        self.0.iter().any(|e| e == email.as_ref())
    }

    /// Returns `false` if the address was already present.
    pub fn insert(&mut self, email: &SubscriberEmail) -> bool {
        if self.contains(email) {
            return false;
        }
        self.0.push(email.as_ref().to_owned());
        true
    }

    /// Returns `false` if the address was not present.
    pub fn remove(&mut self, email: &SubscriberEmail) -> bool {
        let before = self.0.len();
        self.0.retain(|e| e != email.as_ref());
        before != self.0.len()
    }

    /// Number of entries that are valid email addresses.
    pub fn valid_count(&self) -> usize {
        self.0
            .iter()
            .filter(|e| SubscriberEmail::parse(e.to_string()).is_ok())
            .count()
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}
