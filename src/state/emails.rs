use std::collections::BTreeSet;

/// Accumulated email addresses for one crawl attempt
///
/// Addresses are lower-cased on insertion, so `Info@X.com` and `info@x.com`
/// are the same entry. Iteration is always in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailSet {
    emails: BTreeSet<String>,
}

impl EmailSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts one address, returning true if it was not present yet
    pub fn insert(&mut self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return false;
        }
        self.emails.insert(email)
    }

    /// Inserts every address from `emails`, returning how many were new
    pub fn extend<I, S>(&mut self, emails: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        emails
            .into_iter()
            .filter(|email| self.insert(email.as_ref()))
            .count()
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&email.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.emails.iter().map(String::as_str)
    }

    /// Returns the addresses as a sorted list
    pub fn to_sorted_vec(&self) -> Vec<String> {
        self.emails.iter().cloned().collect()
    }

    pub fn into_sorted_vec(self) -> Vec<String> {
        self.emails.into_iter().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for EmailSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = EmailSet::new();
        set.extend(iter);
        set
    }
}
