//! registry.rs: in-memory record of listings that already produced a notification.
//!
//! Identifiers are only ever added. Nothing survives a restart.

use std::collections::HashSet;

use crate::ingest::types::Listing;

#[derive(Debug, Default)]
pub struct SeenRegistry {
    known: HashSet<String>,
    records: Vec<Listing>,
}

impl SeenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a batch into newly admitted listings (input order preserved).
    ///
    /// Listings without an identifier are never admitted; known ones are skipped.
    pub fn admit(&mut self, listings: Vec<Listing>) -> Vec<Listing> {
        let mut admitted = Vec::new();
        for listing in listings {
            let Some(uid) = listing.uid() else {
                tracing::warn!(title = listing.title_or_default(), "listing has no identifier");
                continue;
            };
            if self.known.contains(uid) {
                tracing::debug!(uid, title = listing.title_or_default(), "already seen");
                continue;
            }
            self.known.insert(uid.to_string());
            self.records.push(listing.clone());
            admitted.push(listing);
        }
        admitted
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.known.contains(uid)
    }

    pub fn size(&self) -> usize {
        self.known.len()
    }

    /// Every listing ever admitted, oldest first.
    pub fn records(&self) -> &[Listing] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_id(id: &str) -> Listing {
        Listing {
            notice_id: Some(id.into()),
            ..Default::default()
        }
    }

    #[test]
    fn second_admission_of_same_id_is_ignored() {
        let mut reg = SeenRegistry::new();
        assert_eq!(reg.admit(vec![with_id("N1")]).len(), 1);
        assert_eq!(reg.admit(vec![with_id("N1")]).len(), 0);
        assert_eq!(reg.size(), 1);
        assert!(reg.contains("N1"));
    }

    #[test]
    fn duplicates_inside_one_batch_admit_once() {
        let mut reg = SeenRegistry::new();
        let out = reg.admit(vec![with_id("A"), with_id("A"), with_id("B")]);
        let ids: Vec<_> = out.iter().filter_map(|l| l.uid()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(reg.records().len(), 2);
    }

    #[test]
    fn solicitation_number_is_used_when_notice_id_missing() {
        let mut reg = SeenRegistry::new();
        let l = Listing {
            solicitation_number: Some("SOL-7".into()),
            ..Default::default()
        };
        assert_eq!(reg.admit(vec![l]).len(), 1);
        assert!(reg.contains("SOL-7"));
    }
}
