//! Per-term postings resolution across the body, title and object tiers.

use crate::index::{DocId, ObjectEntry, Snapshot};
use crate::tokenizer::QueryTerm;
use std::collections::{BTreeMap, BTreeSet};

/// Where a single query term occurs in one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution<'a> {
    /// doc -> posting weight
    pub body: BTreeMap<DocId, f32>,
    pub title: BTreeSet<DocId>,
    pub objects: BTreeMap<DocId, Vec<&'a ObjectEntry>>,
    /// True when the term had no exact entry and was expanded as a prefix.
    pub prefix: bool,
}

impl<'a> Resolution<'a> {
    pub fn is_empty(&self) -> bool {
        self.body.is_empty() && self.title.is_empty() && self.objects.is_empty()
    }

    pub fn contains(&self, doc: DocId) -> bool {
        self.body.contains_key(&doc) || self.title.contains(&doc) || self.objects.contains_key(&doc)
    }

    /// Every document matched in any tier.
    pub fn docs(&self) -> BTreeSet<DocId> {
        self.body
            .keys()
            .chain(self.title.iter())
            .chain(self.objects.keys())
            .copied()
            .collect()
    }

    fn add_object(&mut self, obj: &'a ObjectEntry) {
        self.objects.entry(obj.doc_id).or_default().push(obj);
    }
}

pub struct Resolver<'a> {
    snapshot: &'a Snapshot,
    prefix_min_len: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(snapshot: &'a Snapshot, prefix_min_len: usize) -> Self {
        Self { snapshot, prefix_min_len }
    }

    /// Exact lookup in every tier, falling back to prefix expansion only when
    /// no tier has an exact entry for the term.
    pub fn resolve(&self, term: &QueryTerm) -> Resolution<'a> {
        let exact = self.resolve_exact(term);
        if !exact.is_empty() || term.term.chars().count() < self.prefix_min_len {
            return exact;
        }
        self.resolve_prefix(term)
    }

    pub fn resolve_exact(&self, term: &QueryTerm) -> Resolution<'a> {
        let snapshot = self.snapshot;
        let mut res = Resolution {
            body: snapshot.lookup_term(&term.term).iter().map(|p| (p.doc_id, p.weight)).collect(),
            title: snapshot.lookup_title_term(&term.term).iter().copied().collect(),
            ..Default::default()
        };
        for obj in snapshot.lookup_objects(&term.raw) {
            res.add_object(obj);
        }
        res
    }

    fn resolve_prefix(&self, term: &QueryTerm) -> Resolution<'a> {
        let snapshot = self.snapshot;
        let mut res = Resolution { prefix: true, ..Default::default() };
        for (_, postings) in snapshot.terms_with_prefix(&term.term) {
            for p in postings {
                let w = res.body.entry(p.doc_id).or_insert(p.weight);
                *w = w.max(p.weight);
            }
        }
        for (_, docs) in snapshot.title_terms_with_prefix(&term.term) {
            res.title.extend(docs.iter().copied());
        }
        for obj in snapshot.objects_with_prefix(&term.raw) {
            res.add_object(obj);
        }
        res
    }
}
