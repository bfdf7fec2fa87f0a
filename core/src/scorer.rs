//! AND-combination of per-term postings into a ranked document list.

use crate::config::Weights;
use crate::index::{DocId, ObjectEntry, Snapshot};
use crate::resolver::Resolver;
use crate::tokenizer::QueryTerm;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// A ranked document together with the objects that contributed to its score.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit<'a> {
    pub doc_id: DocId,
    pub score: f32,
    pub objects: Vec<&'a ObjectEntry>,
}

#[derive(Debug, Clone)]
pub struct Ranker {
    weights: Weights,
    prefix_min_len: usize,
}

impl Ranker {
    pub fn new(weights: Weights, prefix_min_len: usize) -> Self {
        Self { weights, prefix_min_len }
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Rank documents matching every term, best first.
    pub fn rank(&self, terms: &[QueryTerm], snapshot: &Snapshot) -> Vec<(DocId, f32)> {
        self.rank_until(terms, &[], snapshot, || false)
            .unwrap_or_default()
            .into_iter()
            .map(|h| (h.doc_id, h.score))
            .collect()
    }

    /// Like [`Ranker::rank`], dropping documents that contain any `excluded`
    /// term. `should_stop` is polled before each term is resolved; `None`
    /// means the query was abandoned.
    pub fn rank_until<'a>(
        &self,
        terms: &[QueryTerm],
        excluded: &[QueryTerm],
        snapshot: &'a Snapshot,
        mut should_stop: impl FnMut() -> bool,
    ) -> Option<Vec<Hit<'a>>> {
        let resolver = Resolver::new(snapshot, self.prefix_min_len);
        let mut candidates: Option<BTreeMap<DocId, Hit<'a>>> = None;

        for term in terms {
            if should_stop() {
                return None;
            }
            let res = resolver.resolve(term);
            if res.is_empty() {
                debug!(term = %term.term, "term matched no documents");
                return Some(Vec::new());
            }

            let mut matched: BTreeMap<DocId, Hit<'a>> = BTreeMap::new();
            for doc_id in res.docs() {
                let objects = res.objects.get(&doc_id).cloned().unwrap_or_default();
                let mut score = 0.0;
                if !objects.is_empty() {
                    score += self.weights.object;
                }
                if res.title.contains(&doc_id) {
                    score += self.weights.title;
                }
                if let Some(w) = res.body.get(&doc_id) {
                    score += self.weights.body * w;
                }
                matched.insert(doc_id, Hit { doc_id, score, objects });
            }

            let next = match candidates.take() {
                None => matched,
                Some(mut acc) => {
                    acc.retain(|doc_id, _| matched.contains_key(doc_id));
                    for (doc_id, hit) in acc.iter_mut() {
                        if let Some(m) = matched.remove(doc_id) {
                            hit.score += m.score;
                            for obj in m.objects {
                                if !hit.objects.iter().any(|o| std::ptr::eq(*o, obj)) {
                                    hit.objects.push(obj);
                                }
                            }
                        }
                    }
                    acc
                }
            };
            if next.is_empty() {
                return Some(Vec::new());
            }
            candidates = Some(next);
        }

        let Some(mut acc) = candidates else {
            return Some(Vec::new());
        };

        for term in excluded {
            if should_stop() {
                return None;
            }
            for doc_id in resolver.resolve_exact(term).docs() {
                acc.remove(&doc_id);
            }
        }

        let mut hits: Vec<Hit<'a>> = acc.into_values().collect();
        for hit in hits.iter_mut() {
            // Sphinx priorities: 0 important, 1 default, 2 unimportant
            hit.objects.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        }
        hits.sort_by(|a, b| compare(snapshot, a, b));
        Some(hits)
    }
}

/// Score descending, then title ascending, then id ascending.
fn compare(snapshot: &Snapshot, a: &Hit<'_>, b: &Hit<'_>) -> Ordering {
    let title = |id| snapshot.document(id).map(|d| d.title.as_str());
    b.score
        .total_cmp(&a.score)
        .then_with(|| title(a.doc_id).cmp(&title(b.doc_id)))
        .then(a.doc_id.cmp(&b.doc_id))
}
