//! Immutable in-memory index snapshot.
//!
//! A [`Snapshot`] is built once from a [`RawIndex`], validated, and then only
//! ever read. All tables are ordered maps so prefix expansion is a range scan
//! over sorted keys.

use crate::error::{Error, Result};
use crate::raw::{RawIndex, RawObjects, RawPostings};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

pub type DocId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    /// Logical path of the page, e.g. `Analysis/Data sources`.
    pub name: String,
    pub title: String,
    /// Source file the page was rendered from, when the builder recorded it.
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f32,
}

/// An API symbol registered by the documentation builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Fully qualified name, e.g. `ahle.simulation.run`.
    pub name: String,
    pub doc_id: DocId,
    /// Human readable category, e.g. `Python function`.
    pub category: String,
    pub priority: i32,
    pub anchor: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    documents: Vec<Document>,
    terms: BTreeMap<String, Vec<Posting>>,
    title_terms: BTreeMap<String, Vec<DocId>>,
    objects: Vec<ObjectEntry>,
    /// lowercase name segment -> indices into `objects`
    object_terms: BTreeMap<String, Vec<u32>>,
}

impl Snapshot {
    /// Build a validated snapshot from its raw form.
    ///
    /// Keys are lowercased and merged, postings are sorted and deduplicated,
    /// and empty posting lists are dropped. Fails if a required table is
    /// missing, table lengths disagree, a key contains whitespace, or any
    /// posting points past the document list.
    pub fn load(raw: RawIndex) -> Result<Self> {
        let RawIndex { docnames, filenames, titles, terms, titleterms, objects, objtypes, objnames } = raw;
        let docnames = docnames.ok_or_else(|| Error::malformed("missing table `docnames`"))?;
        let titles = titles.ok_or_else(|| Error::malformed("missing table `titles`"))?;
        let terms = terms.ok_or_else(|| Error::malformed("missing table `terms`"))?;
        let titleterms = titleterms.ok_or_else(|| Error::malformed("missing table `titleterms`"))?;

        let num_docs = docnames.len();
        if num_docs > DocId::MAX as usize {
            return Err(Error::malformed(format!("{num_docs} documents exceed the id space")));
        }
        if titles.len() != num_docs {
            return Err(Error::malformed(format!(
                "`titles` has {} entries but `docnames` has {num_docs}",
                titles.len()
            )));
        }
        if let Some(f) = &filenames {
            if f.len() != num_docs {
                return Err(Error::malformed(format!(
                    "`filenames` has {} entries but `docnames` has {num_docs}",
                    f.len()
                )));
            }
        }

        let mut filenames = filenames.map(Vec::into_iter);
        let documents = docnames
            .into_iter()
            .zip(titles)
            .enumerate()
            .map(|(i, (name, title))| Document {
                id: i as DocId,
                name,
                title,
                filename: filenames.as_mut().and_then(Iterator::next),
            })
            .collect();

        let terms = body_table(terms, num_docs)?;
        let title_terms = title_table(titleterms, num_docs)?;
        let (objects, object_terms) = object_table(objects, &objtypes, &objnames, num_docs)?;

        Ok(Self { documents, terms, title_terms, objects, object_terms })
    }

    /// Re-check every structural invariant. Used for snapshots that did not
    /// come through [`Snapshot::load`], e.g. ones read back from a cache.
    pub fn validate(&self) -> Result<()> {
        let num_docs = self.documents.len();
        for (i, doc) in self.documents.iter().enumerate() {
            if doc.id as usize != i {
                return Err(Error::malformed(format!("document at position {i} has id {}", doc.id)));
            }
        }
        for (key, postings) in &self.terms {
            check_key(key, "terms")?;
            check_sorted(postings.iter().map(|p| p.doc_id), num_docs, "terms", key)?;
            if let Some(p) = postings.iter().find(|p| !valid_weight(p.weight)) {
                return Err(Error::malformed(format!("term `{key}` has invalid weight {}", p.weight)));
            }
        }
        for (key, docs) in &self.title_terms {
            check_key(key, "titleterms")?;
            check_sorted(docs.iter().copied(), num_docs, "titleterms", key)?;
        }
        for obj in &self.objects {
            check_doc(obj.doc_id, num_docs, "objects", &obj.name)?;
        }
        for (key, indices) in &self.object_terms {
            check_key(key, "objects")?;
            if indices.is_empty() || indices.windows(2).any(|w| w[0] >= w[1]) {
                return Err(Error::malformed(format!("object key `{key}` has unsorted or empty entries")));
            }
            if let Some(&i) = indices.iter().find(|&&i| i as usize >= self.objects.len()) {
                return Err(Error::malformed(format!("object key `{key}` references missing object {i}")));
            }
        }
        Ok(())
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.documents.get(id as usize)
    }

    pub fn objects(&self) -> &[ObjectEntry] {
        &self.objects
    }

    pub fn num_docs(&self) -> usize {
        self.documents.len()
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn num_title_terms(&self) -> usize {
        self.title_terms.len()
    }

    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    /// Body postings for `term`; empty when the term is unknown.
    pub fn lookup_term(&self, term: &str) -> &[Posting] {
        self.terms.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Documents whose title contains `term`; empty when the term is unknown.
    pub fn lookup_title_term(&self, term: &str) -> &[DocId] {
        self.title_terms.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Objects with a name segment equal to `term`.
    pub fn lookup_objects<'a>(&'a self, term: &str) -> impl Iterator<Item = &'a ObjectEntry> + 'a {
        let indices = self.object_terms.get(term).map(Vec::as_slice).unwrap_or(&[]);
        indices.iter().filter_map(move |&i| self.objects.get(i as usize))
    }

    pub fn terms_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a [Posting])> + 'a {
        prefix_range(&self.terms, prefix).map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn title_terms_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a [DocId])> + 'a {
        prefix_range(&self.title_terms, prefix).map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Objects with any name segment starting with `prefix`, each yielded once.
    pub fn objects_with_prefix<'a>(&'a self, prefix: &str) -> impl Iterator<Item = &'a ObjectEntry> + 'a {
        let indices: BTreeSet<u32> = prefix_range(&self.object_terms, prefix)
            .flat_map(|(_, v)| v.iter().copied())
            .collect();
        indices.into_iter().filter_map(move |i| self.objects.get(i as usize))
    }
}

fn prefix_range<'a, V>(map: &'a BTreeMap<String, V>, prefix: &'a str) -> impl Iterator<Item = (&'a String, &'a V)> + 'a {
    map.range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        .take_while(move |(k, _)| k.starts_with(prefix))
}

fn body_table(raw: BTreeMap<String, RawPostings>, num_docs: usize) -> Result<BTreeMap<String, Vec<Posting>>> {
    let mut table: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
    for (key, postings) in raw {
        let term = normalize_key(&key, "terms")?;
        let entry = table.entry(term).or_default();
        for (doc_id, weight) in postings.into_pairs() {
            check_doc(doc_id, num_docs, "terms", &key)?;
            if !valid_weight(weight) {
                return Err(Error::malformed(format!("term `{key}` has invalid weight {weight}")));
            }
            entry.push(Posting { doc_id, weight });
        }
    }
    table.retain(|_, postings| !postings.is_empty());
    for postings in table.values_mut() {
        // keep the heaviest posting when a doc appears twice
        postings.sort_by(|a, b| a.doc_id.cmp(&b.doc_id).then(b.weight.total_cmp(&a.weight)));
        postings.dedup_by_key(|p| p.doc_id);
    }
    Ok(table)
}

fn title_table(raw: BTreeMap<String, RawPostings>, num_docs: usize) -> Result<BTreeMap<String, Vec<DocId>>> {
    let mut table: BTreeMap<String, Vec<DocId>> = BTreeMap::new();
    for (key, postings) in raw {
        let term = normalize_key(&key, "titleterms")?;
        let entry = table.entry(term).or_default();
        for (doc_id, _) in postings.into_pairs() {
            check_doc(doc_id, num_docs, "titleterms", &key)?;
            entry.push(doc_id);
        }
    }
    table.retain(|_, docs| !docs.is_empty());
    for docs in table.values_mut() {
        docs.sort_unstable();
        docs.dedup();
    }
    Ok(table)
}

type ObjectTables = (Vec<ObjectEntry>, BTreeMap<String, Vec<u32>>);

fn object_table(
    raw: BTreeMap<String, RawObjects>,
    objtypes: &BTreeMap<String, String>,
    objnames: &BTreeMap<String, Vec<String>>,
    num_docs: usize,
) -> Result<ObjectTables> {
    let mut objects = Vec::new();
    let mut object_terms: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for (prefix, entries) in raw {
        for (doc_id, ty, priority, anchor, name) in entries.into_rows() {
            let name = if prefix.is_empty() { name } else { format!("{prefix}.{name}") };
            check_doc(doc_id, num_docs, "objects", &name)?;
            let ty = ty.to_string();
            let category = objnames
                .get(&ty)
                .and_then(|n| n.get(2))
                .or_else(|| objtypes.get(&ty))
                .cloned()
                .unwrap_or_else(|| "object".to_string());
            let idx = u32::try_from(objects.len()).map_err(|_| Error::malformed("too many objects"))?;
            for segment in name_segments(&name) {
                let entry = object_terms.entry(segment).or_default();
                if entry.last() != Some(&idx) {
                    entry.push(idx);
                }
            }
            objects.push(ObjectEntry { name, doc_id, category, priority, anchor });
        }
    }
    Ok((objects, object_terms))
}

fn name_segments(name: &str) -> impl Iterator<Item = String> + '_ {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn normalize_key(key: &str, table: &str) -> Result<String> {
    let key = key.to_lowercase();
    check_key(&key, table)?;
    Ok(key)
}

fn check_key(key: &str, table: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::malformed(format!("`{table}` contains an empty key")));
    }
    if key.chars().any(char::is_whitespace) {
        return Err(Error::malformed(format!("`{table}` key `{key}` contains whitespace")));
    }
    if key.to_lowercase() != key {
        return Err(Error::malformed(format!("`{table}` key `{key}` is not lowercase")));
    }
    Ok(())
}

fn check_doc(doc_id: DocId, num_docs: usize, table: &str, key: &str) -> Result<()> {
    if doc_id as usize >= num_docs {
        return Err(Error::malformed(format!(
            "`{table}` entry `{key}` references document {doc_id} but only {num_docs} exist"
        )));
    }
    Ok(())
}

fn check_sorted(ids: impl Iterator<Item = DocId>, num_docs: usize, table: &str, key: &str) -> Result<()> {
    let mut prev: Option<DocId> = None;
    let mut empty = true;
    for id in ids {
        check_doc(id, num_docs, table, key)?;
        if prev.is_some_and(|p| p >= id) {
            return Err(Error::malformed(format!("`{table}` entry `{key}` is unsorted or has duplicates")));
        }
        prev = Some(id);
        empty = false;
    }
    if empty {
        return Err(Error::malformed(format!("`{table}` entry `{key}` is empty")));
    }
    Ok(())
}

fn valid_weight(weight: f32) -> bool {
    weight.is_finite() && weight >= 0.0
}
