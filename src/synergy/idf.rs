//! Inverse document frequency over gem tags.

use sha3::{Digest, Sha3_256};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::catalog::Gem;
use crate::tags::normalize;

/// `idf(tag) = ln(N / (1 + df(tag)))` over a gem corpus
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdfTable {
    weights: HashMap<String, f64>,
    documents: usize,
}

impl IdfTable {
    pub fn build<'g, I>(gems: I) -> Self
    where
        I: IntoIterator<Item = &'g Gem>,
    {
        let mut df: HashMap<String, usize> = HashMap::new();
        let mut documents = 0usize;
        for gem in gems {
            documents += 1;
            let unique: BTreeSet<String> = gem
                .tags
                .iter()
                .map(|t| normalize(t))
                .filter(|t| !t.is_empty())
                .collect();
            for tag in unique {
                *df.entry(tag).or_insert(0) += 1;
            }
        }
        let n = documents.max(1) as f64;
        let weights = df
            .into_iter()
            .map(|(tag, count)| (tag, (n / (1.0 + count as f64)).ln()))
            .collect();
        Self { weights, documents }
    }

    /// Weight of a normalized tag; `None` for tags no gem carries
    pub fn get(&self, tag: &str) -> Option<f64> {
        self.weights.get(tag).copied()
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Content fingerprint of a gem corpus: id and tags per gem
pub fn corpus_fingerprint<'g, I>(gems: I) -> String
where
    I: IntoIterator<Item = &'g Gem>,
{
    let mut hasher = Sha3_256::new();
    for (i, gem) in gems.into_iter().enumerate() {
        if i > 0 {
            hasher.update(b"~");
        }
        hasher.update(gem.id.as_bytes());
        hasher.update(b"#");
        hasher.update(gem.tags.join(",").as_bytes());
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Keeps the last built table until the corpus fingerprint changes
#[derive(Debug, Default)]
pub struct IdfCache {
    fingerprint: Option<String>,
    table: Arc<IdfTable>,
    builds: usize,
}

impl IdfCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, gems: &[&Gem]) -> Arc<IdfTable> {
        let fingerprint = corpus_fingerprint(gems.iter().copied());
        if self.fingerprint.as_deref() != Some(fingerprint.as_str()) {
            self.table = Arc::new(IdfTable::build(gems.iter().copied()));
            self.builds += 1;
            debug!(
                documents = self.table.documents(),
                tags = self.table.len(),
                "rebuilt tag idf table"
            );
            self.fingerprint = Some(fingerprint);
        }
        Arc::clone(&self.table)
    }

    /// How many times a table has been built
    pub fn builds(&self) -> usize {
        self.builds
    }
}
