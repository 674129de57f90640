use std::collections::HashMap;

use crate::ivf::{dot, IvfConfig, IvfIndex, IvfSnapshot};
use crate::{CollectionSchema, IndexError, SearchHit};

/// One named set of (id, vector) pairs living in a single embedding space.
///
/// Vectors are stored row-major in insertion order; a vector's slot never
/// changes, so re-inserting an id keeps its original position for tie
/// breaking.
#[derive(Debug, Clone)]
pub struct Collection {
    schema: CollectionSchema,
    ids: Vec<String>,
    slots: HashMap<String, u32>,
    data: Vec<f32>,
    ivf: Option<IvfIndex>,
}

/// Raw parts of a collection, as persisted.
pub(crate) struct CollectionParts {
    pub(crate) schema: CollectionSchema,
    pub(crate) ids: Vec<String>,
    pub(crate) data: Vec<f32>,
    pub(crate) ivf: Option<IvfSnapshot>,
}

impl Collection {
    pub fn new(schema: CollectionSchema) -> Result<Self, IndexError> {
        schema.validate()?;
        Ok(Self {
            schema,
            ids: Vec::new(),
            slots: HashMap::new(),
            data: Vec::new(),
            ivf: None,
        })
    }

    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether searches go through a trained IVF index.
    pub fn is_indexed(&self) -> bool {
        self.ivf.is_some()
    }

    pub fn nlist(&self) -> Option<usize> {
        self.ivf.as_ref().map(IvfIndex::nlist)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn vector(&self, id: &str) -> Option<&[f32]> {
        self.slots.get(id).map(|&slot| self.row(slot))
    }

    fn row(&self, slot: u32) -> &[f32] {
        let dim = self.schema.dimension;
        let start = slot as usize * dim;
        &self.data[start..start + dim]
    }

    /// Stores `vector` under `id`. Returns `true` when an existing vector was replaced.
    pub fn insert(&mut self, id: &str, vector: &[f32]) -> Result<bool, IndexError> {
        self.schema.check_id(id)?;
        self.schema.check_dimension(vector.len())?;

        let (slot, replaced) = match self.slots.get(id) {
            Some(&slot) => {
                let dim = self.schema.dimension;
                let start = slot as usize * dim;
                self.data[start..start + dim].copy_from_slice(vector);
                (slot, true)
            }
            None => {
                let slot = u32::try_from(self.ids.len()).map_err(|_| {
                    IndexError::InvalidConfig(format!(
                        "collection '{}' is full",
                        self.schema.name
                    ))
                })?;
                self.ids.push(id.to_string());
                self.slots.insert(id.to_string(), slot);
                self.data.extend_from_slice(vector);
                (slot, false)
            }
        };

        if let Some(ivf) = self.ivf.as_mut() {
            ivf.assign(slot, vector);
        }
        Ok(replaced)
    }

    /// Trains the IVF index, or drops it when the collection is too small.
    /// Returns whether an IVF index is now active.
    pub fn build_index(&mut self, cfg: &IvfConfig) -> Result<bool, IndexError> {
        if !cfg.should_use_ivf(self.len()) {
            self.ivf = None;
            return Ok(false);
        }
        self.ivf = Some(IvfIndex::train(&self.data, self.schema.dimension, cfg)?);
        Ok(true)
    }

    /// Top `top_k` ids by descending inner product; ties keep insertion order.
    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        nprobe: usize,
    ) -> Result<Vec<SearchHit>, IndexError> {
        self.schema.check_dimension(query.len())?;
        if top_k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(u32, f32)> = match &self.ivf {
            Some(ivf) => ivf
                .candidates(query, nprobe)
                .into_iter()
                .map(|slot| (slot, dot(self.row(slot), query)))
                .collect(),
            None => (0..self.len() as u32)
                .map(|slot| (slot, dot(self.row(slot), query)))
                .collect(),
        };

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);
        Ok(scored
            .into_iter()
            .map(|(slot, score)| SearchHit {
                id: self.ids[slot as usize].clone(),
                score,
            })
            .collect())
    }

    pub(crate) fn to_parts(&self) -> CollectionParts {
        CollectionParts {
            schema: self.schema.clone(),
            ids: self.ids.clone(),
            data: self.data.clone(),
            ivf: self.ivf.as_ref().map(IvfIndex::to_snapshot),
        }
    }

    pub(crate) fn from_parts(parts: CollectionParts) -> Result<Self, IndexError> {
        parts.schema.validate()?;
        let dim = parts.schema.dimension;
        if parts.data.len() != parts.ids.len() * dim {
            return Err(IndexError::Decode(format!(
                "collection '{}' holds {} floats for {} ids of dimension {dim}",
                parts.schema.name,
                parts.data.len(),
                parts.ids.len()
            )));
        }

        let mut slots = HashMap::with_capacity(parts.ids.len());
        for (slot, id) in parts.ids.iter().enumerate() {
            if slots.insert(id.clone(), slot as u32).is_some() {
                return Err(IndexError::Decode(format!(
                    "collection '{}' repeats id '{id}'",
                    parts.schema.name
                )));
            }
        }

        let ivf = parts
            .ivf
            .map(|snapshot| IvfIndex::from_snapshot(snapshot, dim, parts.ids.len()))
            .transpose()?;

        Ok(Self {
            schema: parts.schema,
            ids: parts.ids,
            slots,
            data: parts.data,
            ivf,
        })
    }
}
