//! Solver variable handles keyed by index-set position.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::FormulationError;

use super::index::{BucketIndex, BucketIndexSet, TimeIndex, TimeIndexSet};

/// Bidirectional map between dense index positions and solver handles.
///
/// Declaration is idempotent: asking for a position that already holds a
/// handle returns it without calling the factory again.
#[derive(Debug, Clone)]
pub struct VarRegistry<V> {
    slots: Vec<Option<V>>,
    reverse: HashMap<V, usize>,
}

impl<V: Copy + Eq + Hash> VarRegistry<V> {
    /// Creates an empty registry over `capacity` positions.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            reverse: HashMap::new(),
        }
    }

    /// Returns the handle at `position`, declaring it with `declare` first
    /// if absent. `None` if `position` is out of range.
    pub fn get_or_declare(
        &mut self,
        position: usize,
        declare: impl FnOnce() -> V,
    ) -> Option<V> {
        let slot = self.slots.get_mut(position)?;
        if let Some(var) = *slot {
            return Some(var);
        }
        let var = declare();
        *slot = Some(var);
        self.reverse.insert(var, position);
        Some(var)
    }

    pub fn get(&self, position: usize) -> Option<V> {
        self.slots.get(position).copied().flatten()
    }

    /// Position a handle was declared at.
    pub fn position_of(&self, var: V) -> Option<usize> {
        self.reverse.get(&var).copied()
    }

    /// Number of declared handles.
    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    /// Declared handles in position order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, V)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(pos, slot)| slot.map(|v| (pos, v)))
    }
}

/// Variables of the bucket-indexed formulation.
///
/// `z` and `u` exist for every member of `Z`; `t` only for members at or
/// past their job's due bucket.
#[derive(Debug, Clone)]
pub struct BucketVariables<V> {
    pub(crate) set: BucketIndexSet,
    pub(crate) z: VarRegistry<V>,
    pub(crate) u: VarRegistry<V>,
    pub(crate) t: VarRegistry<V>,
}

impl<V: Copy + Eq + Hash> BucketVariables<V> {
    pub fn new(set: BucketIndexSet) -> Self {
        let len = set.len();
        Self {
            set,
            z: VarRegistry::new(len),
            u: VarRegistry::new(len),
            t: VarRegistry::new(len),
        }
    }

    pub fn index_set(&self) -> &BucketIndexSet {
        &self.set
    }

    /// Assignment variable `z[j,b,k]`; `None` outside `Z`.
    pub fn z(&self, job: usize, bucket: i64, flag: u8) -> Option<V> {
        self.z.get(self.set.position(BucketIndex::new(job, bucket, flag))?)
    }

    /// Occupancy variable `u[j,b,k]`; `None` outside `Z`.
    pub fn u(&self, job: usize, bucket: i64, flag: u8) -> Option<V> {
        self.u.get(self.set.position(BucketIndex::new(job, bucket, flag))?)
    }

    /// Tardiness variable `T[j,b,k]`; `None` outside the tardy subset.
    pub fn t(&self, job: usize, bucket: i64, flag: u8) -> Option<V> {
        self.t.get(self.set.position(BucketIndex::new(job, bucket, flag))?)
    }

    /// `z` for an index the caller enumerated itself.
    pub fn require_z(&self, index: BucketIndex) -> Result<V, FormulationError> {
        self.z(index.job, index.bucket, index.flag)
            .ok_or_else(|| unknown("z", index))
    }

    pub fn require_u(&self, index: BucketIndex) -> Result<V, FormulationError> {
        self.u(index.job, index.bucket, index.flag)
            .ok_or_else(|| unknown("u", index))
    }

    pub fn require_t(&self, index: BucketIndex) -> Result<V, FormulationError> {
        self.t(index.job, index.bucket, index.flag)
            .ok_or_else(|| unknown("T", index))
    }

    /// Number of declared variables across all three families.
    pub fn var_count(&self) -> usize {
        self.z.len() + self.u.len() + self.t.len()
    }
}

fn unknown(family: &str, index: BucketIndex) -> FormulationError {
    FormulationError::UnknownIndex(format!(
        "{family}[{},{},{}]",
        index.job, index.bucket, index.flag
    ))
}

/// Variables of the time-indexed formulation.
#[derive(Debug, Clone)]
pub struct TimeVariables<V> {
    pub(crate) set: TimeIndexSet,
    pub(crate) x: VarRegistry<V>,
}

impl<V: Copy + Eq + Hash> TimeVariables<V> {
    pub fn new(set: TimeIndexSet) -> Self {
        let len = set.len();
        Self {
            set,
            x: VarRegistry::new(len),
        }
    }

    pub fn index_set(&self) -> &TimeIndexSet {
        &self.set
    }

    /// Assignment variable `x[j,t]`; `None` outside the index set.
    pub fn x(&self, job: usize, slot: i64) -> Option<V> {
        self.x.get(self.set.position(TimeIndex::new(job, slot))?)
    }

    pub fn require_x(&self, index: TimeIndex) -> Result<V, FormulationError> {
        self.x(index.job, index.slot).ok_or_else(|| {
            FormulationError::UnknownIndex(format!("x[{},{}]", index.job, index.slot))
        })
    }

    pub fn var_count(&self) -> usize {
        self.x.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulation::discretize::Discretization;
    use crate::models::Instance;

    #[test]
    fn test_get_or_declare_is_idempotent() {
        let mut reg: VarRegistry<u32> = VarRegistry::new(3);
        let mut calls = 0;
        let a = reg.get_or_declare(1, || {
            calls += 1;
            7
        });
        let b = reg.get_or_declare(1, || {
            calls += 1;
            8
        });
        assert_eq!(a, Some(7));
        assert_eq!(b, Some(7));
        assert_eq!(calls, 1);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.position_of(7), Some(1));
        assert_eq!(reg.get(0), None);
    }

    #[test]
    fn test_out_of_range_position() {
        let mut reg: VarRegistry<u32> = VarRegistry::new(2);
        assert_eq!(reg.get_or_declare(2, || 1), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_iter_in_position_order() {
        let mut reg: VarRegistry<u32> = VarRegistry::new(4);
        reg.get_or_declare(3, || 30);
        reg.get_or_declare(0, || 0);
        let all: Vec<(usize, u32)> = reg.iter().collect();
        assert_eq!(all, vec![(0, 0), (3, 30)]);
    }

    #[test]
    fn test_bucket_lookups() {
        let instance = Instance::from_columns(&[2, 3], &[0, 0], &[1, 1]).unwrap();
        let disc = Discretization::new(&instance).unwrap();
        let set = BucketIndexSet::new(&disc);
        let mut vars: BucketVariables<usize> = BucketVariables::new(set.clone());
        for (pos, _) in set.iter().enumerate() {
            vars.z.get_or_declare(pos, || pos);
        }

        let first = set.iter().next().unwrap();
        assert_eq!(vars.require_z(first).unwrap(), 0);
        assert!(vars.u(first.job, first.bucket, first.flag).is_none());

        let err = vars.require_u(first).unwrap_err();
        assert!(matches!(err, FormulationError::UnknownIndex(_)));
        let outside = BucketIndex::new(0, 99, 0);
        assert_eq!(
            vars.require_z(outside).unwrap_err().to_string(),
            FormulationError::UnknownIndex("z[0,99,0]".into()).to_string()
        );
    }
}
