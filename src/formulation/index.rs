//! Index sets of the formulations.
//!
//! Both sets are analytic: membership is a range test on the indices and
//! every member has a dense position, so variable storage can be a plain
//! `Vec` instead of a hash map keyed by tuples.
//!
//! Enumeration order is job-major, then fraction flag, then bucket (or
//! time slot) ascending. Positions follow that order.

use super::discretize::Discretization;

/// A member `(j, b, k)` of the bucket-indexed set `Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketIndex {
    pub job: usize,
    /// 1-based start bucket.
    pub bucket: i64,
    /// Fraction flag `k ∈ K_j`.
    pub flag: u8,
}

impl BucketIndex {
    pub fn new(job: usize, bucket: i64, flag: u8) -> Self {
        Self { job, bucket, flag }
    }
}

/// A member `(j, t)` of the time-indexed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeIndex {
    pub job: usize,
    /// 1-based start slot; the job starts at time `slot - 1`.
    pub slot: i64,
}

impl TimeIndex {
    pub fn new(job: usize, slot: i64) -> Self {
        Self { job, slot }
    }
}

/// Valid start indices `Z = {(j, b, k) : k ∈ K_j, 1 ≤ b ≤ B - P_j + 1}`.
#[derive(Debug, Clone)]
pub struct BucketIndexSet {
    last_start: Vec<i64>,
    flag_count: Vec<usize>,
    due_bucket: Vec<i64>,
    offsets: Vec<usize>,
    len: usize,
}

impl BucketIndexSet {
    pub fn new(disc: &Discretization) -> Self {
        let n = disc.job_count();
        let mut last_start = Vec::with_capacity(n);
        let mut flag_count = Vec::with_capacity(n);
        let mut due_bucket = Vec::with_capacity(n);
        let mut offsets = Vec::with_capacity(n);

        let mut len = 0usize;
        for j in 0..n {
            let last = disc.last_start_bucket(j).max(0);
            let flags = disc.flags(j).len();
            offsets.push(len);
            len += last as usize * flags;
            last_start.push(last);
            flag_count.push(flags);
            due_bucket.push(disc.due_bucket(j));
        }

        Self {
            last_start,
            flag_count,
            due_bucket,
            offsets,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn job_count(&self) -> usize {
        self.offsets.len()
    }

    /// Last start bucket `B - P_j + 1` (clamped at 0).
    pub fn last_start(&self, job: usize) -> i64 {
        self.last_start[job]
    }

    /// Membership test `(j, b, k) ∈ Z`.
    pub fn contains(&self, job: usize, bucket: i64, flag: u8) -> bool {
        job < self.offsets.len()
            && (flag as usize) < self.flag_count[job]
            && bucket >= 1
            && bucket <= self.last_start[job]
    }

    /// Dense position of `index`, or `None` if it is not in `Z`.
    pub fn position(&self, index: BucketIndex) -> Option<usize> {
        if !self.contains(index.job, index.bucket, index.flag) {
            return None;
        }
        let per_flag = self.last_start[index.job] as usize;
        Some(
            self.offsets[index.job]
                + index.flag as usize * per_flag
                + (index.bucket - 1) as usize,
        )
    }

    /// Member at a dense position.
    pub fn index_at(&self, position: usize) -> Option<BucketIndex> {
        if position >= self.len {
            return None;
        }
        let job = self.offsets.partition_point(|&o| o <= position) - 1;
        let local = position - self.offsets[job];
        let per_flag = self.last_start[job] as usize;
        Some(BucketIndex::new(
            job,
            (local % per_flag) as i64 + 1,
            (local / per_flag) as u8,
        ))
    }

    /// All members in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = BucketIndex> + '_ {
        (0..self.job_count()).flat_map(move |j| self.iter_job(j))
    }

    /// Members of one job.
    pub fn iter_job(&self, job: usize) -> impl Iterator<Item = BucketIndex> + '_ {
        let last = self.last_start[job];
        (0..self.flag_count[job] as u8)
            .flat_map(move |k| (1..=last).map(move |b| BucketIndex::new(job, b, k)))
    }

    /// Members whose start bucket is at or past the due bucket.
    pub fn iter_tardy(&self) -> impl Iterator<Item = BucketIndex> + '_ {
        self.iter()
            .filter(move |idx| idx.bucket >= self.due_bucket[idx.job])
    }
}

/// Valid start slots `{(j, t) : 1 ≤ t ≤ Σp - p_j + 1}`.
#[derive(Debug, Clone)]
pub struct TimeIndexSet {
    last_slot: Vec<i64>,
    offsets: Vec<usize>,
    len: usize,
}

impl TimeIndexSet {
    pub fn new(processing_times: &[i64]) -> Self {
        let horizon: i64 = processing_times.iter().sum();
        let mut last_slot = Vec::with_capacity(processing_times.len());
        let mut offsets = Vec::with_capacity(processing_times.len());
        let mut len = 0usize;
        for &p in processing_times {
            let last = (horizon - p + 1).max(0);
            offsets.push(len);
            len += last as usize;
            last_slot.push(last);
        }
        Self {
            last_slot,
            offsets,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn job_count(&self) -> usize {
        self.offsets.len()
    }

    pub fn last_slot(&self, job: usize) -> i64 {
        self.last_slot[job]
    }

    pub fn contains(&self, job: usize, slot: i64) -> bool {
        job < self.offsets.len() && slot >= 1 && slot <= self.last_slot[job]
    }

    pub fn position(&self, index: TimeIndex) -> Option<usize> {
        if !self.contains(index.job, index.slot) {
            return None;
        }
        Some(self.offsets[index.job] + (index.slot - 1) as usize)
    }

    pub fn index_at(&self, position: usize) -> Option<TimeIndex> {
        if position >= self.len {
            return None;
        }
        let job = self.offsets.partition_point(|&o| o <= position) - 1;
        Some(TimeIndex::new(job, (position - self.offsets[job]) as i64 + 1))
    }

    pub fn iter(&self) -> impl Iterator<Item = TimeIndex> + '_ {
        (0..self.job_count()).flat_map(move |j| self.iter_job(j))
    }

    pub fn iter_job(&self, job: usize) -> impl Iterator<Item = TimeIndex> + '_ {
        (1..=self.last_slot[job]).map(move |t| TimeIndex::new(job, t))
    }
}
