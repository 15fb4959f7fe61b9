//! Parallel-for over output rows.
//!
//! A shadow pass hands each implementation a flat output buffer and a per-row
//! task. Rows are disjoint, tasks share only read-only inputs, and the call
//! returns once every row has finished. Any failed row fails the call.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use rayon::prelude::*;

use crate::error::ShadowError;

/// Per-row task: receives the row index and the row's output slice.
pub type RowTask<'a> = dyn Fn(usize, &mut [f32]) -> Result<(), ShadowError> + Sync + 'a;

/// Runs a row task over every row of an output buffer.
pub trait Dispatch: Send + Sync {
    /// Calls `task` once for each `row_len`-sized row of `output`.
    fn for_each_row(
        &self,
        output: &mut [f32],
        row_len: usize,
        task: &RowTask<'_>,
    ) -> Result<(), ShadowError>;

    /// Number of rows that may run at once.
    fn parallelism(&self) -> usize;
}

/// Runs rows in order on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialDispatch;

impl Dispatch for SerialDispatch {
    fn for_each_row(
        &self,
        output: &mut [f32],
        row_len: usize,
        task: &RowTask<'_>,
    ) -> Result<(), ShadowError> {
        check_row_len(row_len)?;
        output
            .chunks_mut(row_len)
            .enumerate()
            .try_for_each(|(row, slice)| task(row, slice))
    }

    fn parallelism(&self) -> usize {
        1
    }
}

/// Runs rows on a dedicated rayon thread pool.
pub struct PoolDispatch {
    pool: rayon::ThreadPool,
}

impl PoolDispatch {
    /// Builds a pool with `threads` workers, or one per CPU when `threads` is 0.
    pub fn new(threads: usize) -> Result<Self, ShadowError> {
        let threads = if threads == 0 {
            num_cpus::get()
        } else {
            threads
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("umbra-march-{i}"))
            .build()
            .map_err(|e| {
                ShadowError::compute(format!("failed to start a {threads}-thread pool: {e}"))
            })?;
        tracing::debug!(threads, "Started ray-march thread pool");
        Ok(Self { pool })
    }
}

impl Dispatch for PoolDispatch {
    fn for_each_row(
        &self,
        output: &mut [f32],
        row_len: usize,
        task: &RowTask<'_>,
    ) -> Result<(), ShadowError> {
        check_row_len(row_len)?;
        let run = || {
            self.pool.install(|| {
                output
                    .par_chunks_mut(row_len)
                    .enumerate()
                    .try_for_each(|(row, slice)| task(row, slice))
            })
        };
        catch_unwind(AssertUnwindSafe(run)).unwrap_or_else(|payload| {
            Err(ShadowError::compute(format!(
                "ray-march worker panicked: {}",
                panic_message(payload.as_ref())
            )))
        })
    }

    fn parallelism(&self) -> usize {
        self.pool.current_num_threads()
    }
}

/// Picks the serial dispatcher for one thread, otherwise a pool.
pub fn dispatcher(threads: usize) -> Result<Box<dyn Dispatch>, ShadowError> {
    if threads == 1 {
        Ok(Box::new(SerialDispatch))
    } else {
        Ok(Box::new(PoolDispatch::new(threads)?))
    }
}

fn check_row_len(row_len: usize) -> Result<(), ShadowError> {
    if row_len == 0 {
        return Err(ShadowError::compute("output rows must not be empty"));
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic payload"
    }
}
