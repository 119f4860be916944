//! Task lifecycle and chaining.

use anyhow::Result;

use crate::state::{merge_object, Fields, MergeOptions, MergeSource};

/// Outcome record of running a task.
///
/// Domain output fields are declared through [`Fields`] so results can seed
/// the next task in a pipeline. The error slot is bookkeeping: it never
/// participates in merging.
pub trait TaskResult: Fields + std::fmt::Debug {
    /// Error captured during the run, if the task failed without
    /// propagation.
    fn error(&self) -> Option<&anyhow::Error>;

    /// Record a failure on this result.
    fn set_error(&mut self, err: anyhow::Error);

    /// Remove and return the captured error.
    fn take_error(&mut self) -> Option<anyhow::Error>;

    /// Merge this result into `next` and run it.
    ///
    /// Produces a left-to-right pipeline where each stage's result seeds
    /// the next stage's fields:
    ///
    /// ```text
    /// first.run()?.pipe(second)?.pipe(third)?
    /// ```
    fn pipe<T: Task>(&self, next: T) -> Result<T::Result>
    where
        Self: Sized,
    {
        next.merge(MergeSource::TaskResult(self)).run()
    }
}

/// Minimal result carrying only the captured error.
#[derive(Debug, Default)]
pub struct BaseResult {
    pub err: Option<anyhow::Error>,
}

crate::mergeable!(BaseResult {});

impl TaskResult for BaseResult {
    fn error(&self) -> Option<&anyhow::Error> {
        self.err.as_ref()
    }

    fn set_error(&mut self, err: anyhow::Error) {
        self.err = Some(err);
    }

    fn take_error(&mut self) -> Option<anyhow::Error> {
        self.err.take()
    }
}

/// Implement [`TaskResult`] and the field table for a result struct.
///
/// The struct must have an `err: Option<anyhow::Error>` slot; the listed
/// fields become its mergeable table.
///
/// ```
/// use taskpipe::task_result;
///
/// #[derive(Debug, Default)]
/// struct CountResult {
///     err: Option<anyhow::Error>,
///     num_lines: u64,
/// }
/// task_result!(CountResult { num_lines });
/// ```
#[macro_export]
macro_rules! task_result {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        $crate::mergeable!($ty { $($field),* });

        impl $crate::task::TaskResult for $ty {
            fn error(&self) -> ::std::option::Option<&$crate::__private::anyhow::Error> {
                self.err.as_ref()
            }

            fn set_error(&mut self, err: $crate::__private::anyhow::Error) {
                self.err = ::std::option::Option::Some(err);
            }

            fn take_error(&mut self) -> ::std::option::Option<$crate::__private::anyhow::Error> {
                self.err.take()
            }
        }
    };
}

/// A unit of work with a lifecycle and mergeable fields.
///
/// Implementors provide [`Task::perform`] and the result accessors; the
/// `preamble` and `postamble` hooks default to no-ops. Both hooks must not
/// fail: they run on every path, failures included.
pub trait Task: Fields {
    /// Result type produced by running the task.
    type Result: TaskResult + Default;

    fn result(&self) -> &Self::Result;

    fn result_mut(&mut self) -> &mut Self::Result;

    /// Give up ownership of the result at the end of a run.
    fn into_result(self) -> Self::Result
    where
        Self: Sized;

    /// Raise failures from [`Task::perform`] to the caller instead of
    /// capturing them on the result.
    fn propagate_errors(&self) -> bool {
        false
    }

    /// Setup hook, runs before `perform`.
    fn preamble(&mut self) {}

    /// The task's main logic. Set output fields on the result here.
    fn perform(&mut self) -> Result<()>;

    /// Cleanup hook, runs after `perform` on success and failure alike.
    fn postamble(&mut self) {}

    /// Run the task through its full lifecycle.
    ///
    /// The failure path never skips cleanup: the postamble runs before a
    /// propagated error escapes, and the error is recorded on the result
    /// first so the postamble can observe it. Without propagation the
    /// error stays captured on the returned result.
    fn run(mut self) -> Result<Self::Result>
    where
        Self: Sized,
    {
        let task = short_type_name::<Self>();
        tracing::info!(task, "running task");

        self.preamble();

        let mut failed = false;
        match self.perform() {
            Ok(()) => tracing::info!(task, "finished running task"),
            Err(err) => {
                failed = true;
                if !self.propagate_errors() {
                    tracing::error!(task, error = %err, "failed to run task");
                }
                self.result_mut().set_error(err);
            }
        }

        self.postamble();

        if failed && self.propagate_errors() {
            if let Some(err) = self.result_mut().take_error() {
                return Err(err);
            }
        }

        Ok(self.into_result())
    }

    /// Merge `source` into this task with default options.
    fn merge(self, source: MergeSource<'_>) -> Self
    where
        Self: Sized,
    {
        self.merge_with(source, &MergeOptions::default())
    }

    /// Merge `source` into this task under include/exclude/overwrite rules.
    fn merge_with(mut self, source: MergeSource<'_>, options: &MergeOptions) -> Self
    where
        Self: Sized,
    {
        merge_object(&mut self, source, options);
        self
    }
}

/// Type name without its module path, for log records.
pub(crate) fn short_type_name<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}
